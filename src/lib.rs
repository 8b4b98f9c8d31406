//! # DuckDB Databook Facts Extension
//!
//! A DuckDB extension that extracts numeric facts from loosely formatted
//! financial spreadsheets ("databooks"). Sheets with any number of tables,
//! multi-tier headers and inline unit annotations become one normalized fact
//! per numeric data cell, with full provenance.
//!
//! ## Pipeline
//!
//! - **Region segmentation**: table rectangles are found from header-like rows
//!   (or, optionally, from blocks of filled cells)
//! - **Header inference**: leading header rows/columns are detected and joined
//!   into label paths, with yearly column runs collapsed to bare years
//! - **Units and scale**: a table default plus spatial overrides, e.g.
//!   `$ in thousands` or a `%` row
//! - **Value parsing**: negatives in parentheses, currency symbols, dashes and
//!   error literals, each classified
//! - **Taxonomy enrichment**: row headers mapped to canonical metrics, column
//!   headers to periods, sheet names to canonical sheet categories
//!
//! ## Table Functions
//!
//! - `extract_facts`: one row per extracted fact
//! - `analyze_tables`: one row per detected table with its header depths, units and skip tallies
//! - `known_sheets`: sheets mapped to a canonical sheet category
extern crate duckdb;
extern crate duckdb_loadable_macros;
extern crate libduckdb_sys;

mod config;
mod error;
mod extension;
mod facts;
mod helpers;
mod layout;
mod spreadsheet;
mod taxonomy;

use crate::extension::analyze_tables::AnalyzeTablesTableFunction;
use crate::extension::extract_facts::ExtractFactsTableFunction;
use crate::extension::known_sheets::KnownSheetsTableFunction;
use anyhow::Context;
use anyhow::Result;
use duckdb::Connection;
use duckdb_loadable_macros::duckdb_entrypoint_c_api;
use libduckdb_sys as ffi;

/// Extension entry point for DuckDB.
///
/// # Errors
///
/// Returns an error if a table function fails to register.
#[duckdb_entrypoint_c_api()]
pub unsafe fn extension_entrypoint(connection: Connection) -> Result<()> {
    connection
        .register_table_function::<ExtractFactsTableFunction>("extract_facts")
        .context("Failed to register extract_facts table function")?;
    connection
        .register_table_function::<AnalyzeTablesTableFunction>("analyze_tables")
        .context("Failed to register analyze_tables table function")?;
    connection
        .register_table_function::<KnownSheetsTableFunction>("known_sheets")
        .context("Failed to register known_sheets table function")?;
    Ok(())
}
