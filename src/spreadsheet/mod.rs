//! # Workbook Loading Module
//!
//! Reads `.xlsx`/`.xlsm` workbooks into text grids: every cell becomes its
//! display text, dates render as ISO text, and error literals are kept so the
//! value parser can classify them.

pub(crate) mod cell;
pub(crate) mod criteria;
pub(crate) mod excel;
pub(crate) mod grid;
pub(crate) mod reference;
pub(crate) mod xlsx;

use crate::error::DatabookError;
use crate::spreadsheet::xlsx::XlsxWorkbook;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum SpreadsheetError {
    #[error("Unsupported workbook format: '{0}', expected .xlsx or .xlsm")]
    UnsupportedFormat(String),

    #[error("Encrypted or legacy OLE workbook is not supported: '{0}'")]
    OleContainer(String),

    #[error("No worksheet found in '{0}'")]
    EmptyWorkbook(String),

    #[error("Missing workbook part '{0}'")]
    MissingPart(String),

    #[error("Sheet '{1}' not found in '{0}'")]
    SheetNotFound(String, String),

    #[error("Shared string index '{3}' out of range at {0}!{1}!{2}")]
    SharedStringOutOfRange(String, String, String, String),
}

/// Opens an xlsx workbook from a local path or remote URL.
pub(crate) fn open_workbook(file_name: &str) -> Result<XlsxWorkbook, DatabookError> {
    if !is_supported_workbook(file_name) {
        Err(SpreadsheetError::UnsupportedFormat(file_name.to_owned()))?;
    }
    XlsxWorkbook::open(file_name)
}

/// Whether the file extension, ignoring a URL query or fragment, names an xlsx workbook.
pub(crate) fn is_supported_workbook(file_name: &str) -> bool {
    let path = file_name.split(['?', '#']).next().unwrap_or(file_name);
    Path::new(path)
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("xlsx") || extension.eq_ignore_ascii_case("xlsm"))
}
