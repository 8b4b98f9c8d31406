use crate::config::ExtractConfig;
use crate::facts::assemble::extract_facts;
use crate::facts::assemble::Fact;
use crate::facts::assemble::TableExtraction;
use crate::facts::naming::detect_generic_heading;
use crate::layout::segment::segment;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::grid::GridError;
use log::info;

/// Tables found in one sheet, in detection order.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SheetExtraction {
    pub(crate) file: String,
    pub(crate) sheet: String,
    pub(crate) generic_heading: String,
    pub(crate) tables: Vec<TableExtraction>,
}

impl SheetExtraction {
    pub(crate) fn facts(&self) -> impl Iterator<Item = &Fact> {
        self.tables.iter().flat_map(|table| table.facts.iter())
    }
}

/// Segments a sheet and extracts the facts of every table in it.
pub(crate) fn extract_sheet(grid: &Grid, file: &str, sheet: &str, config: &ExtractConfig) -> Result<SheetExtraction, GridError> {
    let generic_heading = detect_generic_heading(grid, &config.naming);
    let tables = segment(grid, &config.segment)
        .into_iter()
        .map(|rect| extract_facts(grid, rect, sheet, file, &generic_heading, config))
        .collect::<Result<Vec<_>, _>>()?;

    let extraction = SheetExtraction {
        file: file.to_owned(),
        sheet: sheet.to_owned(),
        generic_heading,
        tables,
    };
    info!(
        "Sheet {sheet} of {file}: {} table(s), {} fact(s)",
        extraction.tables.len(),
        extraction.facts().count()
    );
    Ok(extraction)
}
