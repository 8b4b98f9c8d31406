use crate::config::ExtractConfig;
use crate::facts::naming::infer_table_name;
use crate::facts::unit::detect_units_and_scale;
use crate::facts::unit::Unit;
use crate::facts::unit::UnitDetection;
use crate::facts::value::parse_number_with_status;
use crate::facts::value::ParseStatus;
use crate::facts::value::SkipTally;
use crate::layout::header::build_header_paths;
use crate::layout::header::infer_header_depths;
use crate::layout::header::HeaderDepths;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::grid::GridError;
use crate::spreadsheet::grid::Rectangle;
use log::debug;

/// One numeric value read from a data cell, with its provenance.
///
/// Coordinates are zero-based sheet positions.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Fact {
    pub(crate) file: String,
    pub(crate) sheet: String,
    pub(crate) table_r0: usize,
    pub(crate) table_c0: usize,
    pub(crate) row_idx: usize,
    pub(crate) col_idx: usize,
    pub(crate) row_header: String,
    pub(crate) col_header: String,
    pub(crate) raw_text: String,
    pub(crate) unit: Unit,
    pub(crate) scale: f64,
    pub(crate) value_real: f64,
    pub(crate) parse_status: ParseStatus,
    pub(crate) inferred_table_name: String,
}

/// Everything learned about one table rectangle.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TableExtraction {
    pub(crate) rect: Rectangle,
    pub(crate) depths: HeaderDepths,
    pub(crate) units: UnitDetection,
    pub(crate) table_name: String,
    pub(crate) facts: Vec<Fact>,
    pub(crate) skipped: SkipTally,
}

/// Emits one fact per numeric cell of the data body of `rect`, in row-major
/// order, and tallies the cells that hold no number.
pub(crate) fn extract_facts(
    grid: &Grid,
    rect: Rectangle,
    sheet: &str,
    file: &str,
    generic_heading: &str,
    config: &ExtractConfig,
) -> Result<TableExtraction, GridError> {
    let table = grid.table(rect)?;
    let units = detect_units_and_scale(grid, rect, &config.unit)?;
    let table_name = infer_table_name(grid, rect, generic_heading);
    let depths = infer_header_depths(&table, &config.header);
    let paths = build_header_paths(&table, depths, &config.header);

    let mut facts = Vec::new();
    let mut skipped = SkipTally::default();
    for row in depths.header_rows..table.height() {
        for col in depths.header_cols..table.width() {
            let (row_idx, col_idx) = (rect.r0 + row, rect.c0 + col);
            let unit_scale = units.resolve(row_idx, col_idx);
            let raw = table.get(row, col);
            let (value, status) = parse_number_with_status(raw, unit_scale.unit);
            let Some(value) = value else {
                skipped.record(status);
                continue;
            };
            facts.push(Fact {
                file: file.to_owned(),
                sheet: sheet.to_owned(),
                table_r0: rect.r0,
                table_c0: rect.c0,
                row_idx,
                col_idx,
                row_header: paths.row_headers[row].clone(),
                col_header: paths.col_headers[col].clone(),
                raw_text: raw.unwrap_or_default().to_owned(),
                unit: unit_scale.unit,
                scale: unit_scale.scale,
                value_real: value * unit_scale.scale,
                parse_status: status,
                inferred_table_name: table_name.clone(),
            });
        }
    }

    debug!(
        "Table {} of {sheet}: name {table_name:?}, headers {}x{}, unit {:?} x{} from {:?}, {} override(s), {} fact(s), {} skipped {skipped:?}",
        rect.reference(),
        depths.header_rows,
        depths.header_cols,
        units.default.unit.as_str(),
        units.default.scale,
        units.default.evidence,
        units.overrides.len(),
        facts.len(),
        skipped.total(),
    );

    Ok(TableExtraction {
        rect,
        depths,
        units,
        table_name,
        facts,
        skipped,
    })
}
