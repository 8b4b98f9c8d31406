use crate::config::NamingConfig;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::grid::Rectangle;

/// Finds a sheet-level heading: the longest digit-free text standing alone in
/// its row within the top-left window.
pub(crate) fn detect_generic_heading(grid: &Grid, config: &NamingConfig) -> String {
    let cols = grid.width().min(config.heading_cols);
    let mut best = "";
    for row in 0..grid.height().min(config.heading_rows) {
        let mut texts = (0..cols).filter_map(|col| grid.get(row, col));
        let (Some(text), None) = (texts.next(), texts.next()) else {
            continue;
        };
        if !text.chars().any(|c| c.is_ascii_digit()) && text.chars().count() > best.chars().count() {
            best = text;
        }
    }
    best.to_owned()
}

/// Names a table from the text around its top-left corner.
pub(crate) fn infer_table_name(grid: &Grid, rect: Rectangle, generic_fallback: &str) -> String {
    if rect.r0 > 0 {
        if let Some(above) = grid.get(rect.r0 - 1, rect.c0) {
            return above.to_owned();
        }
        // first of the longest wins
        let mut longest = None::<&str>;
        for text in (rect.c0..=rect.c1).filter_map(|col| grid.get(rect.r0 - 1, col)) {
            if longest.map_or(true, |best| text.chars().count() > best.chars().count()) {
                longest = Some(text);
            }
        }
        if let Some(text) = longest {
            return text.to_owned();
        }
    }
    if rect.c0 > 0 {
        if let Some(left) = grid.get(rect.r0, rect.c0 - 1) {
            return left.to_owned();
        }
    }
    generic_fallback.to_owned()
}
