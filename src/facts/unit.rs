//! Unit and scale detection for table cells.
//!
//! A table carries one default unit read from its top-left corner and a list
//! of spatial overrides. Each override is anchored at an absolute cell and
//! applies to every cell at or below-and-right of that anchor until a more
//! specific anchor takes over.

use crate::config::UnitConfig;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::grid::GridError;
use crate::spreadsheet::grid::Rectangle;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static PERCENT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpercent(?:age)?\b").expect("Hardcode regex pattern"));

static MAGNITUDES: LazyLock<[(Regex, f64); 3]> = LazyLock::new(|| {
    [
        (Regex::new(r"\bthousands?\b").expect("Hardcode regex pattern"), 1e3),
        (Regex::new(r"\bmillions?\b").expect("Hardcode regex pattern"), 1e6),
        (Regex::new(r"\bbillions?\b").expect("Hardcode regex pattern"), 1e9),
    ]
});

/// Unit attached to a fact value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) enum Unit {
    #[default]
    None,
    Percent,
    Usd,
    Generic,
}

impl Unit {
    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Percent => "%",
            Self::Usd => "USD",
            Self::Generic => "UNIT",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit with its multiplier and the text it was read from.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct UnitScale {
    pub(crate) unit: Unit,
    pub(crate) scale: f64,
    pub(crate) evidence: String,
}

impl Default for UnitScale {
    fn default() -> Self {
        UnitScale {
            unit: Unit::None,
            scale: 1.0,
            evidence: String::new(),
        }
    }
}

/// Reads a unit and scale from a short label such as `$ in thousands`.
pub(crate) fn parse_unit_scale(text: &str) -> Option<(Unit, f64)> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();
    if text.contains('%') || PERCENT_WORD.is_match(&lower) {
        return Some((Unit::Percent, 1.0));
    }

    let magnitude = MAGNITUDES
        .iter()
        .find(|(pattern, _)| pattern.is_match(&lower))
        .map(|(_, scale)| *scale);
    let currency = text.contains('$') || lower.contains("usd");
    match (currency, magnitude) {
        (true, Some(scale)) => Some((Unit::Usd, scale)),
        (true, None) => Some((Unit::Usd, 1.0)),
        (false, Some(scale)) => Some((Unit::Generic, scale)),
        (false, None) => None,
    }
}

/// Where an override was found. Later variants win ties at the same anchor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum OverrideSource {
    SecondRow,
    RowHeader,
}

/// A unit declared at an absolute anchor cell.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Override {
    pub(crate) row: usize,
    pub(crate) col: usize,
    pub(crate) source: OverrideSource,
    pub(crate) unit_scale: UnitScale,
}

impl Override {
    fn key(&self) -> (usize, usize, OverrideSource) {
        (self.row, self.col, self.source)
    }

    const fn dominates(&self, row: usize, col: usize) -> bool {
        row >= self.row && col >= self.col
    }
}

/// Default unit of a table plus its overrides sorted by anchor.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct UnitDetection {
    pub(crate) default: UnitScale,
    pub(crate) overrides: Vec<Override>,
}

impl UnitDetection {
    /// Builds a detection whose resolution does not depend on the order the
    /// overrides were registered in.
    pub(crate) fn new(default: UnitScale, mut overrides: Vec<Override>) -> Self {
        overrides.sort_by(|a, b| a.key().cmp(&b.key()));
        UnitDetection { default, overrides }
    }

    /// Effective unit and scale of the absolute cell `(row, col)`.
    pub(crate) fn resolve(&self, row: usize, col: usize) -> &UnitScale {
        self.overrides
            .iter()
            .filter(|candidate| candidate.dominates(row, col))
            .last()
            .map_or(&self.default, |candidate| &candidate.unit_scale)
    }
}

fn matched(text: &str) -> Option<UnitScale> {
    let (unit, scale) = parse_unit_scale(text)?;
    Some(UnitScale { unit, scale, evidence: text.to_owned() })
}

/// Detects the default unit and the overrides of the table at `rect`.
pub(crate) fn detect_units_and_scale(grid: &Grid, rect: Rectangle, config: &UnitConfig) -> Result<UnitDetection, GridError> {
    let table = grid.table(rect)?;

    let window: Vec<&str> = (0..table.height().min(config.window_rows))
        .flat_map(|row| (0..table.width().min(config.window_cols)).map(move |col| (row, col)))
        .filter_map(|(row, col)| table.get(row, col))
        .collect();
    let default = window
        .iter()
        .find_map(|text| matched(text))
        .or_else(|| {
            window
                .iter()
                .find(|text| text.contains('$') || text.to_uppercase().contains("USD"))
                .map(|text| UnitScale { unit: Unit::Usd, scale: 1.0, evidence: text.to_string() })
        })
        .unwrap_or_default();

    let mut overrides = Vec::new();
    if table.width() > 1 {
        for row in 1..table.height() {
            if let Some(unit_scale) = table.get(row, 0).and_then(matched) {
                overrides.push(Override {
                    row: rect.r0 + row,
                    col: rect.c0 + 1,
                    source: OverrideSource::RowHeader,
                    unit_scale,
                });
            }
        }
    }
    if table.height() > 1 {
        let mut hint = None::<UnitScale>;
        for col in 0..table.width() {
            if let Some(unit_scale) = table.get(1, col).and_then(matched) {
                hint = Some(unit_scale);
            }
            match &hint {
                Some(unit_scale) if col >= 1 => overrides.push(Override {
                    row: rect.r0 + 1,
                    col: rect.c0 + col,
                    source: OverrideSource::SecondRow,
                    unit_scale: unit_scale.clone(),
                }),
                _ => (),
            }
        }
    }

    Ok(UnitDetection::new(default, overrides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_scale(unit: Unit, scale: f64) -> UnitScale {
        UnitScale { unit, scale, evidence: String::new() }
    }

    #[test]
    fn unit_grammar() {
        assert_eq!(parse_unit_scale("$ in thousands"), Some((Unit::Usd, 1e3)));
        assert_eq!(parse_unit_scale("USD millions"), Some((Unit::Usd, 1e6)));
        assert_eq!(parse_unit_scale("US$"), Some((Unit::Usd, 1.0)));
        assert_eq!(parse_unit_scale("(in billions)"), Some((Unit::Generic, 1e9)));
        assert_eq!(parse_unit_scale("Thousand"), Some((Unit::Generic, 1e3)));
        assert_eq!(parse_unit_scale("% of sales, $ thousands"), Some((Unit::Percent, 1.0)));
        assert_eq!(parse_unit_scale("Percentage"), Some((Unit::Percent, 1.0)));
        assert_eq!(parse_unit_scale("Revenue"), None);
        assert_eq!(parse_unit_scale("thousandth"), None);
        assert_eq!(parse_unit_scale("  "), None);
    }

    #[test]
    fn default_from_top_left_window() {
        let grid = Grid::from_text_rows(vec![
            vec!["", "", "", ""],
            vec!["$ in thousands", "2020", "2021", "2022"],
            vec!["Sales", "1", "2", "3"],
        ]);
        let detection = detect_units_and_scale(&grid, Rectangle::new(1, 2, 0, 3), &UnitConfig::default()).unwrap();
        assert_eq!(detection.default.unit, Unit::Usd);
        assert_eq!(detection.default.scale, 1e3);
        assert_eq!(detection.default.evidence, "$ in thousands");
    }

    #[test]
    fn default_outside_window_is_ignored() {
        let grid = Grid::from_text_rows(vec![
            vec!["Metric", "2020", "2021", "in millions"],
            vec!["Sales", "1", "2", "3"],
        ]);
        let detection = detect_units_and_scale(&grid, Rectangle::new(0, 1, 0, 3), &UnitConfig::default()).unwrap();
        assert_eq!(detection.default, UnitScale::default());
    }

    #[test]
    fn row_header_override() {
        let grid = Grid::from_text_rows(vec![
            vec!["Metric", "2020", "2021"],
            vec!["Sales", "1", "2"],
            vec!["Costs", "3", "4"],
            vec!["Costs ($000)", "5", "6"],
            vec!["Margin %", "10", "11"],
            vec!["Headcount", "5", "6"],
        ]);
        let detection = detect_units_and_scale(&grid, Rectangle::new(0, 5, 0, 2), &UnitConfig::default()).unwrap();
        assert_eq!(detection.default, UnitScale::default());
        assert_eq!(detection.resolve(1, 1).unit, Unit::None);
        assert_eq!(detection.resolve(3, 2).unit, Unit::Usd);
        assert_eq!(detection.resolve(4, 1).unit, Unit::Percent);
        // a later row keeps the last dominating anchor
        assert_eq!(detection.resolve(5, 1).unit, Unit::Percent);
        assert_eq!(detection.resolve(3, 0).unit, Unit::None);
    }

    #[test]
    fn second_row_hint_spreads_right() {
        let grid = Grid::from_text_rows(vec![
            vec!["Metric", "FY20", "FY21", "FY22"],
            vec!["", "$ millions", "", "%"],
            vec!["Sales", "1", "2", "3"],
        ]);
        let detection = detect_units_and_scale(&grid, Rectangle::new(0, 2, 0, 3), &UnitConfig::default()).unwrap();
        let second_row: Vec<_> = detection
            .overrides
            .iter()
            .filter(|candidate| candidate.source == OverrideSource::SecondRow)
            .map(|candidate| (candidate.col, candidate.unit_scale.unit))
            .collect();
        assert_eq!(second_row, vec![(1, Unit::Usd), (2, Unit::Usd), (3, Unit::Percent)]);
        assert_eq!(detection.resolve(2, 2).scale, 1e6);
        assert_eq!(detection.resolve(2, 3).unit, Unit::Percent);
    }

    #[test]
    fn row_header_beats_second_row_at_same_anchor() {
        let grid = Grid::from_text_rows(vec![
            vec!["Metric", "A", "B"],
            vec!["Sales in thousands", "$", "1"],
            vec!["Other", "1", "2"],
        ]);
        let detection = detect_units_and_scale(&grid, Rectangle::new(0, 2, 0, 2), &UnitConfig::default()).unwrap();
        assert_eq!(detection.resolve(1, 1).unit, Unit::Generic);
        assert_eq!(detection.resolve(1, 1).scale, 1e3);
    }

    #[test]
    fn out_of_bounds_rectangle_is_an_error() {
        let grid = Grid::from_text_rows(vec![vec!["a", "b"]]);
        assert!(detect_units_and_scale(&grid, Rectangle::new(0, 3, 0, 1), &UnitConfig::default()).is_err());
    }

    fn arbitrary_override() -> impl Strategy<Value = Override> {
        (0usize..6, 0usize..6, any::<bool>(), 1u32..5).prop_map(|(row, col, row_header, scale)| Override {
            row,
            col,
            source: if row_header { OverrideSource::RowHeader } else { OverrideSource::SecondRow },
            unit_scale: unit_scale(Unit::Generic, scale as f64),
        })
    }

    proptest! {
        #[test]
        fn resolution_ignores_registration_order(
            overrides in prop::collection::vec(arbitrary_override(), 0..12),
            row in 0usize..8,
            col in 0usize..8,
        ) {
            let mut overrides = overrides;
            overrides.sort_by_key(Override::key);
            overrides.dedup_by_key(|candidate| candidate.key());
            let mut reversed = overrides.clone();
            reversed.reverse();
            let forward = UnitDetection::new(UnitScale::default(), overrides.clone());
            let backward = UnitDetection::new(UnitScale::default(), reversed);
            prop_assert_eq!(forward.resolve(row, col), backward.resolve(row, col));

            let expected = overrides
                .iter()
                .filter(|candidate| candidate.dominates(row, col))
                .map(|candidate| candidate.key())
                .max();
            let resolved = forward
                .overrides
                .iter()
                .filter(|candidate| candidate.dominates(row, col))
                .last()
                .map(|candidate| candidate.key());
            prop_assert_eq!(resolved, expected);
        }
    }
}
