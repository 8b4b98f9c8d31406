//! Heuristic thresholds for every extraction stage.
//!
//! Each stage receives its own section so that tests can vary one threshold
//! without touching the others. `ExtractConfig::default()` reproduces the
//! behavior of the extension when no named parameter is given.

/// How candidate table rectangles are located in a sheet.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum SegmentStrategy {
    /// Header-row anchored segments sharing one bottom edge.
    #[default]
    HeaderRows,
    /// Contiguous non-empty row blocks split into column blocks.
    Blocks,
}

impl SegmentStrategy {
    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            Self::HeaderRows => "header_rows",
            Self::Blocks => "blocks",
        }
    }

    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "header_rows" | "headers" => Some(Self::HeaderRows),
            "blocks" | "flood_fill" => Some(Self::Blocks),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SegmentConfig {
    pub(crate) strategy: SegmentStrategy,
    /// Minimum non-empty cells for a header candidate row, and minimum segment width
    pub(crate) min_header_cells: usize,
    /// Minimum rectangle height, header row included
    pub(crate) min_rows: usize,
    /// Minimum rectangle width for the block strategy
    pub(crate) min_cols: usize,
    /// Consecutive empty or noise rows tolerated inside a table
    pub(crate) gap_rows: usize,
    /// Non-empty cells allowed outside the segment windows in a tolerated row
    pub(crate) outside_tolerance: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        SegmentConfig {
            strategy: SegmentStrategy::HeaderRows,
            min_header_cells: 3,
            min_rows: 2,
            min_cols: 2,
            gap_rows: 1,
            outside_tolerance: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct HeaderConfig {
    /// Share of non-numeric cells that makes a row or column a header tier
    pub(crate) text_ratio: f64,
    /// Joins header tiers into one label
    pub(crate) separator: String,
    /// Shortest run of consecutive years collapsed to bare years
    pub(crate) min_year_run: usize,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        HeaderConfig {
            text_ratio: 0.6,
            separator: " | ".to_owned(),
            min_year_run: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct UnitConfig {
    /// Rows of the top-left window searched for the table default unit
    pub(crate) window_rows: usize,
    /// Columns of the top-left window searched for the table default unit
    pub(crate) window_cols: usize,
}

impl Default for UnitConfig {
    fn default() -> Self {
        UnitConfig { window_rows: 3, window_cols: 3 }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NamingConfig {
    /// Rows of the sheet searched for a generic heading
    pub(crate) heading_rows: usize,
    /// Columns of the sheet searched for a generic heading
    pub(crate) heading_cols: usize,
}

impl Default for NamingConfig {
    fn default() -> Self {
        NamingConfig { heading_rows: 20, heading_cols: 12 }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TaxonomyConfig {
    /// Minimum score for a canonical metric match (0..=100)
    pub(crate) metric_threshold: f64,
    /// Minimum score for a canonical sheet match (0..=100)
    pub(crate) sheet_threshold: f64,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        TaxonomyConfig {
            metric_threshold: 83.0,
            sheet_threshold: 88.0,
        }
    }
}

/// All extraction settings, one section per stage.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExtractConfig {
    pub(crate) segment: SegmentConfig,
    pub(crate) header: HeaderConfig,
    pub(crate) unit: UnitConfig,
    pub(crate) naming: NamingConfig,
    pub(crate) taxonomy: TaxonomyConfig,
}
