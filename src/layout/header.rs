use crate::config::HeaderConfig;
use crate::spreadsheet::grid::TableView;
use chrono::Datelike;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

static NUMERIC_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?-?\d{1,3}(?:,\d{3})*(?:\.\d+)?\)?%?$").expect("Hardcode regex pattern")
});

static BARE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:19|20)\d{2}$").expect("Hardcode regex pattern"));

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((?:19|20)\d{2})-\d{2}-\d{2}").expect("Hardcode regex pattern"));

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];
const DATE_FORMATS: [&str; 5] = ["%b-%d-%Y", "%d-%b-%Y", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

/// Number of leading header tiers of a table.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct HeaderDepths {
    pub(crate) header_rows: usize,
    pub(crate) header_cols: usize,
}

/// Whether a cell reads as a number: `1,234`, `(1,234)`, `-45`, `12.3%`.
/// Digits come in groups of one to three, so `15000` and `2021` are labels.
pub(crate) fn is_numeric_like(text: &str) -> bool {
    NUMERIC_LIKE.is_match(text.trim())
}

fn is_header_tier(texts: &[&str], config: &HeaderConfig) -> bool {
    if texts.is_empty() {
        return false;
    }
    let textish = texts.iter().filter(|text| !is_numeric_like(text)).count();
    textish as f64 >= config.text_ratio * texts.len() as f64
}

/// Counts leading header rows and header columns of a table independently.
pub(crate) fn infer_header_depths(table: &TableView, config: &HeaderConfig) -> HeaderDepths {
    let header_rows = (0..table.height())
        .take_while(|row| is_header_tier(&table.row_texts(*row), config))
        .count();
    let header_cols = (0..table.width())
        .take_while(|col| is_header_tier(&table.col_texts(*col), config))
        .count();
    HeaderDepths { header_rows, header_cols }
}

/// Column and row labels of a table, one entry per table column and row.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct HeaderPaths {
    pub(crate) col_headers: Vec<String>,
    pub(crate) row_headers: Vec<String>,
}

/// Joins header tiers into labels and collapses clean yearly column runs.
pub(crate) fn build_header_paths(table: &TableView, depths: HeaderDepths, config: &HeaderConfig) -> HeaderPaths {
    let mut col_headers: Vec<String> = (0..table.width())
        .map(|col| {
            let tiers: Vec<&str> = (0..depths.header_rows.min(table.height()))
                .filter_map(|row| table.get(row, col))
                .collect();
            tiers.join(&config.separator)
        })
        .collect();
    let row_headers = (0..table.height())
        .map(|row| {
            let tiers: Vec<&str> = (0..depths.header_cols.min(table.width()))
                .filter_map(|col| table.get(row, col))
                .collect();
            tiers.join(&config.separator)
        })
        .collect();

    collapse_year_runs(&mut col_headers, config.min_year_run);
    HeaderPaths { col_headers, row_headers }
}

/// Replaces each maximal run of consecutive years with the bare years when
/// the run is at least `min_run` long.
pub(crate) fn collapse_year_runs(labels: &mut [String], min_run: usize) {
    let years: Vec<Option<i32>> = labels.iter().map(|label| label_year(label)).collect();
    let mut start = 0;
    while start < labels.len() {
        let Some(first) = years[start] else {
            start += 1;
            continue;
        };
        let mut end = start + 1;
        let mut previous = first;
        while let Some(Some(year)) = years.get(end) {
            if *year != previous + 1 {
                break;
            }
            previous = *year;
            end += 1;
        }
        if end - start >= min_run.max(1) {
            for (label, year) in labels[start..end].iter_mut().zip(&years[start..end]) {
                if let Some(year) = year {
                    *label = year.to_string();
                }
            }
        }
        start = end;
    }
}

/// Year of a header label, taken from its lowest year-like tier.
pub(crate) fn label_year(label: &str) -> Option<i32> {
    label.split('|').map(str::trim).rev().find_map(tier_year)
}

fn tier_year(tier: &str) -> Option<i32> {
    if BARE_YEAR.is_match(tier) {
        return tier.parse().ok();
    }
    if let Some(captures) = DATE_PREFIX.captures(tier) {
        return captures[1].parse().ok();
    }
    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(tier, format).ok())
    {
        return Some(datetime.year());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(tier, format).ok())
        .map(|date| date.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::grid::Grid;
    use crate::spreadsheet::grid::Rectangle;
    use proptest::prelude::*;

    fn labels(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|text| text.to_string()).collect()
    }

    #[test]
    fn numeric_like_tokens() {
        for text in ["1,234", "(1,234)", "-45", "12.3%", "(0.5)", "1,234,567", " 7 ", "999.25"] {
            assert!(is_numeric_like(text), "{text}");
        }
        for text in ["", "2021", "1899", "2100", "15000", "1234567", "FY2021", "$100", "1,23", "n/a", "12.3.4"] {
            assert!(!is_numeric_like(text), "{text}");
        }
    }

    #[test]
    fn depths_of_simple_table() {
        let grid = Grid::from_text_rows(vec![
            vec!["Metric", "2020", "2021"],
            vec!["Sales", "1,000", "1,200"],
            vec!["Costs", "(300)", "(350)"],
        ]);
        let table = grid.table(Rectangle::new(0, 2, 0, 2)).unwrap();
        let depths = infer_header_depths(&table, &HeaderConfig::default());
        assert_eq!(depths, HeaderDepths { header_rows: 1, header_cols: 1 });
    }

    #[test]
    fn ungrouped_thousands_read_as_labels() {
        let grid = Grid::from_text_rows(vec![
            vec!["Metric", "Q1", "Q2"],
            vec!["Sales", "15000", "20000"],
            vec!["Costs", "12000", "13000"],
        ]);
        let table = grid.table(Rectangle::new(0, 2, 0, 2)).unwrap();
        let depths = infer_header_depths(&table, &HeaderConfig::default());
        assert_eq!(depths.header_rows, 3);

        let grid = Grid::from_text_rows(vec![
            vec!["Metric", "Q1", "Q2"],
            vec!["Sales", "15,000", "20,000"],
            vec!["Costs", "12,000", "13,000"],
        ]);
        let table = grid.table(Rectangle::new(0, 2, 0, 2)).unwrap();
        assert_eq!(infer_header_depths(&table, &HeaderConfig::default()).header_rows, 1);
    }

    #[test]
    fn empty_leading_row_halts_counting() {
        let grid = Grid::from_text_rows(vec![
            vec!["", "", ""],
            vec!["A", "B", "C"],
            vec!["1", "2", "3"],
        ]);
        let table = grid.table(Rectangle::new(0, 2, 0, 2)).unwrap();
        let depths = infer_header_depths(&table, &HeaderConfig::default());
        assert_eq!(depths.header_rows, 0);
        assert_eq!(depths.header_cols, 0);
    }

    #[test]
    fn multi_tier_paths() {
        let grid = Grid::from_text_rows(vec![
            vec!["", "FY", "FY", "LTM"],
            vec!["", "2019", "2020", "Sep-21"],
            vec!["Revenue", "10", "11", "12"],
        ]);
        let table = grid.table(Rectangle::new(0, 2, 0, 3)).unwrap();
        let depths = HeaderDepths { header_rows: 2, header_cols: 1 };
        let paths = build_header_paths(&table, depths, &HeaderConfig::default());
        assert_eq!(paths.col_headers, labels(&["", "2019", "2020", "LTM | Sep-21"]));
        assert_eq!(paths.row_headers, labels(&["", "", "Revenue"]));
    }

    #[test]
    fn yearly_run_collapses() {
        let mut headers = labels(&["FY|2019", "FY|2020", "FY|2021"]);
        collapse_year_runs(&mut headers, 2);
        assert_eq!(headers, labels(&["2019", "2020", "2021"]));

        let mut headers = labels(&["FY | Dec-31-2020", "FY | 2021-12-31 00:00:00"]);
        collapse_year_runs(&mut headers, 2);
        assert_eq!(headers, labels(&["2020", "2021"]));
    }

    #[test]
    fn non_yearly_run_is_kept() {
        let mut headers = labels(&["Jan|2020", "Mar|2020"]);
        collapse_year_runs(&mut headers, 2);
        assert_eq!(headers, labels(&["Jan|2020", "Mar|2020"]));

        let mut headers = labels(&["Metric", "2019", "Total", "2021"]);
        collapse_year_runs(&mut headers, 2);
        assert_eq!(headers, labels(&["Metric", "2019", "Total", "2021"]));
    }

    #[test]
    fn run_inside_longer_row() {
        let mut headers = labels(&["Metric", "FY | 2019", "FY | 2020", "Budget | 2020"]);
        collapse_year_runs(&mut headers, 2);
        assert_eq!(headers, labels(&["Metric", "2019", "2020", "Budget | 2020"]));
    }

    proptest! {
        #[test]
        fn depths_are_bounded(cells in prop::collection::vec(prop::collection::vec("[a-z0-9]{0,3}", 1..6), 1..8)) {
            let grid = Grid::from_text_rows(cells);
            if grid.width() > 0 {
                let rect = Rectangle::new(0, grid.height() - 1, 0, grid.width() - 1);
                let table = grid.table(rect).unwrap();
                let depths = infer_header_depths(&table, &HeaderConfig::default());
                prop_assert!(depths.header_rows <= rect.height());
                prop_assert!(depths.header_cols <= rect.width());
            }
        }
    }
}
