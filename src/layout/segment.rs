//! Region segmentation: locating table rectangles inside a sheet grid.
//!
//! The default strategy anchors tables on header rows. Every run of at least
//! `min_header_cells` adjacent non-empty cells in a header candidate row opens
//! one table, and all tables opened by the same row are extended downward
//! together, so side-by-side tables always end on the same row.

use crate::config::SegmentConfig;
use crate::config::SegmentStrategy;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::grid::Rectangle;
use std::collections::BTreeSet;

/// Detects candidate table rectangles with the configured strategy.
pub(crate) fn segment(grid: &Grid, config: &SegmentConfig) -> Vec<Rectangle> {
    match config.strategy {
        SegmentStrategy::HeaderRows => segment_header_rows(grid, config),
        SegmentStrategy::Blocks => segment_blocks(grid, config),
    }
}

/// Maximal runs of non-empty cells in `row` that are at least `min_width` wide.
pub(crate) fn header_segments(grid: &Grid, row: usize, min_width: usize) -> Vec<(usize, usize)> {
    consecutive_runs(grid.row_cells(row, ..).map(|(col, _)| col))
        .into_iter()
        .filter(|(c0, c1)| c1 - c0 + 1 >= min_width.max(1))
        .collect()
}

/// Header-row anchored segmentation with a shared bottom bound per header row.
pub(crate) fn segment_header_rows(grid: &Grid, config: &SegmentConfig) -> Vec<Rectangle> {
    let mut rectangles = Vec::new();
    let mut next = 0usize;
    while let Some(row) = grid.filled_rows(next..).next() {
        next = row + 1;
        if grid.count_filled(row, ..) < config.min_header_cells {
            continue;
        }
        let segments = header_segments(grid, row, config.min_header_cells);
        if segments.is_empty() {
            continue;
        }

        let shared_r1 = shared_bottom(grid, row, &segments, config);
        if shared_r1 - row + 1 >= config.min_rows {
            for (c0, c1) in &segments {
                rectangles.push(Rectangle::new(row, shared_r1, *c0, *c1));
            }
        }
        next = shared_r1 + 1;
    }
    rectangles
}

/// Walks down from header row `r0` and returns the last row that still holds
/// content inside the union of the segment windows.
fn shared_bottom(grid: &Grid, r0: usize, segments: &[(usize, usize)], config: &SegmentConfig) -> usize {
    let inside = |col: usize| segments.iter().any(|(c0, c1)| *c0 <= col && col <= *c1);
    let mut shared_r1 = r0;
    let mut gaps = 0usize;
    for row in (r0 + 1)..grid.height() {
        let (mut inner, mut outer) = (0usize, 0usize);
        for (col, _) in grid.row_cells(row, ..) {
            if inside(col) {
                inner += 1;
            } else {
                outer += 1;
            }
        }

        if inner > 0 {
            shared_r1 = row;
            gaps = 0;
        } else if outer <= config.outside_tolerance {
            // empty or stray-note row
            gaps += 1;
            if gaps > config.gap_rows {
                break;
            }
        } else {
            break;
        }
    }
    shared_r1
}

/// Mask based segmentation: contiguous non-empty row blocks, split into
/// contiguous non-empty column blocks and trimmed to their content. A first
/// row holding a single value is taken as a title and left out.
pub(crate) fn segment_blocks(grid: &Grid, config: &SegmentConfig) -> Vec<Rectangle> {
    let mut rectangles = Vec::new();
    for (block_r0, block_r1) in consecutive_runs(grid.filled_rows(..)) {
        let cols: BTreeSet<usize> = (block_r0..=block_r1)
            .flat_map(|row| grid.row_cells(row, ..).map(|(col, _)| col))
            .collect();
        for (c0, c1) in consecutive_runs(cols) {
            let row_filled = |row: &usize| grid.count_filled(*row, c0..=c1) > 0;
            let top = (block_r0..=block_r1).find(row_filled);
            let bottom = (block_r0..=block_r1).rev().find(row_filled);
            let (Some(mut r0), Some(r1)) = (top, bottom) else {
                continue;
            };
            if grid.count_filled(r0, c0..=c1) == 1 {
                r0 += 1;
            }
            if r0 <= r1 && r1 - r0 + 1 >= config.min_rows && c1 - c0 + 1 >= config.min_cols {
                rectangles.push(Rectangle::new(r0, r1, c0, c1));
            }
        }
    }
    rectangles
}

/// Maximal runs of consecutive values in an ascending sequence of indexes.
fn consecutive_runs<I>(indexes: I) -> Vec<(usize, usize)>
where
    I: IntoIterator<Item = usize>,
{
    let mut runs = Vec::<(usize, usize)>::new();
    for index in indexes {
        match runs.last_mut() {
            Some((_, upper)) if *upper + 1 == index => *upper = index,
            _ => runs.push((index, index)),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> SegmentConfig {
        SegmentConfig::default()
    }

    #[test]
    fn single_table() {
        let grid = Grid::from_text_rows(vec![
            vec!["Metric", "2020", "2021"],
            vec!["Sales", "1", "2"],
            vec!["Costs", "3", "4"],
        ]);
        assert_eq!(segment(&grid, &config()), vec![Rectangle::new(0, 2, 0, 2)]);
    }

    #[test]
    fn side_by_side_tables_share_bottom() {
        let grid = Grid::from_text_rows(vec![
            vec!["A", "B", "C", "", "D", "E", "F"],
            vec!["1", "2", "3", "", "4", "5", "6"],
            vec!["1", "2", "3", "", "", "", ""],
            vec!["", "", "", "", "4", "5", "6"],
        ]);
        assert_eq!(
            segment(&grid, &config()),
            vec![Rectangle::new(0, 3, 0, 2), Rectangle::new(0, 3, 4, 6)]
        );
    }

    #[test]
    fn narrow_segments_are_skipped() {
        let grid = Grid::from_text_rows(vec![
            vec!["A", "B", "", "C", "D", "", "E"],
            vec!["1", "2", "", "3", "4", "", "5"],
            vec!["x", "y", "z", "", "", "", ""],
            vec!["1", "2", "3", "", "", "", ""],
        ]);
        // row 0 has five cells but no run of three; row 2 opens the table
        assert_eq!(segment(&grid, &config()), vec![Rectangle::new(2, 3, 0, 2)]);
    }

    #[test]
    fn gap_row_is_tolerated_once() {
        let grid = Grid::from_text_rows(vec![
            vec!["A", "B", "C"],
            vec!["1", "2", "3"],
            vec!["", "", ""],
            vec!["4", "5", "6"],
            vec!["", "", ""],
            vec!["", "", ""],
            vec!["7", "8", "9"],
        ]);
        assert_eq!(segment(&grid, &config()), vec![Rectangle::new(0, 3, 0, 2)]);
    }

    #[test]
    fn stray_note_outside_window_is_tolerated() {
        let grid = Grid::from_text_rows(vec![
            vec!["A", "B", "C", ""],
            vec!["1", "2", "3", ""],
            vec!["", "", "", "note"],
            vec!["4", "5", "6", ""],
        ]);
        assert_eq!(segment(&grid, &config()), vec![Rectangle::new(0, 3, 0, 2)]);
    }

    #[test]
    fn note_row_and_empty_row_share_gap_budget() {
        let grid = Grid::from_text_rows(vec![
            vec!["A", "B", "C", ""],
            vec!["1", "2", "3", ""],
            vec!["", "", "", "note"],
            vec!["", "", "", ""],
            vec!["4", "5", "6", ""],
        ]);
        assert_eq!(segment(&grid, &config()), vec![Rectangle::new(0, 1, 0, 2)]);
    }

    #[test]
    fn empty_row_and_note_row_share_gap_budget() {
        let grid = Grid::from_text_rows(vec![
            vec!["A", "B", "C", ""],
            vec!["1", "2", "3", ""],
            vec!["", "", "", ""],
            vec!["", "", "", "note"],
            vec!["4", "5", "6", ""],
        ]);
        assert_eq!(segment(&grid, &config()), vec![Rectangle::new(0, 1, 0, 2)]);
    }

    #[test]
    fn wider_gap_budget_bridges_both() {
        let grid = Grid::from_text_rows(vec![
            vec!["A", "B", "C", ""],
            vec!["1", "2", "3", ""],
            vec!["", "", "", "note"],
            vec!["", "", "", ""],
            vec!["4", "5", "6", ""],
        ]);
        let config = SegmentConfig {
            gap_rows: 2,
            ..SegmentConfig::default()
        };
        assert_eq!(segment(&grid, &config), vec![Rectangle::new(0, 4, 0, 2)]);
    }

    #[test]
    fn distant_stray_cell_is_cheap() {
        let grid = Grid::from_cells(vec![
            (0, 0, "A".to_owned()),
            (0, 1, "B".to_owned()),
            (0, 2, "C".to_owned()),
            (1, 0, "1".to_owned()),
            (1, 1, "2".to_owned()),
            (1, 2, "3".to_owned()),
            (1_048_575, 16_383, "note".to_owned()),
        ]);
        assert_eq!(segment(&grid, &config()), vec![Rectangle::new(0, 1, 0, 2)]);
        let blocks = SegmentConfig {
            strategy: SegmentStrategy::Blocks,
            ..SegmentConfig::default()
        };
        assert_eq!(segment(&grid, &blocks), vec![Rectangle::new(0, 1, 0, 2)]);
    }

    #[test]
    fn busy_row_outside_window_stops_table() {
        let grid = Grid::from_text_rows(vec![
            vec!["A", "B", "C", "", "", ""],
            vec!["1", "2", "3", "", "", ""],
            vec!["", "", "", "", "x", "y"],
            vec!["4", "5", "6", "", "", ""],
        ]);
        assert_eq!(segment(&grid, &config()), vec![Rectangle::new(0, 1, 0, 2)]);
    }

    #[test]
    fn lone_header_row_is_dropped() {
        let grid = Grid::from_text_rows(vec![
            vec!["A", "B", "C"],
            vec!["", "", ""],
            vec!["", "", ""],
            vec!["D", "E", "F"],
            vec!["1", "2", "3"],
        ]);
        assert_eq!(segment(&grid, &config()), vec![Rectangle::new(3, 4, 0, 2)]);
    }

    #[test]
    fn block_strategy_trims_title_row() {
        let grid = Grid::from_text_rows(vec![
            vec!["Income statement", "", ""],
            vec!["Metric", "2020", "2021"],
            vec!["Sales", "1", "2"],
            vec!["", "", ""],
            vec!["", "", "x"],
        ]);
        let config = SegmentConfig {
            strategy: SegmentStrategy::Blocks,
            ..SegmentConfig::default()
        };
        assert_eq!(segment(&grid, &config), vec![Rectangle::new(1, 2, 0, 2)]);
    }

    #[test]
    fn empty_grid_has_no_tables() {
        assert!(segment(&Grid::default(), &config()).is_empty());
    }

    fn arbitrary_grid() -> impl Strategy<Value = Grid> {
        prop::collection::vec(prop::collection::vec(prop::bool::weighted(0.55), 0..9), 0..14).prop_map(|mask| {
            Grid::new(
                mask.into_iter()
                    .map(|row| row.into_iter().map(|filled| filled.then(|| "v".to_owned())).collect())
                    .collect(),
            )
        })
    }

    proptest! {
        #[test]
        fn rectangles_are_well_formed(grid in arbitrary_grid(), blocks in any::<bool>()) {
            let config = SegmentConfig {
                strategy: if blocks { SegmentStrategy::Blocks } else { SegmentStrategy::HeaderRows },
                ..SegmentConfig::default()
            };
            for rect in segment(&grid, &config) {
                prop_assert!(rect.check(&grid).is_ok());
                prop_assert!(rect.height() >= config.min_rows);
                if !blocks {
                    prop_assert!(rect.width() >= config.min_header_cells);
                }
            }
        }

        #[test]
        fn shared_header_row_means_shared_bottom(grid in arbitrary_grid()) {
            let rectangles = segment(&grid, &config());
            for a in &rectangles {
                for b in rectangles.iter().filter(|b| b.r0 == a.r0) {
                    prop_assert_eq!(a.r1, b.r1);
                }
            }
        }
    }
}
