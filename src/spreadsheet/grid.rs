use crate::spreadsheet::reference::index_to_reference;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::ops::RangeBounds;
use thiserror::Error;

/// Errors raised when a rectangle does not fit the grid it is applied to.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum GridError {
    #[error("Invalid rectangle rows {r0}..={r1}, columns {c0}..={c1}")]
    InvalidRectangle { r0: usize, r1: usize, c0: usize, c1: usize },

    #[error("Rectangle {0} lies outside a {1}x{2} grid")]
    RectangleOutOfBounds(String, usize, usize),
}

/// Sparse 2D grid of optional text cells, origin top-left.
///
/// Only non-empty cells are stored, keyed by row then column. Whitespace-only
/// cells are normalized away and text is trimmed, so every stored cell holds
/// non-empty text. The extent covers every position the grid was built from.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Grid {
    rows: BTreeMap<usize, BTreeMap<usize, String>>,
    height: usize,
    width: usize,
}

impl Grid {
    /// Builds a grid from dense rows of optional text.
    pub(crate) fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let cells = rows.into_iter().enumerate().flat_map(|(row, record)| {
            record
                .into_iter()
                .enumerate()
                .filter_map(move |(col, cell)| cell.map(|text| (row, col, text)))
        });
        let mut grid = Self::from_cells(cells);
        grid.height = height;
        grid.width = width;
        grid
    }

    /// Builds a grid from sparse `(row, col, text)` triples.
    pub(crate) fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, String)>,
    {
        let mut grid = Grid::default();
        for (row, col, text) in cells {
            grid.height = grid.height.max(row + 1);
            grid.width = grid.width.max(col + 1);
            if let Some(text) = normalize(text) {
                grid.rows.entry(row).or_default().insert(col, text);
            }
        }
        grid
    }

    /// Builds a grid from rows of plain strings, where `""` means absent.
    pub(crate) fn from_text_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<S>>,
        S: AsRef<str>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.iter().map(|text| Some(text.as_ref().to_owned())).collect())
                .collect(),
        )
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    /// Text at `(row, col)`, or `None` when absent or out of bounds.
    pub(crate) fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(&row)?.get(&col).map(String::as_str)
    }

    pub(crate) fn is_filled(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some()
    }

    /// Filled cells of a row restricted to columns `cols`, left to right.
    pub(crate) fn row_cells<C>(&self, row: usize, cols: C) -> impl Iterator<Item = (usize, &str)> + '_
    where
        C: RangeBounds<usize>,
    {
        self.cells_within(row, (cols.start_bound().cloned(), cols.end_bound().cloned()))
    }

    fn cells_within(&self, row: usize, cols: (Bound<usize>, Bound<usize>)) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(move |cells| cells.range(cols))
            .map(|(col, text)| (*col, text.as_str()))
    }

    /// Number of non-empty cells in a row, restricted to columns `cols`.
    pub(crate) fn count_filled<C>(&self, row: usize, cols: C) -> usize
    where
        C: RangeBounds<usize>,
    {
        self.row_cells(row, cols).count()
    }

    /// Indexes of the rows holding at least one cell within `rows`, top to bottom.
    pub(crate) fn filled_rows<R>(&self, rows: R) -> impl Iterator<Item = usize> + '_
    where
        R: RangeBounds<usize>,
    {
        self.rows_within((rows.start_bound().cloned(), rows.end_bound().cloned()))
    }

    fn rows_within(&self, rows: (Bound<usize>, Bound<usize>)) -> impl Iterator<Item = usize> + '_ {
        self.rows.range(rows).map(|(row, _)| *row)
    }

    /// Borrowed view over the cells of `rect`, checked against the grid bounds.
    pub(crate) fn table(&self, rect: Rectangle) -> Result<TableView<'_>, GridError> {
        rect.check(self)?;
        Ok(TableView { grid: self, rect })
    }
}

fn normalize(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == text.len() {
        Some(text)
    } else {
        Some(trimmed.to_owned())
    }
}

/// Inclusive rectangular extent of one table inside a grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Rectangle {
    pub(crate) r0: usize,
    pub(crate) r1: usize,
    pub(crate) c0: usize,
    pub(crate) c1: usize,
}

impl Rectangle {
    pub(crate) const fn new(r0: usize, r1: usize, c0: usize, c1: usize) -> Self {
        Rectangle { r0, r1, c0, c1 }
    }

    pub(crate) const fn height(&self) -> usize {
        self.r1 - self.r0 + 1
    }

    pub(crate) const fn width(&self) -> usize {
        self.c1 - self.c0 + 1
    }

    /// Excel-style reference of the extent, e.g. `B2:E9`.
    pub(crate) fn reference(&self) -> String {
        format!("{}:{}", index_to_reference(self.r0, self.c0), index_to_reference(self.r1, self.c1))
    }

    /// Ensures the bounds are ordered and fit inside `grid`.
    pub(crate) fn check(&self, grid: &Grid) -> Result<(), GridError> {
        if self.r1 < self.r0 || self.c1 < self.c0 {
            Err(GridError::InvalidRectangle { r0: self.r0, r1: self.r1, c0: self.c0, c1: self.c1 })
        } else if self.r1 >= grid.height() || self.c1 >= grid.width() {
            Err(GridError::RectangleOutOfBounds(self.reference(), grid.height(), grid.width()))
        } else {
            Ok(())
        }
    }
}

/// A rectangle of a grid addressed with table-relative coordinates.
#[derive(Copy, Clone, Debug)]
pub(crate) struct TableView<'a> {
    pub(crate) grid: &'a Grid,
    pub(crate) rect: Rectangle,
}

impl<'a> TableView<'a> {
    pub(crate) const fn height(&self) -> usize {
        self.rect.height()
    }

    pub(crate) const fn width(&self) -> usize {
        self.rect.width()
    }

    /// Text at table-relative `(row, col)`.
    pub(crate) fn get(&self, row: usize, col: usize) -> Option<&'a str> {
        if row < self.height() && col < self.width() {
            self.grid.get(self.rect.r0 + row, self.rect.c0 + col)
        } else {
            None
        }
    }

    /// Non-empty texts of one table row, left to right.
    pub(crate) fn row_texts(&self, row: usize) -> Vec<&'a str> {
        if row >= self.height() {
            return Vec::new();
        }
        self.grid
            .row_cells(self.rect.r0 + row, self.rect.c0..=self.rect.c1)
            .map(|(_, text)| text)
            .collect()
    }

    /// Non-empty texts of one table column, top to bottom.
    pub(crate) fn col_texts(&self, col: usize) -> Vec<&'a str> {
        (0..self.height()).filter_map(|row| self.get(row, col)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_normalizes_blank_cells() {
        let grid = Grid::new(vec![
            vec![Some(" a ".to_owned()), Some("   ".to_owned())],
            vec![None, Some("b".to_owned()), Some("".to_owned())],
        ]);

        assert_eq!(grid.height(), 2);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.get(0, 0), Some("a"));
        assert_eq!(grid.get(0, 1), None);
        assert_eq!(grid.get(0, 2), None);
        assert_eq!(grid.get(1, 1), Some("b"));
        assert_eq!(grid.get(1, 2), None);
        assert_eq!(grid.get(9, 9), None);
    }

    #[test]
    fn grid_from_sparse_cells() {
        let grid = Grid::from_cells(vec![
            (0, 2, "x".to_owned()),
            (3, 0, "y".to_owned()),
        ]);

        assert_eq!(grid.height(), 4);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.get(0, 2), Some("x"));
        assert_eq!(grid.get(3, 0), Some("y"));
        assert_eq!(grid.count_filled(1, 0..3), 0);
        assert_eq!(grid.filled_rows(..).collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn distant_cell_stays_sparse() {
        let grid = Grid::from_cells(vec![
            (0, 0, "a".to_owned()),
            (1_048_575, 16_383, "note".to_owned()),
        ]);

        assert_eq!(grid.height(), 1_048_576);
        assert_eq!(grid.width(), 16_384);
        assert_eq!(grid.get(1_048_575, 16_383), Some("note"));
        assert_eq!(grid.filled_rows(1..).collect::<Vec<_>>(), vec![1_048_575]);
        assert_eq!(grid.count_filled(0, ..), 1);
        assert_eq!(grid.row_cells(1_048_575, 0..16_383).count(), 0);
    }

    #[test]
    fn rectangle_checks_bounds() {
        let grid = Grid::from_text_rows(vec![vec!["a", "b"], vec!["c", "d"]]);

        assert!(Rectangle::new(0, 1, 0, 1).check(&grid).is_ok());
        assert_eq!(
            Rectangle::new(1, 0, 0, 1).check(&grid),
            Err(GridError::InvalidRectangle { r0: 1, r1: 0, c0: 0, c1: 1 })
        );
        assert_eq!(
            Rectangle::new(0, 2, 0, 1).check(&grid),
            Err(GridError::RectangleOutOfBounds("A1:B3".to_owned(), 2, 2))
        );
    }

    #[test]
    fn table_view_is_relative() {
        let grid = Grid::from_text_rows(vec![
            vec!["", "", ""],
            vec!["", "a", "b"],
            vec!["", "", "d"],
        ]);
        let table = grid.table(Rectangle::new(1, 2, 1, 2)).unwrap();

        assert_eq!(table.height(), 2);
        assert_eq!(table.width(), 2);
        assert_eq!(table.get(0, 0), Some("a"));
        assert_eq!(table.get(1, 0), None);
        assert_eq!(table.row_texts(0), vec!["a", "b"]);
        assert_eq!(table.col_texts(1), vec!["b", "d"]);
        assert_eq!(table.get(2, 0), None);
    }
}
