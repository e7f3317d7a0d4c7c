use serde::{Deserialize, Serialize};

use crate::ids::{ColumnId, RowId};

/// Logical address of a cell. Only meaningful while both ids resolve in
/// the current [`CoordinateMaps`](crate::coords::CoordinateMaps).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub row_id: RowId,
    pub column_id: ColumnId,
}

impl GridCell {
    pub fn new(row_id: impl Into<RowId>, column_id: impl Into<ColumnId>) -> Self {
        Self {
            row_id: row_id.into(),
            column_id: column_id.into(),
        }
    }
}

/// Anchor/focus pair. The anchor stays put while shift-extending; the
/// focus follows the pointer or arrow keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub anchor: GridCell,
    pub focus: GridCell,
}

impl SelectionRange {
    pub fn single(cell: GridCell) -> Self {
        Self {
            anchor: cell.clone(),
            focus: cell,
        }
    }

    pub fn is_single(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Rows a fill-handle drag would write, within one column.
///
/// `rows` runs from the row next to the fill origin towards the drag
/// target (inclusive), so it is monotonic and never contains the origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillPreview {
    pub column_id: ColumnId,
    pub rows: Vec<usize>,
}

impl FillPreview {
    pub fn last_row(&self) -> Option<usize> {
        self.rows.last().copied()
    }

    pub fn contains(&self, row: usize, column_id: &ColumnId) -> bool {
        &self.column_id == column_id && self.rows.contains(&row)
    }
}

/// A rectangular range of cell indices, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl CellRange {
    /// Create a new range, automatically normalizing so start <= end.
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self {
            start_row: r1.min(r2),
            start_col: c1.min(c2),
            end_row: r1.max(r2),
            end_col: c1.max(c2),
        }
    }

    /// Create a single-cell range.
    pub fn single(row: usize, col: usize) -> Self {
        Self::new(row, col, row, col)
    }

    /// Check if this range contains a cell.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }

    /// Number of cells in this range.
    pub fn cell_count(&self) -> usize {
        self.row_count() * self.col_count()
    }

    pub fn row_count(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    pub fn col_count(&self) -> usize {
        self.end_col - self.start_col + 1
    }

    /// Iterate over all cells in this range (row-major order).
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let (start_col, end_col) = (self.start_col, self.end_col);
        (self.start_row..=self.end_row).flat_map(move |r| (start_col..=end_col).map(move |c| (r, c)))
    }

    /// Check if this is a single cell.
    pub fn is_single(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }

    /// Clamp to a `rows x cols` grid. `None` if the grid is empty.
    pub fn clamped(&self, rows: usize, cols: usize) -> Option<Self> {
        if rows == 0 || cols == 0 {
            return None;
        }
        Some(Self::new(
            self.start_row.min(rows - 1),
            self.start_col.min(cols - 1),
            self.end_row.min(rows - 1),
            self.end_col.min(cols - 1),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_single() {
        let r = CellRange::single(5, 3);
        assert!(r.contains(5, 3));
        assert!(!r.contains(5, 4));
        assert!(r.is_single());
        assert_eq!(r.cell_count(), 1);
    }

    #[test]
    fn test_range_multi() {
        let r = CellRange::new(1, 1, 3, 2);
        assert!(r.contains(2, 2));
        assert!(!r.contains(0, 0));
        assert!(!r.is_single());
        assert_eq!(r.cell_count(), 6); // 3 rows x 2 cols
    }

    #[test]
    fn test_range_normalizes() {
        let r = CellRange::new(5, 5, 1, 1);
        assert_eq!((r.start_row, r.start_col, r.end_row, r.end_col), (1, 1, 5, 5));
    }

    #[test]
    fn test_cells_row_major() {
        let cells: Vec<_> = CellRange::new(0, 0, 1, 1).cells().collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_clamped() {
        let r = CellRange::new(2, 2, 40, 9).clamped(10, 3).unwrap();
        assert_eq!(r, CellRange::new(2, 2, 9, 2));
        assert!(CellRange::single(0, 0).clamped(0, 3).is_none());
    }

    #[test]
    fn test_selection_single() {
        let sel = SelectionRange::single(GridCell::new("r1", "c1"));
        assert!(sel.is_single());
    }
}
