//! Coordinate maps: id <-> index lookups for rows and columns.
//!
//! Key invariants:
//! - The row index space is `[0, row_count)`; only rows that are currently
//!   loaded have an id. Unknown indices resolve to `None`.
//! - Columns are the ordered visible column list.
//! - Maps are rebuilt wholesale whenever the visible row/column set changes;
//!   they are never patched in place.
//! - All lookups are O(1).

use rustc_hash::FxHashMap;

use crate::ids::{ColumnId, RowId};
use crate::model::Column;
use crate::selection::{CellRange, GridCell, SelectionRange};

#[derive(Debug, Clone, Default)]
pub struct CoordinateMaps {
    row_count: usize,
    row_to_index: FxHashMap<RowId, usize>,
    index_to_row: FxHashMap<usize, RowId>,
    column_to_index: FxHashMap<ColumnId, usize>,
    columns: Vec<Column>,
}

impl CoordinateMaps {
    /// Build from the known `(index, row id)` pairs, the size of the row
    /// space, and the visible columns in display order.
    pub fn build<'a, I>(rows: I, row_count: usize, columns: &[Column]) -> Self
    where
        I: IntoIterator<Item = (usize, &'a RowId)>,
    {
        let mut row_to_index = FxHashMap::default();
        let mut index_to_row = FxHashMap::default();
        for (index, id) in rows {
            if index >= row_count {
                continue;
            }
            row_to_index.insert(id.clone(), index);
            index_to_row.insert(index, id.clone());
        }

        let column_to_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        Self {
            row_count,
            row_to_index,
            index_to_row,
            column_to_index,
            columns: columns.to_vec(),
        }
    }

    /// Size of the row index space (loaded or not).
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows that currently have an id.
    pub fn known_row_count(&self) -> usize {
        self.index_to_row.len()
    }

    pub fn row_index(&self, row_id: &RowId) -> Option<usize> {
        self.row_to_index.get(row_id).copied()
    }

    pub fn column_index(&self, column_id: &ColumnId) -> Option<usize> {
        self.column_to_index.get(column_id).copied()
    }

    pub fn row_id_at(&self, index: usize) -> Option<&RowId> {
        self.index_to_row.get(&index)
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column(&self, column_id: &ColumnId) -> Option<&Column> {
        self.column_index(column_id).map(|i| &self.columns[i])
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Cell at the given indices, if both resolve.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<GridCell> {
        let row_id = self.row_id_at(row)?;
        let column = self.column_at(col)?;
        Some(GridCell {
            row_id: row_id.clone(),
            column_id: column.id.clone(),
        })
    }

    /// `(row, col)` indices of a cell, if both ids resolve.
    pub fn resolve(&self, cell: &GridCell) -> Option<(usize, usize)> {
        Some((self.row_index(&cell.row_id)?, self.column_index(&cell.column_id)?))
    }

    pub fn is_resolvable(&self, cell: &GridCell) -> bool {
        self.resolve(cell).is_some()
    }

    /// Index rectangle denoted by a selection, clamped to the grid.
    pub fn rect(&self, selection: &SelectionRange) -> Option<CellRange> {
        let (ar, ac) = self.resolve(&selection.anchor)?;
        let (fr, fc) = self.resolve(&selection.focus)?;
        CellRange::new(ar, ac, fr, fc).clamped(self.row_count, self.column_count())
    }
}
