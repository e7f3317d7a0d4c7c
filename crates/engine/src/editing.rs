//! Edit pipeline: start, commit and cancel in-cell edits.
//!
//! Per cell: idle -> editing -> committed | cancelled -> idle.

use gridbase_core::{ColumnId, GridCell, RowId};

use crate::edit::{EditBuffer, EditSession};
use crate::grid::GridEngine;
use crate::history::HistoryChange;
use crate::normalize::{comparable, normalize, RawValue};

impl GridEngine {
    /// Enter edit mode on `cell`. `initial` (a typed character) seeds the
    /// buffer instead of the cell's value. Cancels the cell's queued write.
    pub fn start_editing(&mut self, cell: GridCell, initial: Option<String>) -> bool {
        if !self.maps.is_resolvable(&cell) {
            return false;
        }
        if self.edit.as_ref().is_some_and(|s| s.cell == cell) {
            return false;
        }
        if self.edit.is_some() {
            self.commit_edit();
        }

        let superseded = self.queue.cancel(&cell).map(|w| w.value);
        let original = self.cell_value(&cell).map(str::to_string);
        let buffer = match initial {
            Some(text) => EditBuffer::new(text),
            None => EditBuffer::new(original.clone().unwrap_or_default()),
        };
        self.edit = Some(EditSession {
            cell: cell.clone(),
            buffer,
            original,
            superseded,
        });

        self.focus_cell(cell.clone());
        let changes = self.state.set_editing_cell(Some(cell));
        self.emit_state(changes);
        true
    }

    /// Commit `next_raw` over `previous_raw` for one cell. Both sides are
    /// normalized for the cell's column; equal results change nothing.
    /// Returns whether a write was issued.
    pub fn commit(&mut self, row_id: RowId, column_id: ColumnId, next_raw: RawValue, previous_raw: RawValue) -> bool {
        let cell = GridCell { row_id, column_id };
        let superseded = if self.edit.as_ref().is_some_and(|s| s.cell == cell) {
            self.edit.take().and_then(|s| s.superseded)
        } else {
            None
        };
        let changes = self.state.set_editing_cell(None);
        self.emit_state(changes);

        if !self.maps.is_resolvable(&cell) {
            log::debug!("commit dropped for unresolved cell {:?}", cell);
            return false;
        }
        let column = self.maps.column(&cell.column_id);
        let next = normalize(column, next_raw);
        let previous = normalize(column, previous_raw);

        if comparable(&next) == comparable(&previous) {
            if let Some(value) = superseded {
                self.write_cell(cell, value);
                self.end_gesture();
            }
            return false;
        }

        self.record(vec![HistoryChange {
            row_id: cell.row_id.clone(),
            column_id: cell.column_id.clone(),
            previous_value: previous,
            next_value: next.clone(),
        }]);
        self.write_cell(cell, next);
        self.end_gesture();
        true
    }

    /// Commit the edit buffer against the value shown when editing began.
    pub fn commit_edit(&mut self) -> bool {
        let Some(session) = &self.edit else {
            return false;
        };
        let cell = session.cell.clone();
        let next = RawValue::from(session.buffer.text());
        let previous = RawValue::from(session.original.clone());
        self.commit(cell.row_id, cell.column_id, next, previous)
    }

    /// Discard the buffer. A write the edit superseded is queued again.
    pub fn cancel_edit(&mut self) -> bool {
        let Some(session) = self.edit.take() else {
            return false;
        };
        let changes = self.state.set_editing_cell(None);
        self.emit_state(changes);
        if let Some(value) = session.superseded {
            self.write_cell(session.cell, value);
            self.end_gesture();
        }
        true
    }

    /// Commit, then move the active cell (Tab, Enter, arrows in edit mode).
    /// At the grid edge the move is a no-op but edit mode still ends.
    pub fn commit_and_move(&mut self, d_row: isize, d_col: isize) -> bool {
        let committed = self.commit_edit();
        self.move_selection(d_row, d_col, false);
        committed
    }

    /// Null every resolvable cell in the selection as one history step.
    pub fn clear_selection_values(&mut self) -> bool {
        let Some(bounds) = self.selection_bounds() else {
            return false;
        };
        let mut changes = Vec::new();
        for (row, col) in bounds.cells() {
            let Some(cell) = self.maps.cell_at(row, col) else {
                continue;
            };
            let previous = self.cell_value(&cell).map(str::to_string);
            if comparable(&previous).is_empty() {
                continue;
            }
            changes.push(HistoryChange {
                row_id: cell.row_id.clone(),
                column_id: cell.column_id.clone(),
                previous_value: previous,
                next_value: None,
            });
            self.write_cell(cell, None);
        }
        let cleared = !changes.is_empty();
        self.record(changes);
        self.end_gesture();
        cleared
    }
}
