//! Undo/redo: replay history steps through the queued write path.

use gridbase_core::{GridCell, SelectionRange};

use crate::grid::GridEngine;
use crate::history::HistoryChange;

impl GridEngine {
    /// Revert the latest step. No-op while editing.
    pub fn undo(&mut self) -> bool {
        if self.edit.is_some() {
            return false;
        }
        let Some(step) = self.history.undo() else {
            return false;
        };
        // Reverse order so a cell touched twice ends at its first value.
        for change in step.changes().iter().rev() {
            self.replay_change(cell_of(change), change.previous_value.clone());
        }
        self.finish_replay(step.changes());
        true
    }

    /// Re-apply the latest undone step. No-op while editing.
    pub fn redo(&mut self) -> bool {
        if self.edit.is_some() {
            return false;
        }
        let Some(step) = self.history.redo() else {
            return false;
        };
        for change in step.changes() {
            self.replay_change(cell_of(change), change.next_value.clone());
        }
        self.finish_replay(step.changes());
        true
    }

    /// Rows or columns deleted since the step was recorded are skipped.
    fn replay_change(&mut self, cell: GridCell, value: Option<String>) {
        if !self.maps.is_resolvable(&cell) {
            log::debug!("history skips unresolved cell {:?}", cell);
            return;
        }
        self.write_cell(cell, value);
    }

    fn finish_replay(&mut self, changes: &[HistoryChange]) {
        self.end_gesture();
        self.select_changed(changes);
        self.emit_history();
    }

    /// Select the bounding rectangle of the replayed cells that still
    /// resolve.
    fn select_changed(&mut self, changes: &[HistoryChange]) {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for change in changes {
            let Some((row, col)) = self.maps.resolve(&cell_of(change)) else {
                continue;
            };
            bounds = Some(match bounds {
                None => (row, col, row, col),
                Some((r0, c0, r1, c1)) => (r0.min(row), c0.min(col), r1.max(row), c1.max(col)),
            });
        }
        let Some((r0, c0, r1, c1)) = bounds else {
            return;
        };
        let (Some(anchor), Some(focus)) = (self.maps.cell_at(r0, c0), self.maps.cell_at(r1, c1)) else {
            return;
        };
        let changes = self
            .state
            .set_active_cell(Some(anchor.clone()))
            .merge(self.state.set_selection(Some(SelectionRange { anchor, focus })));
        self.emit_state(changes);
    }
}

fn cell_of(change: &HistoryChange) -> GridCell {
    GridCell {
        row_id: change.row_id.clone(),
        column_id: change.column_id.clone(),
    }
}
