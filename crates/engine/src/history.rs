//! Undo/redo history of cell edits.

use gridbase_core::{ColumnId, RowId};

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryChange {
    pub row_id: RowId,
    pub column_id: ColumnId,
    pub previous_value: Option<String>,
    pub next_value: Option<String>,
}

impl HistoryChange {
    pub fn is_noop(&self) -> bool {
        self.previous_value == self.next_value
    }
}

/// One user gesture. Never empty, never holds a no-op change.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryStep {
    changes: Vec<HistoryChange>,
}

impl HistoryStep {
    /// `None` if nothing in `changes` actually changes a value.
    pub fn new(changes: Vec<HistoryChange>) -> Option<Self> {
        let changes: Vec<_> = changes.into_iter().filter(|c| !c.is_noop()).collect();
        if changes.is_empty() {
            None
        } else {
            Some(Self { changes })
        }
    }

    pub fn changes(&self) -> &[HistoryChange] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

pub struct History {
    undo_stack: Vec<HistoryStep>,
    redo_stack: Vec<HistoryStep>,
    max_entries: usize,
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Record a gesture. Returns false when every change was a no-op.
    pub fn push_changes(&mut self, changes: Vec<HistoryChange>) -> bool {
        match HistoryStep::new(changes) {
            Some(step) => {
                self.push_step(step);
                true
            }
            None => false,
        }
    }

    pub fn push_step(&mut self, step: HistoryStep) {
        self.undo_stack.push(step);
        self.redo_stack.clear();

        if self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the latest step onto the redo stack. The caller applies each
    /// change's `previous_value` in reverse order.
    pub fn undo(&mut self) -> Option<HistoryStep> {
        let step = self.undo_stack.pop()?;
        self.redo_stack.push(step.clone());
        Some(step)
    }

    /// Pop the latest undone step back onto the undo stack. The caller
    /// applies each change's `next_value` in order.
    pub fn redo(&mut self) -> Option<HistoryStep> {
        let step = self.redo_stack.pop()?;
        self.undo_stack.push(step.clone());
        Some(step)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}
