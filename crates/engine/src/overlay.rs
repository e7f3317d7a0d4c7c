//! Pending-edit overlay read ahead of the authoritative row data.
//!
//! Each local write records its value and a sequence number. A store
//! confirmation or failure only settles the entry if no newer local write
//! has replaced it.

use gridbase_core::{ColumnId, GridCell, RowId};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
struct OverlayEntry {
    value: Option<String>,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct PendingEdits {
    entries: FxHashMap<GridCell, OverlayEntry>,
}

impl PendingEdits {
    pub fn set(&mut self, cell: GridCell, value: Option<String>, seq: u64) {
        self.entries.insert(cell, OverlayEntry { value, seq });
    }

    /// `Some(value)` when the cell has a local edit (the value may be null).
    pub fn get(&self, cell: &GridCell) -> Option<Option<&str>> {
        self.entries.get(cell).map(|e| e.value.as_deref())
    }

    pub fn contains(&self, cell: &GridCell) -> bool {
        self.entries.contains_key(cell)
    }

    /// Drop the entry if it still belongs to write `seq`. Returns whether
    /// it was dropped.
    pub fn settle(&mut self, cell: &GridCell, seq: u64) -> bool {
        match self.entries.get(cell) {
            Some(e) if e.seq == seq => {
                self.entries.remove(cell);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, cell: &GridCell) {
        self.entries.remove(cell);
    }

    pub fn drop_row(&mut self, row_id: &RowId) {
        self.entries.retain(|cell, _| &cell.row_id != row_id);
    }

    pub fn drop_column(&mut self, column_id: &ColumnId) {
        self.entries.retain(|cell, _| &cell.column_id != column_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_edit_is_distinct_from_no_edit() {
        let mut overlay = PendingEdits::default();
        let cell = GridCell::new("r0", "a");
        assert_eq!(overlay.get(&cell), None);
        overlay.set(cell.clone(), None, 1);
        assert_eq!(overlay.get(&cell), Some(None));
    }

    #[test]
    fn test_settle_ignores_superseded_write() {
        let mut overlay = PendingEdits::default();
        let cell = GridCell::new("r0", "a");
        overlay.set(cell.clone(), Some("1".into()), 1);
        overlay.set(cell.clone(), Some("2".into()), 2);

        assert!(!overlay.settle(&cell, 1));
        assert_eq!(overlay.get(&cell), Some(Some("2")));
        assert!(overlay.settle(&cell, 2));
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_drop_row_and_column() {
        let mut overlay = PendingEdits::default();
        overlay.set(GridCell::new("r0", "a"), None, 1);
        overlay.set(GridCell::new("r1", "a"), None, 2);
        overlay.set(GridCell::new("r1", "b"), None, 3);
        overlay.drop_row(&RowId::from("r0"));
        overlay.drop_column(&ColumnId::from("a"));
        assert_eq!(overlay.len(), 1);
        assert!(overlay.contains(&GridCell::new("r1", "b")));
    }
}
