//! Update Queue: one pending write per cell, debounced.
//!
//! A later write to the same cell overwrites the value and restarts the
//! deadline. Writes leave the queue either by `flush` (everything, now) or
//! by `take_due` (deadline passed). Order of release is the order of the
//! latest write to each cell.

use std::time::{Duration, Instant};

use gridbase_core::{ColumnId, GridCell, RowId};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
struct PendingUpdate {
    value: Option<String>,
    seq: u64,
    deadline: Instant,
}

/// A write released from the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub cell: GridCell,
    pub value: Option<String>,
    /// Matches the overlay entry created by the same `queue` call.
    pub seq: u64,
}

pub struct UpdateQueue {
    pending: FxHashMap<GridCell, PendingUpdate>,
    debounce: Duration,
}

impl UpdateQueue {
    pub fn new(debounce: Duration) -> Self {
        Self {
            pending: FxHashMap::default(),
            debounce,
        }
    }

    pub fn queue(&mut self, cell: GridCell, value: Option<String>, seq: u64, now: Instant) {
        self.pending.insert(
            cell,
            PendingUpdate {
                value,
                seq,
                deadline: now + self.debounce,
            },
        );
    }

    /// Release every pending write.
    pub fn flush(&mut self) -> Vec<PendingWrite> {
        let drained: Vec<_> = self.pending.drain().collect();
        into_ordered(drained)
    }

    /// Release writes whose debounce deadline is at or before `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<PendingWrite> {
        let due: Vec<GridCell> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(cell, _)| cell.clone())
            .collect();
        let drained = due
            .into_iter()
            .filter_map(|cell| self.pending.remove(&cell).map(|p| (cell, p)))
            .collect();
        into_ordered(drained)
    }

    pub fn cancel(&mut self, cell: &GridCell) -> Option<PendingWrite> {
        self.pending.remove(cell).map(|p| PendingWrite {
            cell: cell.clone(),
            value: p.value,
            seq: p.seq,
        })
    }

    pub fn cancel_row(&mut self, row_id: &RowId) {
        self.pending.retain(|cell, _| &cell.row_id != row_id);
    }

    pub fn cancel_column(&mut self, column_id: &ColumnId) {
        self.pending.retain(|cell, _| &cell.column_id != column_id);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    pub fn is_pending(&self, cell: &GridCell) -> bool {
        self.pending.contains_key(cell)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn into_ordered(drained: Vec<(GridCell, PendingUpdate)>) -> Vec<PendingWrite> {
    let mut writes: Vec<PendingWrite> = drained
        .into_iter()
        .map(|(cell, p)| PendingWrite {
            cell,
            value: p.value,
            seq: p.seq,
        })
        .collect();
    writes.sort_by_key(|w| w.seq);
    writes
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(250);

    fn cell(row: &str) -> GridCell {
        GridCell::new(row, "a")
    }

    #[test]
    fn test_later_write_overwrites() {
        let now = Instant::now();
        let mut q = UpdateQueue::new(DEBOUNCE);
        q.queue(cell("r0"), Some("1".into()), 1, now);
        q.queue(cell("r0"), Some("2".into()), 2, now);
        let writes = q.flush();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].value.as_deref(), Some("2"));
        assert!(q.is_empty());
    }

    #[test]
    fn test_flush_orders_by_seq() {
        let now = Instant::now();
        let mut q = UpdateQueue::new(DEBOUNCE);
        q.queue(cell("r2"), None, 5, now);
        q.queue(cell("r1"), None, 3, now);
        q.queue(cell("r0"), None, 4, now);
        let rows: Vec<_> = q.flush().into_iter().map(|w| w.cell.row_id.to_string()).collect();
        assert_eq!(rows, vec!["r1", "r0", "r2"]);
    }

    #[test]
    fn test_take_due_respects_restarted_deadline() {
        let start = Instant::now();
        let mut q = UpdateQueue::new(DEBOUNCE);
        q.queue(cell("r0"), Some("a".into()), 1, start);
        q.queue(cell("r1"), Some("b".into()), 2, start);
        // r0 is written again later, so its deadline moves.
        q.queue(cell("r0"), Some("c".into()), 3, start + Duration::from_millis(200));

        let due = q.take_due(start + DEBOUNCE);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].cell, cell("r1"));
        assert_eq!(q.next_deadline(), Some(start + Duration::from_millis(450)));
    }

    #[test]
    fn test_cancel_returns_write() {
        let mut q = UpdateQueue::new(DEBOUNCE);
        q.queue(cell("r0"), Some("x".into()), 7, Instant::now());
        let w = q.cancel(&cell("r0")).unwrap();
        assert_eq!((w.value.as_deref(), w.seq), (Some("x"), 7));
        assert!(q.cancel(&cell("r0")).is_none());
    }

    #[test]
    fn test_cancel_row_and_column() {
        let now = Instant::now();
        let mut q = UpdateQueue::new(DEBOUNCE);
        q.queue(GridCell::new("r0", "a"), None, 1, now);
        q.queue(GridCell::new("r0", "b"), None, 2, now);
        q.queue(GridCell::new("r1", "b"), None, 3, now);
        q.cancel_row(&RowId::from("r0"));
        assert_eq!(q.len(), 1);
        q.cancel_column(&ColumnId::from("b"));
        assert!(q.is_empty());
    }
}
