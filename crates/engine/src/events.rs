//! Event types for grid change notifications.
//!
//! The UI layer subscribes instead of polling the engine. Tests use
//! [`EventCollector`] to assert which notifications a gesture produced.

use std::cell::RefCell;
use std::rc::Rc;

use gridbase_core::GridCell;

use crate::store::MutationKind;

/// Events emitted by [`GridEngine`](crate::GridEngine).
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    ActiveCellChanged(Option<GridCell>),
    SelectionChanged,
    EditingChanged(Option<GridCell>),
    FillPreviewChanged,
    /// Displayed values changed (local write, rollback or promotion).
    CellsChanged(Vec<GridCell>),
    /// Rows `[start, end)` arrived from the store.
    RowsLoaded { start: usize, end: usize },
    FetchFailed { start: usize, end: usize, message: String },
    MutationFailed { kind: MutationKind, message: String },
    /// Rows or columns were added, removed or renamed.
    StructureChanged,
    HistoryChanged { can_undo: bool, can_redo: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback type for receiving grid events.
pub type EventCallback = Box<dyn FnMut(&GridEvent)>;

#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, EventCallback)>,
}

impl Subscribers {
    pub fn add(&mut self, callback: EventCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sub, _)| *sub != id);
        self.callbacks.len() != before
    }

    pub fn emit(&mut self, event: &GridEvent) {
        for (_, callback) in &mut self.callbacks {
            callback(event);
        }
    }
}

/// Simple event collector for testing. Clones share the same buffer, so one
/// clone can be moved into a subscription while the test keeps the other.
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Rc<RefCell<Vec<GridEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that records into this collector.
    pub fn callback(&self) -> EventCallback {
        let events = Rc::clone(&self.events);
        Box::new(move |event| events.borrow_mut().push(event.clone()))
    }

    pub fn events(&self) -> Vec<GridEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Cells reported by every CellsChanged event, in order.
    pub fn changed_cells(&self) -> Vec<GridCell> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                GridEvent::CellsChanged(cells) => Some(cells.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn mutation_failures(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, GridEvent::MutationFailed { .. }))
            .count()
    }

    pub fn fetch_failures(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, GridEvent::FetchFailed { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_receive_until_removed() {
        let collector = EventCollector::new();
        let mut subs = Subscribers::default();
        let id = subs.add(collector.callback());

        subs.emit(&GridEvent::SelectionChanged);
        assert!(subs.remove(id));
        subs.emit(&GridEvent::SelectionChanged);

        assert_eq!(collector.len(), 1);
        assert!(!subs.remove(id));
    }

    #[test]
    fn test_event_collector_filtering() {
        let collector = EventCollector::new();
        let mut subs = Subscribers::default();
        subs.add(collector.callback());

        subs.emit(&GridEvent::CellsChanged(vec![GridCell::new("r1", "a")]));
        subs.emit(&GridEvent::MutationFailed {
            kind: MutationKind::SetCell,
            message: "offline".into(),
        });
        subs.emit(&GridEvent::CellsChanged(vec![GridCell::new("r2", "a")]));

        assert_eq!(collector.changed_cells().len(), 2);
        assert_eq!(collector.mutation_failures(), 1);
        assert_eq!(collector.fetch_failures(), 0);
    }
}
