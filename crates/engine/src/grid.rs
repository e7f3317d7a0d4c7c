//! The grid engine: a synchronous state machine over one table.
//!
//! Network work never happens here. Operations push [`Effect`]s into an
//! outbox that the driver drains with [`GridEngine::take_effects`]; results
//! come back through `complete_fetch` and `complete_mutation`.
//!
//! Reads go through two layers: the pending-edit overlay first, then the
//! authoritative rows held by the window manager.
//!
//! Behavior is split across modules the same way the operations group:
//! navigation, fill, editing, clipboard, undo/redo, viewport, sync,
//! structure and input each add an `impl GridEngine` block.

use std::time::Instant;

use gridbase_config::GridSettings;
use gridbase_core::{CellRange, Column, ColumnId, CoordinateMaps, FillPreview, GridCell, Row, RowId, SelectionRange, TableId};
use rustc_hash::FxHashMap;

use crate::clock::{Clock, RealClock};
use crate::edit::{EditBuffer, EditSession};
use crate::events::{EventCallback, GridEvent, SubscriptionId, Subscribers};
use crate::history::{History, HistoryChange};
use crate::overlay::PendingEdits;
use crate::queue::{PendingWrite, UpdateQueue};
use crate::state::{GridState, StateChanges};
use crate::store::{Mutation, MutationId};
use crate::window::{FetchRequest, WindowConfig, WindowManager};

/// Work the driver must perform on the engine's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(FetchRequest),
    Mutate { id: MutationId, mutation: Mutation },
    WriteClipboard(String),
    ReadClipboard,
}

/// Local state needed to reconcile a mutation once the store answers.
#[derive(Debug, Clone)]
pub(crate) enum InFlight {
    Cell {
        cell: GridCell,
        seq: u64,
        value: Option<String>,
    },
    AddRow {
        row_id: RowId,
        index: usize,
    },
    DeleteRow {
        index: Option<usize>,
        row: Row,
    },
    AddColumn {
        column_id: ColumnId,
    },
    DeleteColumn {
        index: usize,
        column: Column,
        values: Vec<(RowId, Option<String>)>,
    },
    RenameColumn {
        column_id: ColumnId,
        previous: String,
    },
}

/// Pointer drag in progress.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Drag {
    Range,
    Fill { origin: GridCell },
}

/// A loaded row as displayed: local edits override stored values.
pub struct RowView<'a> {
    pub index: usize,
    row: &'a Row,
    overlay: &'a PendingEdits,
}

impl<'a> RowView<'a> {
    pub fn id(&self) -> &'a RowId {
        &self.row.id
    }

    pub fn value(&self, column_id: &ColumnId) -> Option<&'a str> {
        let cell = GridCell {
            row_id: self.row.id.clone(),
            column_id: column_id.clone(),
        };
        match self.overlay.get(&cell) {
            Some(local) => local,
            None => self.row.value(column_id),
        }
    }
}

pub struct GridEngine {
    pub(crate) table: TableId,
    pub(crate) columns: Vec<Column>,
    pub(crate) windows: WindowManager,
    pub(crate) overlay: PendingEdits,
    pub(crate) maps: CoordinateMaps,
    pub(crate) state: GridState,
    pub(crate) history: History,
    pub(crate) queue: UpdateQueue,
    pub(crate) settings: GridSettings,
    pub(crate) edit: Option<EditSession>,
    pub(crate) drag: Option<Drag>,
    pub(crate) in_flight: FxHashMap<MutationId, InFlight>,
    subscribers: Subscribers,
    effects: Vec<Effect>,
    clock: Box<dyn Clock>,
    next_seq: u64,
    next_mutation: u64,
    /// Cells written during the current gesture.
    touched: Vec<GridCell>,
}

impl GridEngine {
    pub fn new(table: TableId, settings: GridSettings) -> Self {
        Self::with_clock(table, settings, Box::new(RealClock))
    }

    pub fn with_clock(table: TableId, settings: GridSettings, clock: Box<dyn Clock>) -> Self {
        let settings = settings.sanitized();
        let windows = WindowManager::new(WindowConfig {
            buffer_rows: settings.buffer_rows,
            chunk_size: settings.chunk_size,
            max_windows: settings.max_windows,
        });
        Self {
            table,
            columns: Vec::new(),
            windows,
            overlay: PendingEdits::default(),
            maps: CoordinateMaps::default(),
            state: GridState::default(),
            history: History::new(settings.max_history_steps),
            queue: UpdateQueue::new(settings.debounce()),
            settings,
            edit: None,
            drag: None,
            in_flight: FxHashMap::default(),
            subscribers: Subscribers::default(),
            effects: Vec::new(),
            clock,
            next_seq: 0,
            next_mutation: 0,
            touched: Vec::new(),
        }
    }

    /// Install the table's columns, row count and primary rows.
    pub fn load(&mut self, mut columns: Vec<Column>, total_rows: usize, primary: Vec<Row>) {
        gridbase_core::model::sort_columns(&mut columns);
        self.columns = columns;
        self.windows.set_primary(primary, total_rows);
        self.rebuild_maps();
        self.emit(GridEvent::StructureChanged);
    }

    pub fn table(&self) -> &TableId {
        &self.table
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn maps(&self) -> &CoordinateMaps {
        &self.maps
    }

    pub fn row_count(&self) -> usize {
        self.maps.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.maps.column_count()
    }

    // Read models

    pub fn active_cell(&self) -> Option<&GridCell> {
        self.state.active_cell()
    }

    pub fn selection(&self) -> Option<&SelectionRange> {
        self.state.selection()
    }

    pub fn editing_cell(&self) -> Option<&GridCell> {
        self.state.editing_cell()
    }

    pub fn fill_preview(&self) -> Option<&FillPreview> {
        self.state.fill_preview()
    }

    pub fn edit_buffer(&self) -> Option<&EditBuffer> {
        self.edit.as_ref().map(|s| &s.buffer)
    }

    pub fn edit_buffer_mut(&mut self) -> Option<&mut EditBuffer> {
        self.edit.as_mut().map(|s| &mut s.buffer)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Index rectangle the next copy/clear/paste acts on: the selection,
    /// else the active cell.
    pub fn selection_bounds(&self) -> Option<CellRange> {
        if let Some(rect) = self.state.selection().and_then(|s| self.maps.rect(s)) {
            return Some(rect);
        }
        let (row, col) = self.maps.resolve(self.state.active_cell()?)?;
        Some(CellRange::single(row, col))
    }

    /// Displayed value of a cell. Local edits win over stored data.
    pub fn cell_value(&self, cell: &GridCell) -> Option<&str> {
        if let Some(local) = self.overlay.get(cell) {
            return local;
        }
        self.stored_value(cell)
    }

    pub(crate) fn stored_value(&self, cell: &GridCell) -> Option<&str> {
        let index = self.maps.row_index(&cell.row_id)?;
        self.windows.row_at(index)?.value(&cell.column_id)
    }

    /// Displayed value at `(row, col)` indices.
    pub fn value_at(&self, row: usize, col: usize) -> Option<&str> {
        let cell = self.maps.cell_at(row, col)?;
        self.cell_value(&cell)
    }

    pub fn row_at_index(&self, index: usize) -> Option<RowView<'_>> {
        let row = self.windows.row_at(index)?;
        Some(RowView {
            index,
            row,
            overlay: &self.overlay,
        })
    }

    // Subscribers

    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriptionId {
        self.subscribers.add(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    pub(crate) fn emit(&mut self, event: GridEvent) {
        self.subscribers.emit(&event);
    }

    pub(crate) fn emit_state(&mut self, changes: StateChanges) {
        if changes.active {
            let active = self.state.active_cell().cloned();
            self.emit(GridEvent::ActiveCellChanged(active));
        }
        if changes.selection {
            self.emit(GridEvent::SelectionChanged);
        }
        if changes.editing {
            let editing = self.state.editing_cell().cloned();
            self.emit(GridEvent::EditingChanged(editing));
        }
        if changes.fill {
            self.emit(GridEvent::FillPreviewChanged);
        }
    }

    /// Make `cell` the active cell with a single-cell selection.
    pub(crate) fn focus_cell(&mut self, cell: GridCell) {
        let changes = self
            .state
            .set_active_cell(Some(cell.clone()))
            .merge(self.state.set_selection(Some(SelectionRange::single(cell))));
        self.emit_state(changes);
    }

    // Outbox

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    pub(crate) fn push_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub(crate) fn send_mutation(&mut self, mutation: Mutation, flight: InFlight) -> MutationId {
        self.next_mutation += 1;
        let id = MutationId(self.next_mutation);
        self.in_flight.insert(id, flight);
        self.effects.push(Effect::Mutate { id, mutation });
        id
    }

    /// Mutations sent but not yet confirmed or rejected.
    pub fn pending_mutations(&self) -> usize {
        self.in_flight.len()
    }

    // Write path

    /// Optimistically show `value` and queue it for the store. Records no
    /// history; callers group their changes into one step themselves.
    pub(crate) fn write_cell(&mut self, cell: GridCell, value: Option<String>) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.overlay.set(cell.clone(), value.clone(), seq);
        self.queue.queue(cell.clone(), value, seq, self.clock.now());
        self.touched.push(cell);
    }

    /// Record a gesture's changes as one history step.
    pub(crate) fn record(&mut self, changes: Vec<HistoryChange>) {
        if self.history.push_changes(changes) {
            self.emit_history();
        }
    }

    pub(crate) fn emit_history(&mut self) {
        self.emit(GridEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    /// Finish a gesture: flush (when configured) and report touched cells.
    pub(crate) fn end_gesture(&mut self) {
        if self.settings.flush_on_commit {
            self.flush();
        }
        if !self.touched.is_empty() {
            let cells = std::mem::take(&mut self.touched);
            self.emit(GridEvent::CellsChanged(cells));
        }
    }

    /// Send every queued write now.
    pub fn flush(&mut self) {
        let writes = self.queue.flush();
        self.send_writes(writes);
    }

    /// Send queued writes whose debounce deadline has passed.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.release_due(now);
    }

    /// Send queued writes due at or before `at`.
    pub fn release_due(&mut self, at: Instant) {
        let writes = self.queue.take_due(at);
        self.send_writes(writes);
    }

    pub fn next_flush_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.queue.is_empty()
    }

    fn send_writes(&mut self, writes: Vec<PendingWrite>) {
        if writes.is_empty() {
            return;
        }
        log::debug!("flushing {} cell write(s)", writes.len());
        for write in writes {
            let mutation = Mutation::SetCell {
                row_id: write.cell.row_id.clone(),
                column_id: write.cell.column_id.clone(),
                value: write.value.clone(),
            };
            self.send_mutation(
                mutation,
                InFlight::Cell {
                    cell: write.cell,
                    seq: write.seq,
                    value: write.value,
                },
            );
        }
    }

    /// Rebuild coordinate maps from the current rows and columns and drop
    /// any transient state that no longer resolves.
    pub(crate) fn rebuild_maps(&mut self) {
        self.maps = CoordinateMaps::build(self.windows.known_rows(), self.windows.total(), &self.columns);
        if self.edit.as_ref().is_some_and(|s| !self.maps.is_resolvable(&s.cell)) {
            self.edit = None;
        }
        let changes = self.state.retain_resolvable(&self.maps);
        self.emit_state(changes);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use gridbase_core::ColumnType;

    /// Three columns (`a` text, `b` text, `n` number) and `rows` loaded rows.
    pub(crate) fn engine_with(rows: usize, settings: GridSettings) -> (GridEngine, ManualClock) {
        let clock = ManualClock::new();
        let mut engine = GridEngine::with_clock(TableId::from("t"), settings, Box::new(clock.clone()));
        let columns = vec![
            Column::new("a", "A", ColumnType::Text, 0),
            Column::new("b", "B", ColumnType::Text, 1),
            Column::new("n", "N", ColumnType::Number, 2),
        ];
        let primary = (0..rows).map(|i| Row::new(format!("r{i}"), i)).collect();
        engine.load(columns, rows, primary);
        (engine, clock)
    }

    pub(crate) fn engine(rows: usize) -> GridEngine {
        engine_with(rows, GridSettings::default()).0
    }

    pub(crate) fn cell(row: usize, col: &str) -> GridCell {
        GridCell::new(format!("r{row}"), col)
    }

    #[test]
    fn test_load_sorts_columns_and_builds_maps() {
        let mut engine = GridEngine::new(TableId::from("t"), GridSettings::default());
        engine.load(
            vec![
                Column::new("z", "Z", ColumnType::Text, 1),
                Column::new("y", "Y", ColumnType::Text, 0),
            ],
            2,
            vec![Row::new("r0", 0), Row::new("r1", 1)],
        );
        assert_eq!(engine.columns()[0].id, ColumnId::from("y"));
        assert_eq!(engine.row_count(), 2);
        assert_eq!(engine.maps().cell_at(1, 1), Some(GridCell::new("r1", "z")));
    }

    #[test]
    fn test_write_overlays_stored_value() {
        let mut engine = engine(3);
        engine.write_cell(cell(1, "a"), Some("x".into()));
        assert_eq!(engine.cell_value(&cell(1, "a")), Some("x"));
        assert_eq!(engine.row_at_index(1).unwrap().value(&ColumnId::from("a")), Some("x"));
        assert_eq!(engine.stored_value(&cell(1, "a")), None);
    }

    #[test]
    fn test_end_gesture_flushes_writes() {
        let mut engine = engine(3);
        engine.write_cell(cell(0, "a"), Some("1".into()));
        engine.write_cell(cell(1, "a"), Some("2".into()));
        engine.end_gesture();
        let effects = engine.take_effects();
        assert_eq!(effects.len(), 2);
        assert!(matches!(&effects[0], Effect::Mutate { mutation: Mutation::SetCell { value, .. }, .. } if value.as_deref() == Some("1")));
        assert_eq!(engine.pending_mutations(), 2);
    }

    #[test]
    fn test_debounced_writes_wait_for_deadline() {
        let settings = GridSettings {
            flush_on_commit: false,
            ..GridSettings::default()
        };
        let (mut engine, clock) = engine_with(3, settings);
        engine.write_cell(cell(0, "a"), Some("1".into()));
        engine.end_gesture();
        assert!(engine.take_effects().is_empty());
        assert!(engine.next_flush_deadline().is_some());

        clock.advance(std::time::Duration::from_millis(249));
        engine.tick();
        assert!(engine.take_effects().is_empty());

        clock.advance(std::time::Duration::from_millis(1));
        engine.tick();
        assert_eq!(engine.take_effects().len(), 1);
        assert!(!engine.has_pending_writes());
    }
}
