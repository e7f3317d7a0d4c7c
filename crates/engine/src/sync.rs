//! Reconciling optimistic changes with the store's answer.
//!
//! Success promotes a cell value into the authoritative rows. Failure rolls
//! back to the last known-good state: the overlay entry is dropped unless a
//! newer write replaced it, and structural snapshots are restored. History
//! is never touched.

use crate::events::GridEvent;
use crate::grid::{GridEngine, InFlight};
use crate::store::{MutationId, MutationKind, StoreError};

impl GridEngine {
    pub fn complete_mutation(&mut self, id: MutationId, result: Result<(), StoreError>) {
        let Some(flight) = self.in_flight.remove(&id) else {
            return;
        };
        match result {
            Ok(()) => self.confirm(flight),
            Err(error) => self.roll_back(flight, error),
        }
    }

    fn confirm(&mut self, flight: InFlight) {
        match flight {
            InFlight::Cell { cell, seq, value } => {
                if let Some(row) = self.windows.row_mut(&cell.row_id) {
                    row.set_value(&cell.column_id, value);
                }
                self.overlay.settle(&cell, seq);
            }
            InFlight::AddRow { row_id, index } => {
                log::info!("row {} added", row_id);
                // A fetch issued before the insert landed may have cut the
                // row space short of the new row.
                if self.windows.total() <= index {
                    self.windows.set_total(index + 1);
                }
                self.reload_windows();
            }
            InFlight::DeleteRow { row, .. } => {
                log::info!("row {} deleted", row.id);
                self.reload_windows();
            }
            InFlight::AddColumn { column_id } => {
                log::info!("column {} added", column_id);
                self.reload_windows();
            }
            InFlight::DeleteColumn { column, .. } => {
                log::info!("column {} deleted", column.id);
                self.reload_windows();
            }
            InFlight::RenameColumn { column_id, .. } => log::info!("column {} renamed", column_id),
        }
    }

    /// Windows fetched while a structural change was in flight may predate
    /// it. Drop them and fetch the viewport again.
    fn reload_windows(&mut self) {
        self.windows.invalidate();
        self.restructure();
    }

    fn roll_back(&mut self, flight: InFlight, error: StoreError) {
        let kind = match &flight {
            InFlight::Cell { .. } => MutationKind::SetCell,
            InFlight::AddRow { .. } => MutationKind::AddRow,
            InFlight::DeleteRow { .. } => MutationKind::DeleteRow,
            InFlight::AddColumn { .. } => MutationKind::AddColumn,
            InFlight::DeleteColumn { .. } => MutationKind::DeleteColumn,
            InFlight::RenameColumn { .. } => MutationKind::RenameColumn,
        };
        log::warn!("{} failed: {}", kind, error);

        match flight {
            InFlight::Cell { cell, seq, .. } => {
                if self.overlay.settle(&cell, seq) {
                    self.emit(GridEvent::CellsChanged(vec![cell]));
                }
            }
            InFlight::AddRow { row_id, .. } => {
                self.windows.remove_row(&row_id);
                self.restructure();
            }
            InFlight::DeleteRow { index, row } => {
                match index {
                    Some(index) => self.windows.insert_row(index, row),
                    None => {
                        let total = self.windows.total() + 1;
                        self.windows.set_total(total);
                    }
                }
                self.restructure();
            }
            InFlight::AddColumn { column_id } => {
                self.columns.retain(|c| c.id != column_id);
                self.restructure();
            }
            InFlight::DeleteColumn { index, column, values } => {
                let column_id = column.id.clone();
                let index = index.min(self.columns.len());
                self.columns.insert(index, column);
                for (row_id, value) in values {
                    if let Some(row) = self.windows.row_mut(&row_id) {
                        row.set_value(&column_id, value);
                    }
                }
                self.restructure();
            }
            InFlight::RenameColumn { column_id, previous } => {
                if let Some(column) = self.columns.iter_mut().find(|c| c.id == column_id) {
                    column.name = previous;
                }
                self.restructure();
            }
        }

        self.emit(GridEvent::MutationFailed {
            kind,
            message: error.to_string(),
        });
    }
}
