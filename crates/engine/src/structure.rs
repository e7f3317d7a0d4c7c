//! Row and column mutations.
//!
//! Each applies locally first, then goes to the store. The row windows are
//! invalidated and refetched; a failure restores the snapshot taken here.

use gridbase_core::{Column, ColumnId, ColumnType, Row, RowId};

use crate::events::GridEvent;
use crate::grid::{GridEngine, InFlight};
use crate::store::Mutation;

impl GridEngine {
    /// Rebuild maps after a row or column change and refetch the viewport.
    pub(crate) fn restructure(&mut self) {
        self.rebuild_maps();
        self.emit(GridEvent::StructureChanged);
        self.refresh_viewport();
    }

    /// Append an empty row. Its id is generated locally so the optimistic
    /// copy and the stored row agree.
    pub fn add_row(&mut self) -> RowId {
        let row_id = RowId::generate();
        let index = self.windows.total();
        let row = Row::new(row_id.clone(), index);
        self.windows.push_row(row.clone());
        self.restructure();
        log::info!("adding row {}", row_id);
        self.send_mutation(
            Mutation::AddRow { row },
            InFlight::AddRow {
                row_id: row_id.clone(),
                index,
            },
        );
        row_id
    }

    /// Delete a loaded row. Its queued writes and local edits are dropped.
    pub fn delete_row(&mut self, row_id: &RowId) -> bool {
        let Some(row) = self.windows.find_row(row_id).map(|(_, r)| r.clone()) else {
            return false;
        };
        self.queue.cancel_row(row_id);
        self.overlay.drop_row(row_id);
        let index = self.windows.remove_row(row_id);
        self.restructure();
        log::info!("deleting row {}", row_id);
        self.send_mutation(Mutation::DeleteRow { row_id: row_id.clone() }, InFlight::DeleteRow { index, row });
        true
    }

    /// Append a column at the end of the display order.
    pub fn add_column(&mut self, name: &str, column_type: ColumnType) -> ColumnId {
        let column_id = ColumnId::generate();
        let position = self.columns.iter().map(|c| c.position + 1).max().unwrap_or(0);
        let column = Column::new(column_id.clone(), name, column_type, position);
        self.columns.push(column.clone());
        self.restructure();
        log::info!("adding column {} ({})", name, column_id);
        self.send_mutation(
            Mutation::AddColumn { column },
            InFlight::AddColumn {
                column_id: column_id.clone(),
            },
        );
        column_id
    }

    pub fn delete_column(&mut self, column_id: &ColumnId) -> bool {
        let Some(index) = self.columns.iter().position(|c| &c.id == column_id) else {
            return false;
        };
        let values: Vec<(RowId, Option<String>)> = self
            .windows
            .loaded_rows()
            .map(|r| (r.id.clone(), r.value(column_id).map(str::to_string)))
            .filter(|(_, v)| v.is_some())
            .collect();
        self.queue.cancel_column(column_id);
        self.overlay.drop_column(column_id);
        let column = self.columns.remove(index);
        self.windows.remove_column(column_id);
        self.restructure();
        log::info!("deleting column {}", column_id);
        self.send_mutation(
            Mutation::DeleteColumn {
                column_id: column_id.clone(),
            },
            InFlight::DeleteColumn { index, column, values },
        );
        true
    }

    pub fn rename_column(&mut self, column_id: &ColumnId, name: &str) -> bool {
        let Some(column) = self.columns.iter_mut().find(|c| &c.id == column_id) else {
            return false;
        };
        if column.name == name {
            return false;
        }
        let previous = std::mem::replace(&mut column.name, name.to_string());
        self.restructure();
        log::info!("renaming column {} to {}", column_id, name);
        self.send_mutation(
            Mutation::RenameColumn {
                column_id: column_id.clone(),
                name: name.to_string(),
            },
            InFlight::RenameColumn {
                column_id: column_id.clone(),
                previous,
            },
        );
        true
    }
}
