//! Table data as the grid sees it: columns, rows and cells.
//!
//! Cell values are always strings (or null). Numeric typing is a property
//! of the column and is only enforced when an edit is normalized.

use serde::{Deserialize, Serialize};

use crate::ids::{ColumnId, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Display order (ascending).
    pub position: usize,
}

impl Column {
    pub fn new(id: impl Into<ColumnId>, name: impl Into<String>, column_type: ColumnType, position: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column_type,
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row_id: RowId,
    pub column_id: ColumnId,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub position: usize,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(id: impl Into<RowId>, position: usize) -> Self {
        Self {
            id: id.into(),
            position,
            cells: Vec::new(),
        }
    }

    /// Builder used by stores and tests.
    pub fn with_value(mut self, column_id: impl Into<ColumnId>, value: Option<&str>) -> Self {
        let column_id = column_id.into();
        self.set_value(&column_id, value.map(str::to_string));
        self
    }

    /// Value of the cell in `column_id`. Missing cells read as null.
    pub fn value(&self, column_id: &ColumnId) -> Option<&str> {
        self.cells
            .iter()
            .find(|c| &c.column_id == column_id)
            .and_then(|c| c.value.as_deref())
    }

    /// Overwrite (or create) the cell in `column_id`.
    pub fn set_value(&mut self, column_id: &ColumnId, value: Option<String>) {
        if let Some(cell) = self.cells.iter_mut().find(|c| &c.column_id == column_id) {
            cell.value = value;
        } else {
            self.cells.push(Cell {
                row_id: self.id.clone(),
                column_id: column_id.clone(),
                value,
            });
        }
    }

    /// Drop the cell for a deleted column.
    pub fn remove_column(&mut self, column_id: &ColumnId) {
        self.cells.retain(|c| &c.column_id != column_id);
    }
}

/// Sort columns into display order.
pub fn sort_columns(columns: &mut [Column]) {
    columns.sort_by_key(|c| c.position);
}
