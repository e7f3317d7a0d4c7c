//! Contract with the persistence service.
//!
//! The engine never calls the store directly: it queues [`Mutation`]s and
//! fetch requests as effects, and [`GridSession`](crate::session::GridSession)
//! runs them against a [`RowStore`]. Futures are `!Send`; everything runs on
//! the UI thread.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use gridbase_core::{Column, ColumnId, Row, RowId, TableId};

pub type StoreFuture<T> = Pin<Box<dyn Future<Output = Result<T, StoreError>>>>;

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Transport failure (offline, timeout, connection reset)
    Network(String),
    /// The addressed table/row/column does not exist
    NotFound(String),
    /// The service refused the request
    Rejected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Network(msg) => write!(f, "Network error: {}", msg),
            StoreError::NotFound(what) => write!(f, "Not found: {}", what),
            StoreError::Rejected(msg) => write!(f, "Rejected: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// One range-paged read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPage {
    pub items: Vec<Row>,
}

/// Range-paged reads plus fire-and-confirm mutations.
pub trait RowStore {
    fn list_columns(&self, table: &TableId) -> StoreFuture<Vec<Column>>;
    fn count_rows(&self, table: &TableId) -> StoreFuture<usize>;
    fn fetch_rows(&self, table: &TableId, offset: usize, limit: usize) -> StoreFuture<RowPage>;
    fn mutate_cell(&self, row_id: &RowId, column_id: &ColumnId, value: Option<String>) -> StoreFuture<()>;
    fn add_row(&self, table: &TableId, row: Row) -> StoreFuture<()>;
    fn delete_row(&self, row_id: &RowId) -> StoreFuture<()>;
    fn add_column(&self, table: &TableId, column: Column) -> StoreFuture<()>;
    fn delete_column(&self, column_id: &ColumnId) -> StoreFuture<()>;
    fn rename_column(&self, column_id: &ColumnId, name: &str) -> StoreFuture<()>;
}

/// Identifies one in-flight mutation so its completion can be matched up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetCell {
        row_id: RowId,
        column_id: ColumnId,
        value: Option<String>,
    },
    AddRow {
        row: Row,
    },
    DeleteRow {
        row_id: RowId,
    },
    AddColumn {
        column: Column,
    },
    DeleteColumn {
        column_id: ColumnId,
    },
    RenameColumn {
        column_id: ColumnId,
        name: String,
    },
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::SetCell { .. } => MutationKind::SetCell,
            Mutation::AddRow { .. } => MutationKind::AddRow,
            Mutation::DeleteRow { .. } => MutationKind::DeleteRow,
            Mutation::AddColumn { .. } => MutationKind::AddColumn,
            Mutation::DeleteColumn { .. } => MutationKind::DeleteColumn,
            Mutation::RenameColumn { .. } => MutationKind::RenameColumn,
        }
    }

    /// Run this mutation against a store.
    pub fn send<S: RowStore + ?Sized>(&self, store: &S, table: &TableId) -> StoreFuture<()> {
        match self {
            Mutation::SetCell { row_id, column_id, value } => store.mutate_cell(row_id, column_id, value.clone()),
            Mutation::AddRow { row } => store.add_row(table, row.clone()),
            Mutation::DeleteRow { row_id } => store.delete_row(row_id),
            Mutation::AddColumn { column } => store.add_column(table, column.clone()),
            Mutation::DeleteColumn { column_id } => store.delete_column(column_id),
            Mutation::RenameColumn { column_id, name } => store.rename_column(column_id, name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    SetCell,
    AddRow,
    DeleteRow,
    AddColumn,
    DeleteColumn,
    RenameColumn,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::SetCell => "set cell",
            MutationKind::AddRow => "add row",
            MutationKind::DeleteRow => "delete row",
            MutationKind::AddColumn => "add column",
            MutationKind::DeleteColumn => "delete column",
            MutationKind::RenameColumn => "rename column",
        };
        f.write_str(name)
    }
}
