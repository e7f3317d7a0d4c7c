//! In-memory [`RowStore`] holding a single table.
//!
//! Used by the headless CLI and by tests. Every call resolves immediately;
//! failures can be injected per operation family to exercise rollback.

use std::cell::RefCell;
use std::rc::Rc;

use gridbase_core::{Column, ColumnId, Row, RowId, TableId};

use crate::store::{RowPage, RowStore, StoreError, StoreFuture};

#[derive(Debug, Default)]
struct Inner {
    table: TableId,
    columns: Vec<Column>,
    rows: Vec<Row>,
    fail_fetches: bool,
    fail_mutations: bool,
    fetch_log: Vec<(usize, usize)>,
    mutation_count: usize,
}

/// Cheap to clone; clones share the same table.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

fn ready<T: 'static>(result: Result<T, StoreError>) -> StoreFuture<T> {
    Box::pin(std::future::ready(result))
}

impl MemoryStore {
    pub fn new(table: TableId, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                table,
                columns,
                rows,
                ..Inner::default()
            })),
        }
    }

    /// `count` rows with ids `row0..` and no values.
    pub fn with_blank_rows(table: TableId, columns: Vec<Column>, count: usize) -> Self {
        let rows = (0..count).map(|i| Row::new(format!("row{i}"), i)).collect();
        Self::new(table, columns, rows)
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.inner.borrow_mut().fail_fetches = fail;
    }

    pub fn fail_mutations(&self, fail: bool) {
        self.inner.borrow_mut().fail_mutations = fail;
    }

    /// `(offset, limit)` of every `fetch_rows` call so far.
    pub fn fetch_log(&self) -> Vec<(usize, usize)> {
        self.inner.borrow().fetch_log.clone()
    }

    /// Number of mutations the store accepted.
    pub fn mutation_count(&self) -> usize {
        self.inner.borrow().mutation_count
    }

    pub fn rows(&self) -> Vec<Row> {
        self.inner.borrow().rows.clone()
    }

    pub fn columns(&self) -> Vec<Column> {
        self.inner.borrow().columns.clone()
    }

    pub fn value(&self, row_id: &RowId, column_id: &ColumnId) -> Option<String> {
        let inner = self.inner.borrow();
        inner
            .rows
            .iter()
            .find(|r| &r.id == row_id)
            .and_then(|r| r.value(column_id).map(str::to_string))
    }

    fn check_table(inner: &Inner, table: &TableId) -> Result<(), StoreError> {
        if &inner.table == table {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("table {}", table)))
        }
    }

    /// Shared guard for every mutation: injected failure, then the body.
    fn mutate(&self, body: impl FnOnce(&mut Inner) -> Result<(), StoreError>) -> StoreFuture<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_mutations {
            return ready(Err(StoreError::Rejected("mutation rejected".into())));
        }
        let result = body(&mut inner);
        if result.is_ok() {
            inner.mutation_count += 1;
        }
        ready(result)
    }
}

impl RowStore for MemoryStore {
    fn list_columns(&self, table: &TableId) -> StoreFuture<Vec<Column>> {
        let inner = self.inner.borrow();
        ready(Self::check_table(&inner, table).map(|_| inner.columns.clone()))
    }

    fn count_rows(&self, table: &TableId) -> StoreFuture<usize> {
        let inner = self.inner.borrow();
        ready(Self::check_table(&inner, table).map(|_| inner.rows.len()))
    }

    fn fetch_rows(&self, table: &TableId, offset: usize, limit: usize) -> StoreFuture<RowPage> {
        let mut inner = self.inner.borrow_mut();
        inner.fetch_log.push((offset, limit));
        if inner.fail_fetches {
            return ready(Err(StoreError::Network("fetch failed".into())));
        }
        if let Err(e) = Self::check_table(&inner, table) {
            return ready(Err(e));
        }
        let items = inner
            .rows
            .iter()
            .skip(offset)
            .take(limit)
            .enumerate()
            .map(|(i, row)| {
                let mut row = row.clone();
                row.position = offset + i;
                row
            })
            .collect();
        ready(Ok(RowPage { items }))
    }

    fn mutate_cell(&self, row_id: &RowId, column_id: &ColumnId, value: Option<String>) -> StoreFuture<()> {
        self.mutate(|inner| {
            if !inner.columns.iter().any(|c| &c.id == column_id) {
                return Err(StoreError::NotFound(format!("column {}", column_id)));
            }
            let row = inner
                .rows
                .iter_mut()
                .find(|r| &r.id == row_id)
                .ok_or_else(|| StoreError::NotFound(format!("row {}", row_id)))?;
            row.set_value(column_id, value);
            Ok(())
        })
    }

    fn add_row(&self, table: &TableId, row: Row) -> StoreFuture<()> {
        self.mutate(|inner| {
            Self::check_table(inner, table)?;
            inner.rows.push(row);
            Ok(())
        })
    }

    fn delete_row(&self, row_id: &RowId) -> StoreFuture<()> {
        self.mutate(|inner| {
            let before = inner.rows.len();
            inner.rows.retain(|r| &r.id != row_id);
            if inner.rows.len() == before {
                return Err(StoreError::NotFound(format!("row {}", row_id)));
            }
            Ok(())
        })
    }

    fn add_column(&self, table: &TableId, column: Column) -> StoreFuture<()> {
        self.mutate(|inner| {
            Self::check_table(inner, table)?;
            inner.columns.push(column);
            Ok(())
        })
    }

    fn delete_column(&self, column_id: &ColumnId) -> StoreFuture<()> {
        self.mutate(|inner| {
            let before = inner.columns.len();
            inner.columns.retain(|c| &c.id != column_id);
            if inner.columns.len() == before {
                return Err(StoreError::NotFound(format!("column {}", column_id)));
            }
            for row in &mut inner.rows {
                row.remove_column(column_id);
            }
            Ok(())
        })
    }

    fn rename_column(&self, column_id: &ColumnId, name: &str) -> StoreFuture<()> {
        self.mutate(|inner| {
            let column = inner
                .columns
                .iter_mut()
                .find(|c| &c.id == column_id)
                .ok_or_else(|| StoreError::NotFound(format!("column {}", column_id)))?;
            column.name = name.to_string();
            Ok(())
        })
    }
}
