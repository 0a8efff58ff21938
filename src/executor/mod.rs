//! The seam between query construction and whatever actually runs SQL.
//!
//! Nothing in this crate talks to a database directly. Callers supply a
//! [`SqlExecutor`] that runs a statement with bound parameters and hands rows
//! back, either all at once or through a forward-only [`RowCursor`].

mod dialect;
mod errors;

pub use dialect::Dialect;
pub use errors::ExecutorError;

use std::collections::VecDeque;

/// A result row: column name to value, in select-list order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Named parameters bound to a statement.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Forward-only, single-pass source of items.
pub trait RowCursor {
    type Item;

    /// Advance by one. `Ok(None)` means the source is exhausted.
    fn fetch_next(&mut self) -> Result<Option<Self::Item>, ExecutorError>;

    /// Total number of items, when the source can tell without being drained.
    fn count(&self) -> Option<usize> {
        None
    }
}

impl<C: RowCursor + ?Sized> RowCursor for Box<C> {
    type Item = C::Item;

    fn fetch_next(&mut self) -> Result<Option<Self::Item>, ExecutorError> {
        (**self).fetch_next()
    }

    fn count(&self) -> Option<usize> {
        (**self).count()
    }
}

/// In-memory cursor over already fetched items. Countable.
#[derive(Debug, Clone)]
pub struct VecCursor<T> {
    items: VecDeque<T>,
    total: usize,
}

impl<T> VecCursor<T> {
    pub fn new(items: Vec<T>) -> Self {
        let total = items.len();
        VecCursor {
            items: items.into(),
            total,
        }
    }
}

impl<T> RowCursor for VecCursor<T> {
    type Item = T;

    fn fetch_next(&mut self) -> Result<Option<T>, ExecutorError> {
        Ok(self.items.pop_front())
    }

    fn count(&self) -> Option<usize> {
        Some(self.total)
    }
}

/// External collaborator that executes SQL.
pub trait SqlExecutor {
    /// Dialect of the database behind this executor
    fn dialect(&self) -> Dialect;

    /// Run a statement and collect every row
    fn fetch_all(&self, sql: &str, params: &Parameters) -> Result<Vec<Row>, ExecutorError>;

    /// Run a statement and return a forward cursor over its rows.
    ///
    /// The default buffers through [`SqlExecutor::fetch_all`]; executors
    /// backed by a streaming driver should override it.
    fn open_cursor(
        &self,
        sql: &str,
        params: &Parameters,
    ) -> Result<Box<dyn RowCursor<Item = Row>>, ExecutorError> {
        let rows = self.fetch_all(sql, params)?;
        Ok(Box::new(VecCursor::new(rows)))
    }

    /// Rewrite `sql`, authored in `from`, into this executor's dialect.
    fn translate(&self, sql: &str, from: Dialect) -> Result<String, ExecutorError> {
        let _ = from;
        Ok(sql.to_string())
    }
}
