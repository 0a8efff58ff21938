use log::debug;
use serde_json::Value;
use std::cell::OnceCell;
use std::rc::Rc;
use std::sync::Arc;

use super::caching_iterator::CachingIterator;
use super::errors::ResultError;
use crate::eager_load::{PartialQuery, StorageNode};
use crate::executor::{Parameters, Row, RowCursor, SqlExecutor};
use crate::query_factory::{ColumnDescriptor, MagicJoin, QueryFactory};
use crate::schema_catalog::SchemaAnalyzer;

pub type RowIterator = CachingIterator<Box<dyn RowCursor<Item = Row>>>;

/// One materialization cycle over a compiled find request.
///
/// The row query runs on first access to [`ResultIterator::rows`]; the count
/// query runs on first [`ResultIterator::count`]. Related rows are reached
/// through [`ResultIterator::root_query`], whose loaders live on the storage
/// node handed in by the caller and are dropped with it.
pub struct ResultIterator<'s> {
    factory: Box<dyn QueryFactory>,
    executor: Arc<dyn SqlExecutor>,
    parameters: Rc<Parameters>,
    magic_join: MagicJoin,
    storage: &'s StorageNode,
    rows: Option<RowIterator>,
    count: OnceCell<usize>,
}

impl<'s> ResultIterator<'s> {
    pub fn new(
        factory: Box<dyn QueryFactory>,
        analyzer: Arc<SchemaAnalyzer>,
        executor: Arc<dyn SqlExecutor>,
        parameters: Parameters,
        storage: &'s StorageNode,
    ) -> Self {
        let magic_join = MagicJoin::new(analyzer, factory.dialect());
        ResultIterator {
            factory,
            executor,
            parameters: Rc::new(parameters),
            magic_join,
            storage,
            rows: None,
            count: OnceCell::new(),
        }
    }

    pub fn executor(&self) -> &Arc<dyn SqlExecutor> {
        &self.executor
    }

    pub fn column_descriptors(&self) -> Result<&[ColumnDescriptor], ResultError> {
        Ok(self.factory.column_descriptors()?)
    }

    /// `sql` with placeholders expanded, in the executor's dialect
    fn executable(&self, sql: &str) -> Result<String, ResultError> {
        let expanded = self.magic_join.expand(sql)?;
        let dialect = self.factory.dialect();
        if self.executor.dialect() == dialect {
            return Ok(expanded);
        }
        Ok(self.executor.translate(&expanded, dialect)?)
    }

    /// The rows, opening the cursor on first call.
    pub fn rows(&mut self) -> Result<&mut RowIterator, ResultError> {
        let rows = match self.rows.take() {
            Some(rows) => rows,
            None => {
                let sql = self.executable(self.factory.magic_sql()?)?;
                debug!("Opening result cursor: {}", sql);
                CachingIterator::new(self.executor.open_cursor(&sql, &self.parameters)?)
            }
        };
        Ok(self.rows.insert(rows))
    }

    /// Number of root objects matched, from the count query. Memoized.
    pub fn count(&self) -> Result<usize, ResultError> {
        if let Some(count) = self.count.get() {
            return Ok(*count);
        }
        let sql = self.executable(self.factory.magic_sql_count()?)?;
        let rows = self.executor.fetch_all(&sql, &self.parameters)?;
        let count = parse_count(&sql, rows.first())?;
        debug!("Count query returned {}: {}", count, sql);
        Ok(*self.count.get_or_init(|| count))
    }

    /// Root of the eager-load graph for this result.
    pub fn root_query(&self) -> Result<PartialQuery<'s>, ResultError> {
        let compiled = self.factory.compiled()?;
        let from_clause = self.magic_join.expand(&compiled.from_clause)?;
        Ok(PartialQuery::root(
            from_clause,
            Rc::clone(&self.parameters),
            &compiled.tables,
            self.storage,
            self.factory.dialect(),
        ))
    }
}

fn parse_count(sql: &str, row: Option<&Row>) -> Result<usize, ResultError> {
    let invalid = |message: &str| ResultError::InvalidCountResult {
        sql: sql.to_string(),
        message: message.to_string(),
    };
    let value = row
        .and_then(|row| row.values().next())
        .ok_or_else(|| invalid("no rows"))?;
    let count = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid(&format!("not a count: {}", value)))?;
    usize::try_from(count).map_err(|_| invalid("count does not fit in usize"))
}
