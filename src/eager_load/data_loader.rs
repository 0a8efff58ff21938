//! Batch-and-cache units.
//!
//! A data loader owns one un-executed query. The first lookup runs it, indexes
//! every returned row in memory, and every later lookup is served from that
//! index. A failed execution leaves the loader unloaded so a later call can
//! try again.

use log::{debug, warn};
use serde_json::Value;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use super::errors::EagerLoadError;
use crate::executor::{Parameters, Row, SqlExecutor};

/// Canonical map key for an identifier value.
///
/// Strings are used as-is and every other value by its JSON text, so `1` and
/// `"1"` address the same row: drivers commonly return keys as text.
pub fn identifier_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct BatchQuery {
    executor: Arc<dyn SqlExecutor>,
    sql: String,
    parameters: Rc<Parameters>,
}

impl BatchQuery {
    fn run(&self) -> Result<Vec<Row>, EagerLoadError> {
        debug!("Running batch query: {}", self.sql);
        Ok(self.executor.fetch_all(&self.sql, &self.parameters)?)
    }

    fn key_of(&self, row: &Row, column: &str) -> Result<String, EagerLoadError> {
        row.get(column)
            .map(identifier_key)
            .ok_or_else(|| EagerLoadError::MissingIdentifierColumn {
                column: column.to_string(),
                sql: self.sql.clone(),
            })
    }

    fn parameters_json(&self) -> String {
        serde_json::to_string(self.parameters.as_ref()).unwrap_or_default()
    }
}

/// Serves rows reached through a many-to-one relation, by primary key.
pub struct ManyToOneDataLoader {
    query: BatchQuery,
    id_column: String,
    data: OnceCell<HashMap<String, Row>>,
}

impl ManyToOneDataLoader {
    pub fn new(
        executor: Arc<dyn SqlExecutor>,
        sql: impl Into<String>,
        id_column: impl Into<String>,
        parameters: Rc<Parameters>,
    ) -> Self {
        ManyToOneDataLoader {
            query: BatchQuery {
                executor,
                sql: sql.into(),
                parameters,
            },
            id_column: id_column.into(),
            data: OnceCell::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.query.sql
    }

    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some()
    }

    fn load(&self) -> Result<&HashMap<String, Row>, EagerLoadError> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }
        let rows = self.query.run()?;
        let mut data = HashMap::with_capacity(rows.len());
        for row in rows {
            let key = self.query.key_of(&row, &self.id_column)?;
            if data.insert(key.clone(), row).is_some() {
                warn!(
                    "Duplicate identifier '{}' in many-to-one batch, keeping the last row: {}",
                    key, self.query.sql
                );
            }
        }
        Ok(self.data.get_or_init(|| data))
    }

    /// The row whose identifier column equals `id`.
    ///
    /// A missing row is a consistency failure: the foreign key that led here
    /// guaranteed it exists.
    pub fn get(&self, id: &Value) -> Result<&Row, EagerLoadError> {
        let key = identifier_key(id);
        self.load()?
            .get(&key)
            .ok_or_else(|| EagerLoadError::MissingBatchEntry {
                id: key.clone(),
                sql: self.query.sql.clone(),
                parameters: self.query.parameters_json(),
            })
    }
}

/// Serves rows reached through a one-to-many relation, grouped by foreign key.
pub struct OneToManyDataLoader {
    query: BatchQuery,
    fk_column: String,
    data: OnceCell<HashMap<String, Vec<Row>>>,
}

impl OneToManyDataLoader {
    pub fn new(
        executor: Arc<dyn SqlExecutor>,
        sql: impl Into<String>,
        fk_column: impl Into<String>,
        parameters: Rc<Parameters>,
    ) -> Self {
        OneToManyDataLoader {
            query: BatchQuery {
                executor,
                sql: sql.into(),
                parameters,
            },
            fk_column: fk_column.into(),
            data: OnceCell::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.query.sql
    }

    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some()
    }

    fn load(&self) -> Result<&HashMap<String, Vec<Row>>, EagerLoadError> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }
        let rows = self.query.run()?;
        let mut data: HashMap<String, Vec<Row>> = HashMap::new();
        for row in rows {
            let key = self.query.key_of(&row, &self.fk_column)?;
            data.entry(key).or_default().push(row);
        }
        Ok(self.data.get_or_init(|| data))
    }

    /// Rows whose foreign key equals `id`, in batch order. Empty when none.
    pub fn get(&self, id: &Value) -> Result<&[Row], EagerLoadError> {
        Ok(self
            .load()?
            .get(&identifier_key(id))
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }
}
