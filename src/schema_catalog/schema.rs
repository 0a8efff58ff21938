use std::collections::HashMap;

use super::errors::SchemaError;
use super::table_schema::TableSchema;

/// Answers questions about tables, columns and keys.
///
/// Implementations are queried repeatedly while compiling queries; callers
/// wanting bounded schema walks go through [`super::SchemaAnalyzer`], which
/// memoizes the inheritance relationships on top of this trait.
pub trait SchemaIntrospector {
    fn table(&self, name: &str) -> Result<&TableSchema, SchemaError>;

    /// Every table, in a stable order
    fn tables(&self) -> Vec<&TableSchema>;

    fn primary_key_columns(&self, name: &str) -> Result<&[String], SchemaError> {
        let table = self.table(name)?;
        if table.primary_key.is_empty() {
            return Err(SchemaError::MissingPrimaryKey {
                table: name.to_string(),
            });
        }
        Ok(&table.primary_key)
    }
}

/// In-memory schema, usually loaded from YAML via [`super::SchemaConfig`].
#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: Option<String>,
    tables: Vec<TableSchema>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(name: Option<String>, tables: Vec<TableSchema>) -> Self {
        let index = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        Schema {
            name,
            tables,
            index,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

impl SchemaIntrospector for Schema {
    fn table(&self, name: &str) -> Result<&TableSchema, SchemaError> {
        self.index
            .get(name)
            .map(|&i| &self.tables[i])
            .ok_or_else(|| SchemaError::UnknownTable {
                table: name.to_string(),
            })
    }

    fn tables(&self) -> Vec<&TableSchema> {
        self.tables.iter().collect()
    }
}
