//! Relational schema configuration.
//!
//! Schemas are described in YAML:
//!
//! ```yaml
//! name: zoo
//! tables:
//!   - name: animal
//!     primary_key: id           # single column or a list
//!     columns:
//!       id: int
//!       name: varchar(255)
//!   - name: dog
//!     primary_key: id
//!     columns:
//!       id: int
//!       race: varchar(255)
//!     foreign_keys:
//!       - name: fk_dog_animal    # optional, generated when omitted
//!         columns: id
//!         references: animal
//!         foreign_columns: id    # optional, defaults to the referenced primary key
//! ```
//!
//! A foreign key whose columns are exactly the table's primary key declares
//! inheritance: `dog` is-a `animal` above.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::errors::SchemaError;
use super::schema::Schema;
use super::schema_validator::SchemaValidator;
use super::table_schema::{ColumnSchema, ForeignKey, SemanticType, TableSchema};

/// One or many column names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ColumnList {
    Single(String),
    Composite(Vec<String>),
}

impl ColumnList {
    pub fn columns(&self) -> Vec<String> {
        match self {
            ColumnList::Single(col) => vec![col.clone()],
            ColumnList::Composite(cols) => cols.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Optional schema name, carried into the loaded [`Schema`]
    #[serde(default)]
    pub name: Option<String>,
    pub tables: Vec<TableDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub primary_key: ColumnList,
    /// Column name to declared SQL type, in declaration order
    pub columns: serde_yaml::Mapping,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: ColumnList,
    pub references: String,
    /// Defaults to the referenced table's primary key
    #[serde(default)]
    pub foreign_columns: Option<ColumnList>,
}

impl SchemaConfig {
    /// Load schema configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let contents = fs::read_to_string(path).map_err(|e| SchemaError::ConfigReadError {
            error: e.to_string(),
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse schema configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(yaml).map_err(|e| SchemaError::ConfigParseError {
            error: e.to_string(),
        })
    }

    /// Build the in-memory schema and validate its structure
    pub fn to_schema(&self) -> Result<Schema, SchemaError> {
        if self.tables.is_empty() {
            return Err(SchemaError::InvalidConfig {
                message: "Schema must contain at least one table".to_string(),
            });
        }

        let mut tables = Vec::with_capacity(self.tables.len());
        for def in &self.tables {
            tables.push(self.table_schema(def)?);
        }

        let schema = Schema::new(self.name.clone(), tables);
        SchemaValidator::new(&schema).validate()?;
        Ok(schema)
    }

    fn table_schema(&self, def: &TableDefinition) -> Result<TableSchema, SchemaError> {
        let mut columns = Vec::with_capacity(def.columns.len());
        for (name, sql_type) in &def.columns {
            let name = name.as_str().ok_or_else(|| SchemaError::InvalidConfig {
                message: format!("Column names in table '{}' must be strings", def.name),
            })?;
            let semantic_type = match sql_type.as_str() {
                Some(t) => t.parse::<SemanticType>().unwrap_or_else(|never| match never {}),
                None => {
                    return Err(SchemaError::InvalidConfig {
                        message: format!(
                            "Column '{}' in table '{}' must declare its type as a string",
                            name, def.name
                        ),
                    })
                }
            };
            columns.push(ColumnSchema::new(name, semantic_type));
        }

        let mut foreign_keys = Vec::with_capacity(def.foreign_keys.len());
        for fk in &def.foreign_keys {
            let local_columns = fk.columns.columns();
            let foreign_columns = match &fk.foreign_columns {
                Some(cols) => cols.columns(),
                None => self.primary_key_of(&fk.references).ok_or_else(|| {
                    SchemaError::table_error_with_context(
                        fk.references.clone(),
                        format!("Foreign key on table '{}' references it", def.name),
                    )
                })?,
            };
            let name = fk.name.clone().unwrap_or_else(|| {
                format!("fk_{}_{}_{}", def.name, local_columns.join("_"), fk.references)
            });
            foreign_keys.push(ForeignKey {
                name,
                local_table: def.name.clone(),
                local_columns,
                foreign_table: fk.references.clone(),
                foreign_columns,
            });
        }

        Ok(TableSchema {
            name: def.name.clone(),
            columns,
            primary_key: def.primary_key.columns(),
            foreign_keys,
        })
    }

    fn primary_key_of(&self, table: &str) -> Option<Vec<String>> {
        self.tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.primary_key.columns())
    }
}
