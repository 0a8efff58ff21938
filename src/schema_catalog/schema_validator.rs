//! Structural validation of a loaded schema.
//!
//! Ensures that:
//!
//! - Table names are unique
//! - Primary key columns exist
//! - Foreign keys reference existing tables and columns on both sides, with
//!   matching column counts

use std::collections::HashSet;

use super::errors::SchemaError;
use super::schema::{Schema, SchemaIntrospector};
use super::table_schema::{ForeignKey, TableSchema};

pub struct SchemaValidator<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        SchemaValidator { schema }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for table in self.schema.tables() {
            if !seen.insert(table.name.as_str()) {
                return Err(SchemaError::InvalidConfig {
                    message: format!("Duplicate table: {}", table.name),
                });
            }
            self.validate_table(table)?;
        }
        Ok(())
    }

    fn validate_table(&self, table: &TableSchema) -> Result<(), SchemaError> {
        if table.primary_key.is_empty() {
            return Err(SchemaError::MissingPrimaryKey {
                table: table.name.clone(),
            });
        }
        for column in &table.primary_key {
            validate_column_exists(table, column)?;
        }
        for fk in &table.foreign_keys {
            self.validate_foreign_key(table, fk)?;
        }
        Ok(())
    }

    fn validate_foreign_key(&self, table: &TableSchema, fk: &ForeignKey) -> Result<(), SchemaError> {
        if fk.local_columns.is_empty() {
            return Err(SchemaError::invalid_foreign_key(
                &fk.name,
                &table.name,
                "no local columns",
            ));
        }
        if fk.local_columns.len() != fk.foreign_columns.len() {
            return Err(SchemaError::invalid_foreign_key(
                &fk.name,
                &table.name,
                format!(
                    "{} local columns but {} referenced columns",
                    fk.local_columns.len(),
                    fk.foreign_columns.len()
                ),
            ));
        }

        let target = self.schema.table(&fk.foreign_table).map_err(|_| {
            SchemaError::table_error_with_context(
                fk.foreign_table.clone(),
                format!("Referenced by foreign key '{}' on '{}'", fk.name, table.name),
            )
        })?;

        for (local, foreign) in fk.column_pairs() {
            validate_column_exists(table, local)?;
            validate_column_exists(target, foreign)?;
        }
        Ok(())
    }
}

fn validate_column_exists(table: &TableSchema, column: &str) -> Result<(), SchemaError> {
    if !table.has_column(column) {
        return Err(SchemaError::UnknownColumn {
            column: column.to_string(),
            table: table.name.clone(),
        });
    }
    Ok(())
}
