//! # Schema Error Types
//!
//! Errors raised while loading, validating or walking a relational schema.
//!
//! ## Error Categories
//!
//! - **Lookup Errors**: unknown tables or columns
//! - **Structural Errors**: foreign keys or primary keys that do not line up
//! - **Configuration Errors**: file I/O and YAML parsing issues during loading
//!
//! When returning lookup errors, use the context helpers so the message says
//! what was being done when the table went missing:
//!
//! ```ignore
//! SchemaError::table_error_with_context(
//!     "labrador",
//!     "While resolving inheritance parents"
//! )
//! ```

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("No table named `{table}` in schema")]
    UnknownTable { table: String },
    #[error("Column '{column}' not found in table '{table}'")]
    UnknownColumn { column: String, table: String },
    #[error("Table '{table}' has no primary key")]
    MissingPrimaryKey { table: String },
    #[error("Invalid foreign key '{name}' on table '{table}': {message}")]
    InvalidForeignKey {
        name: String,
        table: String,
        message: String,
    },
    #[error("Failed to read schema file: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse schema: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid schema: {message}")]
    InvalidConfig { message: String },
}

impl SchemaError {
    /// Create an UnknownTable error with context information
    pub fn table_error_with_context(table: impl Into<String>, context: impl Into<String>) -> Self {
        let table = table.into();
        let ctx = context.into();
        SchemaError::UnknownTable {
            table: format!("{}\n  Context: {}", table, ctx),
        }
    }

    pub fn invalid_foreign_key(
        name: impl Into<String>,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SchemaError::InvalidForeignKey {
            name: name.into(),
            table: table.into(),
            message: message.into(),
        }
    }
}
