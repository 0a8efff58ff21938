use thiserror::Error;

use crate::schema_catalog::SchemaError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryFactoryError {
    #[error("Unsupported query shape: {0}")]
    UnsupportedQueryShape(String),
    #[error("Invalid FROM clause (must start with FROM): {0}")]
    InvalidFromClause(String),
    #[error("No foreign key path from '{from}' to eager-fetched table '{to}'")]
    NoJoinPath { from: String, to: String },
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl QueryFactoryError {
    /// Create an UnsupportedQueryShape error with context information
    pub fn unsupported_shape_with_context(
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        QueryFactoryError::UnsupportedQueryShape(format!(
            "{}\n  Context: {}",
            message.into(),
            context.into()
        ))
    }
}
