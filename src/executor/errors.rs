use thiserror::Error;

use super::dialect::Dialect;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutorError {
    #[error("Query execution failed: {message}\n  SQL: {sql}")]
    Execution { sql: String, message: String },
    #[error("Cannot translate query from {from} to {to}: {message}")]
    Translation {
        from: Dialect,
        to: Dialect,
        message: String,
    },
    #[error("Cursor failure: {0}")]
    Cursor(String),
}

impl ExecutorError {
    /// Create an Execution error for the given statement
    pub fn execution(sql: impl Into<String>, message: impl Into<String>) -> Self {
        ExecutorError::Execution {
            sql: sql.into(),
            message: message.into(),
        }
    }
}
