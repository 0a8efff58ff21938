use thiserror::Error;

use crate::eager_load::EagerLoadError;
use crate::executor::ExecutorError;
use crate::query_factory::QueryFactoryError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IteratorError {
    #[error("Offset {offset} is out of range or not a valid position")]
    InvalidOffset { offset: String },
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Reading the underlying source failed: {0}")]
    Source(#[from] ExecutorError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResultError {
    #[error(transparent)]
    QueryFactory(#[from] QueryFactoryError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error(transparent)]
    Iterator(#[from] IteratorError),
    #[error(transparent)]
    EagerLoad(#[from] EagerLoadError),
    #[error("Count query '{sql}' returned no usable count: {message}")]
    InvalidCountResult { sql: String, message: String },
}
