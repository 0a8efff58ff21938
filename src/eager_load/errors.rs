use thiserror::Error;

use crate::executor::ExecutorError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EagerLoadError {
    #[error("Cannot register a data loader on the root query (key '{key}'); only derived queries batch")]
    RootQueryMisuse { key: String },
    #[error("No row with ID '{id}' in batch '{sql}' (parameters: {parameters}). The batch was expected to contain it")]
    MissingBatchEntry {
        id: String,
        sql: String,
        parameters: String,
    },
    #[error("Partial query '{key}' is not a {expected} relation")]
    RelationKindMismatch { key: String, expected: &'static str },
    #[error("No data loader registered under key '{key}'")]
    LoaderNotRegistered { key: String },
    #[error("Batch row has no '{column}' column (query: {sql})")]
    MissingIdentifierColumn { column: String, sql: String },
    #[error("Batch query failed: {0}")]
    Executor(#[from] ExecutorError),
}
