pub mod analyzer;
pub mod config;
pub mod errors;
pub mod relationship_cache;
pub mod schema;
pub mod schema_validator;
pub mod table_schema;

// Re-export commonly used types
pub use analyzer::{JoinStep, SchemaAnalyzer};
pub use config::SchemaConfig;
pub use errors::SchemaError;
pub use relationship_cache::{RelationshipCache, RelationshipCacheConfig};
pub use schema::{Schema, SchemaIntrospector};
pub use schema_validator::SchemaValidator;
pub use table_schema::{ColumnSchema, ForeignKey, SemanticType, TableSchema};
