use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

use crate::executor::Dialect;
use crate::schema_catalog::{
    RelationshipCache, RelationshipCacheConfig, SchemaAnalyzer, SchemaIntrospector,
};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Engine configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Dialect batch queries are written in before translation
    pub native_dialect: Dialect,

    /// Whether inheritance chains are cached across analyzers
    pub relationship_cache_enabled: bool,

    /// Maximum cached inheritance chains (LRU eviction)
    #[validate(range(
        min = 1,
        max = 1_000_000,
        message = "Relationship cache size must be between 1 and 1000000"
    ))]
    pub relationship_cache_max_entries: usize,

    /// Prefix for relationship cache keys, to keep schemas sharing a cache apart
    pub cache_key_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            native_dialect: Dialect::MySql,
            relationship_cache_enabled: true,
            relationship_cache_max_entries: 1000,
            cache_key_prefix: String::new(),
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            native_dialect: parse_env_var("EAGERQL_NATIVE_DIALECT", "mysql")?,
            relationship_cache_enabled: parse_env_var("EAGERQL_RELATIONSHIP_CACHE_ENABLED", "true")?,
            relationship_cache_max_entries: parse_env_var(
                "EAGERQL_RELATIONSHIP_CACHE_MAX_ENTRIES",
                "1000",
            )?,
            cache_key_prefix: env::var("EAGERQL_CACHE_KEY_PREFIX").unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn relationship_cache(&self) -> Arc<RelationshipCache> {
        Arc::new(RelationshipCache::new(RelationshipCacheConfig {
            enabled: self.relationship_cache_enabled,
            max_entries: self.relationship_cache_max_entries,
        }))
    }

    /// Analyzer over `introspector` with a fresh cache built from this config
    pub fn analyzer(&self, introspector: Arc<dyn SchemaIntrospector>) -> SchemaAnalyzer {
        SchemaAnalyzer::with_cache(
            introspector,
            self.relationship_cache(),
            self.cache_key_prefix.clone(),
        )
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e: T::Err| ConfigError::Parse {
        field: key.to_string(),
        value: value.clone(),
        source: e.to_string().into(),
    })
}
