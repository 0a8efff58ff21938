//! EagerQL - query construction and result materialization over relational schemas
//!
//! This crate sits between a relational schema and application code:
//! - Inheritance-aware SQL generation (class-table inheritance chains joined automatically)
//! - Batched eager loading of related rows, one query per relation path
//! - Caching iterators that make forward-only cursors indexable and replayable
//!
//! Nothing here talks to a database. SQL runs through a caller-supplied
//! [`executor::SqlExecutor`].

pub mod config;
pub mod eager_load;
pub mod executor;
pub mod query_factory;
pub mod result_iterator;
pub mod schema_catalog;
