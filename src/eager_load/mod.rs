//! Batched eager loading of related rows.
//!
//! A base query becomes a root [`PartialQuery`]. Deriving nodes from it
//! describes relation paths ("the country of every user in this result").
//! Each path registers one data loader on the cycle's [`StorageNode`], and the
//! loader answers every per-row lookup for that path from a single batch
//! query, however many base rows there are.

mod data_loader;
mod errors;
mod partial_query;
mod storage_node;

pub use data_loader::{identifier_key, ManyToOneDataLoader, OneToManyDataLoader};
pub use errors::EagerLoadError;
pub use partial_query::{ManyToOneRelation, OneToManyRelation, PartialQuery, QueryNode, KEY_SEPARATOR};
pub use storage_node::StorageNode;
