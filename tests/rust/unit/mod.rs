//! Unit tests - Tests that exercise one component through the public API
//!
//! No executor round-trips beyond in-memory cursors.

mod caching_iterator_tests;
mod query_factory_tests;
