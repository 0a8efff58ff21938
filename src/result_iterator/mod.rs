//! Materializing query results.
//!
//! [`ResultIterator`] runs a compiled find request and exposes its rows
//! through a [`CachingIterator`], which makes a forward-only cursor indexable
//! and replayable without querying twice.

mod caching_iterator;
mod errors;
mod results;

pub use caching_iterator::{CachingIterator, Iter};
pub use errors::{IteratorError, ResultError};
pub use results::{ResultIterator, RowIterator};
