//! Compiles "find objects" requests into SQL.
//!
//! A request names a root table (or supplies a raw `FROM` clause), optional
//! tables to eager-fetch, a filter and an ordering. Compiling it produces:
//!
//! - `magic_sql`: the row query, one row per root object, every column of the
//!   root's inheritance chain (and eager-fetched tables) aliased `table____column`
//! - `magic_sql_count`: `COUNT(DISTINCT pk)` over the same rows
//! - column descriptors mapping aliases back to tables and table groups
//! - the `FROM ... WHERE ...` clause that seeds the eager-load graph
//!
//! Nothing is executed here. Compilation happens once per factory, on first
//! use, and the outcome (including a failure) is memoized.

mod column_descriptor;
mod errors;
mod find_objects;
mod find_objects_from_raw_sql;
pub mod join_builder;
mod magic_join;
pub mod order_by;
pub mod sql_text;

pub use column_descriptor::{ColumnDescriptor, ALIAS_SEPARATOR};
pub use errors::QueryFactoryError;
pub use find_objects::FindObjectsQueryFactory;
pub use find_objects_from_raw_sql::FindObjectsFromRawSqlQueryFactory;
pub use magic_join::{MagicJoin, MAGIC_JOIN_TOKEN};

use lazy_static::lazy_static;
use regex::Regex;

use crate::executor::Dialect;

lazy_static! {
    static ref GROUP_BY: Regex = Regex::new(r"(?i)\bGROUP\s+BY\b").expect("valid GROUP BY pattern");
}

/// Result of compiling a request
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub magic_sql: String,
    pub magic_sql_count: String,
    pub column_descriptors: Vec<ColumnDescriptor>,
    /// `FROM ... [WHERE filter]`, the rows the row query is derived from
    pub from_clause: String,
    /// Tables whose columns are selected, root first
    pub tables: Vec<String>,
}

/// Common interface of both factory variants
pub trait QueryFactory {
    fn main_table(&self) -> &str;

    /// Dialect the generated SQL is written in
    fn dialect(&self) -> Dialect;

    /// Compile on first call, serve the memoized outcome afterwards
    fn compiled(&self) -> Result<&CompiledQuery, QueryFactoryError>;

    fn magic_sql(&self) -> Result<&str, QueryFactoryError> {
        Ok(&self.compiled()?.magic_sql)
    }

    fn magic_sql_count(&self) -> Result<&str, QueryFactoryError> {
        Ok(&self.compiled()?.magic_sql_count)
    }

    fn column_descriptors(&self) -> Result<&[ColumnDescriptor], QueryFactoryError> {
        Ok(&self.compiled()?.column_descriptors)
    }
}

pub(crate) fn contains_group_by(sql: &str) -> bool {
    GROUP_BY.is_match(sql)
}

/// ` WHERE filter`, or nothing for a blank filter
pub(crate) fn where_clause(filter: &str) -> String {
    let filter = filter.trim();
    if filter.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", filter)
    }
}
