//! Expansion of the `MAGICJOIN(table)` placeholder.
//!
//! The placeholder becomes `table` followed by its inheritance joins (`JOIN`
//! ancestors, `LEFT JOIN` descendants) and `LEFT JOIN` paths to every other
//! schema table referenced as `table.column`, so filters and orderings may
//! mention related tables without spelling out joins.
//!
//! Only the parenthesized query holding the placeholder is searched for
//! references, with string literals ignored. An outer select wrapping it
//! joins its own tables.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

use super::errors::QueryFactoryError;
use super::join_builder::JoinPlan;
use super::sql_text::{enclosing_group, mask_string_literals};
use crate::executor::Dialect;
use crate::schema_catalog::SchemaAnalyzer;

pub const MAGIC_JOIN_TOKEN: &str = "MAGICJOIN";

lazy_static! {
    static ref MAGIC_JOIN: Regex =
        Regex::new(r"MAGICJOIN\(\s*([^)\s]+)\s*\)").expect("valid MAGICJOIN pattern");
    /// A `name.` or quoted `"name".` qualifier
    static ref QUALIFIER: Regex = Regex::new(r#"(?:[`"]([^`"]+)[`"]|\b([A-Za-z_]\w*))\s*\."#)
        .expect("valid qualifier pattern");
}

pub(crate) fn magic_join_token(table: &str) -> String {
    format!("{}({})", MAGIC_JOIN_TOKEN, table)
}

pub struct MagicJoin {
    analyzer: Arc<SchemaAnalyzer>,
    dialect: Dialect,
}

impl MagicJoin {
    pub fn new(analyzer: Arc<SchemaAnalyzer>, dialect: Dialect) -> Self {
        MagicJoin { analyzer, dialect }
    }

    pub fn contains_placeholder(sql: &str) -> bool {
        MAGIC_JOIN.is_match(sql)
    }

    /// Replace every placeholder in `sql`. Statements without one come back
    /// unchanged.
    pub fn expand(&self, sql: &str) -> Result<String, QueryFactoryError> {
        if !Self::contains_placeholder(sql) {
            return Ok(sql.to_string());
        }

        let mut expanded = String::with_capacity(sql.len() * 2);
        let mut last = 0;
        for captures in MAGIC_JOIN.captures_iter(sql) {
            let (Some(whole), Some(table)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let referenced = self.referenced_tables(&sql[enclosing_group(sql, whole.start())]);
            expanded.push_str(&sql[last..whole.start()]);
            expanded.push_str(&self.expand_one(table.as_str(), &referenced)?);
            last = whole.end();
        }
        expanded.push_str(&sql[last..]);

        debug!("Expanded {}: {}", MAGIC_JOIN_TOKEN, expanded);
        Ok(expanded)
    }

    fn expand_one(&self, root: &str, referenced: &[String]) -> Result<String, QueryFactoryError> {
        let mut plan = JoinPlan::new(&self.analyzer, self.dialect, root).with_root_inheritance()?;
        for table in referenced {
            if table != root {
                plan.add_path_to(table, false)?;
            }
        }
        Ok(format!(
            "{}{}",
            self.dialect.quote_identifier(root),
            plan.render_joins()
        ))
    }

    /// Schema tables qualifying a column somewhere in `scope`, in schema
    /// order
    fn referenced_tables(&self, scope: &str) -> Vec<String> {
        let masked = mask_string_literals(scope);
        let qualifiers: HashSet<&str> = QUALIFIER
            .captures_iter(&masked)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str())
            .collect();
        self.analyzer
            .introspector()
            .tables()
            .into_iter()
            .filter(|table| qualifiers.contains(table.name.as_str()))
            .map(|table| table.name.clone())
            .collect()
    }
}
