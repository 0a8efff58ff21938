use log::debug;
use std::sync::{Arc, OnceLock};

use super::errors::QueryFactoryError;
use super::join_builder::{select_list, JoinPlan};
use super::order_by::{inner_projections, outer_order_by, parse_order_by};
use super::sql_text::find_top_level_keyword;
use super::{contains_group_by, CompiledQuery, QueryFactory};
use crate::executor::Dialect;
use crate::schema_catalog::SchemaAnalyzer;

/// Finds rows of a table through a caller-written `FROM` clause.
///
/// The clause may join anything and must mention the main table under its
/// own name. Inheritance joins are added around it, never inside it.
pub struct FindObjectsFromRawSqlQueryFactory {
    analyzer: Arc<SchemaAnalyzer>,
    dialect: Dialect,
    main_table: String,
    from: String,
    filter: String,
    order_by: String,
    count_sql: Option<String>,
    compiled: OnceLock<Result<CompiledQuery, QueryFactoryError>>,
}

impl FindObjectsFromRawSqlQueryFactory {
    pub fn new(
        analyzer: Arc<SchemaAnalyzer>,
        dialect: Dialect,
        main_table: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        FindObjectsFromRawSqlQueryFactory {
            analyzer,
            dialect,
            main_table: main_table.into(),
            from: from.into(),
            filter: String::new(),
            order_by: String::new(),
            count_sql: None,
            compiled: OnceLock::new(),
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    /// Use this count query instead of generating one.
    ///
    /// Required when the `FROM` clause groups rows: `COUNT(DISTINCT pk)` over
    /// a grouped query counts the wrong thing.
    pub fn with_count_sql(mut self, count_sql: impl Into<String>) -> Self {
        self.count_sql = Some(count_sql.into());
        self
    }

    /// `from` with the filter appended. An existing top-level `WHERE`
    /// predicate is parenthesized before the filter is AND-ed on.
    fn filtered_from(&self, from: &str, grouped: bool) -> Result<String, QueryFactoryError> {
        let filter = self.filter.trim();
        if filter.is_empty() {
            return Ok(from.to_string());
        }
        if grouped {
            return Err(QueryFactoryError::unsupported_shape_with_context(
                "cannot append a filter to a FROM clause containing GROUP BY",
                from,
            ));
        }
        let Some(keyword) = find_top_level_keyword(from, "WHERE") else {
            return Ok(format!("{} WHERE {}", from, filter));
        };
        let head = &from[..keyword.end];
        let existing = from[keyword.end..].trim();
        if existing.is_empty() {
            Ok(format!("{} {}", head, filter))
        } else {
            Ok(format!("{} ({}) AND ({})", head, existing, filter))
        }
    }

    fn compute(&self) -> Result<CompiledQuery, QueryFactoryError> {
        let dialect = self.dialect;
        let main = self.main_table.as_str();

        let from = self.from.trim();
        if !from.to_ascii_uppercase().starts_with("FROM") {
            return Err(QueryFactoryError::InvalidFromClause(from.to_string()));
        }
        let grouped = contains_group_by(from);
        let from_clause = self.filtered_from(from, grouped)?;

        let magic_sql_count = match &self.count_sql {
            Some(count_sql) => count_sql.clone(),
            None if grouped => {
                return Err(QueryFactoryError::unsupported_shape_with_context(
                    "GROUP BY cannot be combined with a generated COUNT(DISTINCT pk) query; supply a count query",
                    from,
                ))
            }
            None => {
                let pk_columns = self
                    .analyzer
                    .introspector()
                    .primary_key_columns(main)?
                    .iter()
                    .map(|c| dialect.qualified_column(main, c))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("SELECT COUNT(DISTINCT {}) {}", pk_columns, from_clause)
            }
        };

        let plan = JoinPlan::new(&self.analyzer, dialect, main).with_root_inheritance()?;
        let column_descriptors = plan.column_descriptors()?;
        let order_items = parse_order_by(&self.order_by);

        let magic_sql = if plan.fetched_tables().len() > 1 || !order_items.is_empty() {
            let mut inner_columns = vec![format!("{}.*", dialect.quote_identifier(main))];
            inner_columns.extend(inner_projections(&order_items, dialect));
            let inner = format!("SELECT DISTINCT {} {}", inner_columns.join(", "), from_clause);

            let mut sql = format!(
                "SELECT {} FROM ({}) AS {}{}",
                select_list(&column_descriptors, dialect),
                inner,
                dialect.quote_identifier(main),
                plan.render_joins()
            );
            if !order_items.is_empty() {
                sql.push_str(" ORDER BY ");
                sql.push_str(&outer_order_by(&order_items, main, dialect));
            }
            sql
        } else {
            format!(
                "SELECT DISTINCT {} {}",
                select_list(&column_descriptors, dialect),
                from_clause
            )
        };

        debug!("Compiled raw find query on '{}': {}", main, magic_sql);

        Ok(CompiledQuery {
            magic_sql,
            magic_sql_count,
            column_descriptors,
            from_clause,
            tables: plan.fetched_tables().to_vec(),
        })
    }
}

impl QueryFactory for FindObjectsFromRawSqlQueryFactory {
    fn main_table(&self) -> &str {
        &self.main_table
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn compiled(&self) -> Result<&CompiledQuery, QueryFactoryError> {
        self.compiled
            .get_or_init(|| self.compute())
            .as_ref()
            .map_err(Clone::clone)
    }
}
