use log::debug;
use std::sync::{Arc, OnceLock};

use super::errors::QueryFactoryError;
use super::join_builder::{select_list, JoinPlan};
use super::magic_join::magic_join_token;
use super::order_by::{inner_projections, outer_order_by, parse_order_by};
use super::{where_clause, CompiledQuery, QueryFactory};
use crate::executor::Dialect;
use crate::schema_catalog::SchemaAnalyzer;

/// Finds rows of a table, its inheritance chain included.
///
/// The `FROM` clause is the `MAGICJOIN(table)` placeholder; [`super::MagicJoin`]
/// expands it before execution.
pub struct FindObjectsQueryFactory {
    analyzer: Arc<SchemaAnalyzer>,
    dialect: Dialect,
    main_table: String,
    additional_tables_fetch: Vec<String>,
    filter: String,
    order_by: String,
    compiled: OnceLock<Result<CompiledQuery, QueryFactoryError>>,
}

impl FindObjectsQueryFactory {
    pub fn new(analyzer: Arc<SchemaAnalyzer>, dialect: Dialect, main_table: impl Into<String>) -> Self {
        FindObjectsQueryFactory {
            analyzer,
            dialect,
            main_table: main_table.into(),
            additional_tables_fetch: Vec::new(),
            filter: String::new(),
            order_by: String::new(),
            compiled: OnceLock::new(),
        }
    }

    /// Also select the columns of `tables`
    pub fn with_additional_tables(mut self, tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.additional_tables_fetch = tables.into_iter().map(Into::into).collect();
        self
    }

    /// SQL boolean expression, already rendered
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// ORDER BY list, without the keywords
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    fn compute(&self) -> Result<CompiledQuery, QueryFactoryError> {
        let dialect = self.dialect;
        let main = self.main_table.as_str();

        let mut plan = JoinPlan::new(&self.analyzer, dialect, main).with_root_inheritance()?;
        for table in &self.additional_tables_fetch {
            plan.add_path_to(table, true)?;
        }
        let column_descriptors = plan.column_descriptors()?;

        let from_clause = format!("FROM {}{}", magic_join_token(main), where_clause(&self.filter));
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

        let pk_columns = self
            .analyzer
            .introspector()
            .primary_key_columns(main)?
            .iter()
            .map(|c| dialect.qualified_column(main, c))
            .collect::<Vec<_>>()
            .join(", ");
        let magic_sql_count = format!("SELECT COUNT(DISTINCT {}) {}", pk_columns, from_clause);

        debug!("Compiled find query on '{}': {}", main, magic_sql);

        Ok(CompiledQuery {
            magic_sql,
            magic_sql_count,
            column_descriptors,
            from_clause,
            tables: plan.fetched_tables().to_vec(),
        })
    }
}

impl QueryFactory for FindObjectsQueryFactory {
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
