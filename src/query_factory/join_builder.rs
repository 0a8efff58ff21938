//! Builds the JOIN graph around a root table.
//!
//! Ancestors are required (`JOIN`): a subtype row always has its supertype
//! row. Descendants are optional (`LEFT JOIN`): a supertype row may or may not
//! be specialised. Tables reached for eager fetching, and everything joined on
//! their behalf, are `LEFT JOIN`ed so they never filter root rows out.

use log::debug;

use super::column_descriptor::ColumnDescriptor;
use super::errors::QueryFactoryError;
use crate::executor::Dialect;
use crate::schema_catalog::{ForeignKey, SchemaAnalyzer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// Render `<kind> <table> ON <fk conditions>`
pub fn render_join(kind: JoinKind, table: &str, fk: &ForeignKey, dialect: Dialect) -> String {
    let conditions = fk
        .column_pairs()
        .map(|(local, foreign)| {
            format!(
                "{} = {}",
                dialect.qualified_column(&fk.local_table, local),
                dialect.qualified_column(&fk.foreign_table, foreign)
            )
        })
        .collect::<Vec<_>>()
        .join(" AND ");
    format!(
        "{} {} ON {}",
        kind.keyword(),
        dialect.quote_identifier(table),
        conditions
    )
}

pub struct JoinPlan<'a> {
    analyzer: &'a SchemaAnalyzer,
    dialect: Dialect,
    root: String,
    joined: Vec<String>,
    /// Tables whose columns are selected, root first
    fetched: Vec<String>,
    clauses: Vec<String>,
}

impl<'a> JoinPlan<'a> {
    pub fn new(analyzer: &'a SchemaAnalyzer, dialect: Dialect, root: &str) -> Self {
        JoinPlan {
            analyzer,
            dialect,
            root: root.to_string(),
            joined: vec![root.to_string()],
            fetched: Vec::new(),
            clauses: Vec::new(),
        }
    }

    /// Root plus its whole inheritance chain, all fetched
    pub fn with_root_inheritance(mut self) -> Result<Self, QueryFactoryError> {
        let root = self.root.clone();
        self.add_inheritance(&root, JoinKind::Inner, true)?;
        Ok(self)
    }

    fn push_join(&mut self, kind: JoinKind, table: &str, fk: &ForeignKey) {
        self.clauses
            .push(render_join(kind, table, fk, self.dialect));
        self.joined.push(table.to_string());
    }

    fn mark_fetched(&mut self, table: &str) {
        if !self.fetched.iter().any(|t| t == table) {
            self.fetched.push(table.to_string());
        }
    }

    fn add_inheritance(
        &mut self,
        table: &str,
        ancestor_kind: JoinKind,
        fetch: bool,
    ) -> Result<(), QueryFactoryError> {
        if fetch {
            self.mark_fetched(table);
        }
        for fk in self.analyzer.parent_relationship_foreign_keys(table)?.iter() {
            if !self.is_joined(&fk.foreign_table) {
                self.push_join(ancestor_kind, &fk.foreign_table, fk);
            }
            if fetch {
                self.mark_fetched(&fk.foreign_table);
            }
        }
        for fk in self.analyzer.child_relationship_foreign_keys(table)?.iter() {
            if !self.is_joined(&fk.local_table) {
                self.push_join(JoinKind::Left, &fk.local_table, fk);
            }
            if fetch {
                self.mark_fetched(&fk.local_table);
            }
        }
        Ok(())
    }

    pub fn is_joined(&self, table: &str) -> bool {
        self.joined.iter().any(|t| t == table)
    }

    /// Join `target` along the shortest foreign-key path.
    ///
    /// With `fetch`, the target and its inheritance chain become part of the
    /// selected columns; intermediate tables never are.
    pub fn add_path_to(&mut self, target: &str, fetch: bool) -> Result<(), QueryFactoryError> {
        if !self.is_joined(target) {
            let path = self
                .analyzer
                .join_path(&self.joined, target)?
                .ok_or_else(|| QueryFactoryError::NoJoinPath {
                    from: self.root.clone(),
                    to: target.to_string(),
                })?;
            for step in path {
                self.push_join(JoinKind::Left, &step.table, &step.foreign_key);
            }
            debug!("Joined '{}' onto '{}' for eager fetch", target, self.root);
        }
        if fetch {
            self.add_inheritance(target, JoinKind::Left, true)?;
        }
        Ok(())
    }

    pub fn fetched_tables(&self) -> &[String] {
        &self.fetched
    }

    pub fn joined_tables(&self) -> &[String] {
        &self.joined
    }

    /// Every JOIN clause, each preceded by a space
    pub fn render_joins(&self) -> String {
        self.clauses.iter().map(|c| format!(" {}", c)).collect()
    }

    pub fn column_descriptors(&self) -> Result<Vec<ColumnDescriptor>, QueryFactoryError> {
        let introspector = self.analyzer.introspector();
        let mut descriptors = Vec::new();
        for table in &self.fetched {
            let schema = introspector.table(table)?;
            let table_group = self.analyzer.table_group_name(table)?;
            for column in &schema.columns {
                descriptors.push(ColumnDescriptor {
                    alias: ColumnDescriptor::alias_for(table, &column.name),
                    table: table.clone(),
                    column: column.name.clone(),
                    semantic_type: column.semantic_type.clone(),
                    table_group: table_group.clone(),
                });
            }
        }
        Ok(descriptors)
    }
}

/// `table.column AS alias` for each descriptor
pub fn select_list(descriptors: &[ColumnDescriptor], dialect: Dialect) -> String {
    descriptors
        .iter()
        .map(|d| {
            format!(
                "{} AS {}",
                dialect.qualified_column(&d.table, &d.column),
                dialect.quote_identifier(&d.alias)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
