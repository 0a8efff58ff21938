//! Relation paths reachable from a base query.
//!
//! Every node carries a `FROM ... WHERE ...` fragment selecting exactly the
//! rows reachable along its path, and a key naming that path. Nodes with the
//! same key describe the same rows, so they share one data loader on the
//! storage node and the whole path costs a single batch query.

use log::debug;
use serde_json::Value;
use std::rc::Rc;
use std::sync::Arc;

use super::data_loader::{ManyToOneDataLoader, OneToManyDataLoader};
use super::errors::EagerLoadError;
use super::storage_node::StorageNode;
use crate::executor::{Dialect, Parameters, Row, SqlExecutor};

/// Separator between the segments of a relation path key
pub const KEY_SEPARATOR: &str = "__";

/// State shared by every kind of node
#[derive(Clone)]
pub struct QueryNode<'s> {
    query_from: String,
    key: String,
    parameters: Rc<Parameters>,
    storage: &'s StorageNode,
    /// Dialect the fragment is written in
    dialect: Dialect,
}

#[derive(Clone)]
pub struct ManyToOneRelation {
    pub target_table: String,
    pub target_primary_key: String,
}

#[derive(Clone)]
pub struct OneToManyRelation {
    pub target_table: String,
    pub target_foreign_key: String,
}

#[derive(Clone)]
pub enum PartialQuery<'s> {
    /// The base query itself. Nothing to batch against.
    Root(QueryNode<'s>),
    /// Rows referenced by a foreign key of the parent's rows
    ManyToOne(QueryNode<'s>, ManyToOneRelation),
    /// Rows whose foreign key references the parent's rows
    OneToMany(QueryNode<'s>, OneToManyRelation),
}

impl<'s> PartialQuery<'s> {
    /// Wrap a compiled base query.
    ///
    /// `from_clause` is its `FROM ... [WHERE ...]` and `tables` the tables it
    /// selects, which name the root of every key derived from it.
    pub fn root(
        from_clause: impl Into<String>,
        parameters: Rc<Parameters>,
        tables: &[String],
        storage: &'s StorageNode,
        dialect: Dialect,
    ) -> Self {
        PartialQuery::Root(QueryNode {
            query_from: from_clause.into(),
            key: tables.join(KEY_SEPARATOR),
            parameters,
            storage,
            dialect,
        })
    }

    /// Follow `origin.fk_column -> target.target_pk` from this node.
    pub fn many_to_one(
        &self,
        origin_table: &str,
        target_table: &str,
        target_primary_key: &str,
        foreign_key_column: &str,
    ) -> Self {
        let parent = self.node();
        let d = parent.dialect;
        let query_from = format!(
            "FROM {} WHERE {} IN (SELECT {} {})",
            d.quote_identifier(target_table),
            d.qualified_column(target_table, target_primary_key),
            d.qualified_column(origin_table, foreign_key_column),
            parent.query_from
        );
        PartialQuery::ManyToOne(
            parent.derive(query_from, format!("{}{}{}", parent.key, KEY_SEPARATOR, foreign_key_column)),
            ManyToOneRelation {
                target_table: target_table.to_string(),
                target_primary_key: target_primary_key.to_string(),
            },
        )
    }

    /// Follow `target.target_fk -> origin.origin_pk` backwards from this node.
    pub fn one_to_many(
        &self,
        origin_table: &str,
        origin_primary_key: &str,
        target_table: &str,
        target_foreign_key: &str,
    ) -> Self {
        let parent = self.node();
        let d = parent.dialect;
        let query_from = format!(
            "FROM {} WHERE {} IN (SELECT {} {})",
            d.quote_identifier(target_table),
            d.qualified_column(target_table, target_foreign_key),
            d.qualified_column(origin_table, origin_primary_key),
            parent.query_from
        );
        let key = [parent.key.as_str(), target_table, target_foreign_key].join(KEY_SEPARATOR);
        PartialQuery::OneToMany(
            parent.derive(query_from, key),
            OneToManyRelation {
                target_table: target_table.to_string(),
                target_foreign_key: target_foreign_key.to_string(),
            },
        )
    }

    fn node(&self) -> &QueryNode<'s> {
        match self {
            PartialQuery::Root(node)
            | PartialQuery::ManyToOne(node, _)
            | PartialQuery::OneToMany(node, _) => node,
        }
    }

    pub fn key(&self) -> &str {
        &self.node().key
    }

    pub fn query_from(&self) -> &str {
        &self.node().query_from
    }

    pub fn parameters(&self) -> &Parameters {
        &self.node().parameters
    }

    pub fn storage_node(&self) -> &'s StorageNode {
        self.node().storage
    }

    pub fn is_root(&self) -> bool {
        matches!(self, PartialQuery::Root(_))
    }

    /// Make sure the storage node holds a loader for this path.
    ///
    /// Does nothing when one is already registered under the key, so any
    /// number of nodes describing the same path end up with one batch query.
    pub fn register_data_loader(&self, executor: &Arc<dyn SqlExecutor>) -> Result<(), EagerLoadError> {
        match self {
            PartialQuery::Root(node) => Err(EagerLoadError::RootQueryMisuse {
                key: node.key.clone(),
            }),
            PartialQuery::ManyToOne(node, relation) => {
                if node.storage.has_many_to_one_data_loader(&node.key) {
                    return Ok(());
                }
                let sql = node.batch_sql(&relation.target_table, executor.as_ref())?;
                node.storage.set_many_to_one_data_loader(
                    &node.key,
                    ManyToOneDataLoader::new(
                        Arc::clone(executor),
                        sql,
                        relation.target_primary_key.clone(),
                        Rc::clone(&node.parameters),
                    ),
                );
                Ok(())
            }
            PartialQuery::OneToMany(node, relation) => {
                if node.storage.has_one_to_many_data_loader(&node.key) {
                    return Ok(());
                }
                let sql = node.batch_sql(&relation.target_table, executor.as_ref())?;
                node.storage.set_one_to_many_data_loader(
                    &node.key,
                    OneToManyDataLoader::new(
                        Arc::clone(executor),
                        sql,
                        relation.target_foreign_key.clone(),
                        Rc::clone(&node.parameters),
                    ),
                );
                Ok(())
            }
        }
    }

    /// The row this path reaches for identifier `id`, batching on first use.
    pub fn fetch_many_to_one(&self, executor: &Arc<dyn SqlExecutor>, id: &Value) -> Result<Row, EagerLoadError> {
        if !matches!(self, PartialQuery::ManyToOne(..)) {
            return self.kind_mismatch("many-to-one");
        }
        self.register_data_loader(executor)?;
        let loader = self.storage_node().many_to_one_data_loader(self.key())?;
        let row = loader.get(id)?;
        Ok(row.clone())
    }

    /// The rows this path reaches for foreign key value `id`, batching on
    /// first use. Empty when there are none.
    pub fn fetch_one_to_many(&self, executor: &Arc<dyn SqlExecutor>, id: &Value) -> Result<Vec<Row>, EagerLoadError> {
        if !matches!(self, PartialQuery::OneToMany(..)) {
            return self.kind_mismatch("one-to-many");
        }
        self.register_data_loader(executor)?;
        let loader = self.storage_node().one_to_many_data_loader(self.key())?;
        let rows = loader.get(id)?;
        Ok(rows.to_vec())
    }

    fn kind_mismatch<T>(&self, expected: &'static str) -> Result<T, EagerLoadError> {
        Err(EagerLoadError::RelationKindMismatch {
            key: self.key().to_string(),
            expected,
        })
    }
}

impl<'s> QueryNode<'s> {
    fn derive(&self, query_from: String, key: String) -> Self {
        QueryNode {
            query_from,
            key,
            parameters: Rc::clone(&self.parameters),
            storage: self.storage,
            dialect: self.dialect,
        }
    }

    fn batch_sql(&self, target_table: &str, executor: &dyn SqlExecutor) -> Result<String, EagerLoadError> {
        let sql = format!(
            "SELECT DISTINCT {}.* {}",
            self.dialect.quote_identifier(target_table),
            self.query_from
        );
        if executor.dialect() == self.dialect {
            return Ok(sql);
        }
        debug!(
            "Translating batch query '{}' from {} to {}",
            self.key,
            self.dialect,
            executor.dialect()
        );
        Ok(executor.translate(&sql, self.dialect)?)
    }
}
