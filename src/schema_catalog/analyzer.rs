//! Inheritance-aware schema walks.
//!
//! Class-table inheritance is encoded as a foreign key from a table's primary
//! key to its supertype's primary key. The analyzer answers, for any table:
//!
//! - which tables it inherits from (ancestor chain, nearest first)
//! - which tables inherit from it (all descendants, breadth first)
//! - which inheritance group it belongs to
//! - how to reach another table through foreign keys
//!
//! Walks use explicit work lists, never recursion, and relationship chains are
//! memoized in a [`RelationshipCache`] so a deep hierarchy is walked once per
//! table rather than once per compiled query.

use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, OnceLock};

use super::errors::SchemaError;
use super::relationship_cache::{RelationshipCache, RelationshipCacheKey, RelationshipKind};
use super::schema::SchemaIntrospector;
use super::table_schema::ForeignKey;

/// One hop of a join path: `table` is reached from an already joined table
/// through `foreign_key` (which may point either way).
#[derive(Debug, Clone, PartialEq)]
pub struct JoinStep {
    pub table: String,
    pub foreign_key: ForeignKey,
}

pub struct SchemaAnalyzer {
    introspector: Arc<dyn SchemaIntrospector>,
    cache: Arc<RelationshipCache>,
    prefix: String,
    /// foreign table name -> every foreign key pointing at it
    incoming: OnceLock<HashMap<String, Vec<ForeignKey>>>,
}

impl SchemaAnalyzer {
    /// Analyzer with a private cache
    pub fn new(introspector: Arc<dyn SchemaIntrospector>) -> Self {
        Self::with_cache(introspector, Arc::new(RelationshipCache::with_defaults()), "")
    }

    /// Analyzer sharing `cache` with others; entries are keyed under `prefix`
    pub fn with_cache(
        introspector: Arc<dyn SchemaIntrospector>,
        cache: Arc<RelationshipCache>,
        prefix: impl Into<String>,
    ) -> Self {
        SchemaAnalyzer {
            introspector,
            cache,
            prefix: prefix.into(),
            incoming: OnceLock::new(),
        }
    }

    pub fn introspector(&self) -> &dyn SchemaIntrospector {
        self.introspector.as_ref()
    }

    pub fn cache(&self) -> &RelationshipCache {
        &self.cache
    }

    fn incoming_foreign_keys(&self) -> &HashMap<String, Vec<ForeignKey>> {
        self.incoming.get_or_init(|| {
            let mut incoming: HashMap<String, Vec<ForeignKey>> = HashMap::new();
            for table in self.introspector.tables() {
                for fk in &table.foreign_keys {
                    incoming
                        .entry(fk.foreign_table.clone())
                        .or_default()
                        .push(fk.clone());
                }
            }
            incoming
        })
    }

    fn cached(
        &self,
        kind: RelationshipKind,
        table: &str,
        compute: impl FnOnce() -> Result<Vec<ForeignKey>, SchemaError>,
    ) -> Result<Arc<Vec<ForeignKey>>, SchemaError> {
        let key = RelationshipCacheKey::new(&self.prefix, kind, table);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let computed = Arc::new(compute()?);
        debug!(
            "Resolved {:?} of '{}': {} foreign key(s)",
            kind,
            table,
            computed.len()
        );
        self.cache.insert(key, Arc::clone(&computed));
        Ok(computed)
    }

    /// Foreign keys from `table` up to its root ancestor, nearest parent first.
    pub fn parent_relationship_foreign_keys(
        &self,
        table: &str,
    ) -> Result<Arc<Vec<ForeignKey>>, SchemaError> {
        self.cached(RelationshipKind::Parents, table, || {
            let mut chain = Vec::new();
            let mut visited = HashSet::from([table.to_string()]);
            let mut current = table.to_string();
            loop {
                let schema = self.introspector.table(&current)?;
                let Some(fk) = schema.parent_foreign_key() else {
                    break;
                };
                if !visited.insert(fk.foreign_table.clone()) {
                    warn!(
                        "Inheritance cycle through '{}' and '{}', stopping ancestor walk",
                        current, fk.foreign_table
                    );
                    break;
                }
                chain.push(fk.clone());
                current = fk.foreign_table.clone();
            }
            Ok(chain)
        })
    }

    /// Foreign keys of every transitive descendant of `table`.
    ///
    /// Breadth first: a child's own foreign key always comes after the key of
    /// the table it points at, so joining in order never references a table
    /// that is not joined yet.
    pub fn child_relationship_foreign_keys(
        &self,
        table: &str,
    ) -> Result<Arc<Vec<ForeignKey>>, SchemaError> {
        // fail on unknown tables rather than answering "no children"
        self.introspector.table(table)?;

        self.cached(RelationshipKind::Children, table, || {
            let incoming = self.incoming_foreign_keys();
            let mut children = Vec::new();
            let mut visited = HashSet::from([table.to_string()]);
            let mut queue = VecDeque::from([table.to_string()]);

            while let Some(current) = queue.pop_front() {
                let Some(candidates) = incoming.get(&current) else {
                    continue;
                };
                for fk in candidates {
                    let child = self.introspector.table(&fk.local_table)?;
                    if child.parent_foreign_key() != Some(fk) {
                        continue;
                    }
                    if visited.insert(child.name.clone()) {
                        children.push(fk.clone());
                        queue.push_back(child.name.clone());
                    }
                }
            }
            Ok(children)
        })
    }

    /// Names of the ancestors of `table`, nearest first
    pub fn ancestor_tables(&self, table: &str) -> Result<Vec<String>, SchemaError> {
        Ok(self
            .parent_relationship_foreign_keys(table)?
            .iter()
            .map(|fk| fk.foreign_table.clone())
            .collect())
    }

    /// Names of all descendants of `table`, breadth first
    pub fn descendant_tables(&self, table: &str) -> Result<Vec<String>, SchemaError> {
        Ok(self
            .child_relationship_foreign_keys(table)?
            .iter()
            .map(|fk| fk.local_table.clone())
            .collect())
    }

    /// `table`, its ancestors and its descendants.
    ///
    /// Siblings (other descendants of an ancestor) are not included: a row of
    /// `table` can never be one of them.
    pub fn related_tables_by_inheritance(&self, table: &str) -> Result<Vec<String>, SchemaError> {
        let mut tables = vec![table.to_string()];
        tables.extend(self.ancestor_tables(table)?);
        tables.extend(self.descendant_tables(table)?);
        Ok(tables)
    }

    /// Opaque label shared by every table of one inheritance hierarchy.
    ///
    /// The hierarchy is the root ancestor of `table` plus all of the root's
    /// descendants, so siblings share a label.
    pub fn table_group_name(&self, table: &str) -> Result<String, SchemaError> {
        let root = self
            .ancestor_tables(table)?
            .pop()
            .unwrap_or_else(|| table.to_string());

        let mut members = self.descendant_tables(&root)?;
        members.push(root);
        members.sort();

        let mut hasher = Sha256::new();
        for member in &members {
            hasher.update(member.as_bytes());
            hasher.update([0u8]);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    /// Shortest foreign-key path from any table in `joined` to `target`.
    ///
    /// Foreign keys are followed in both directions. Returns `Ok(None)` when
    /// `target` is unreachable and an empty path when it is already joined.
    pub fn join_path(
        &self,
        joined: &[String],
        target: &str,
    ) -> Result<Option<Vec<JoinStep>>, SchemaError> {
        self.introspector.table(target)?;
        if joined.iter().any(|t| t == target) {
            return Ok(Some(Vec::new()));
        }

        let incoming = self.incoming_foreign_keys();
        let mut reached_by: HashMap<String, Option<JoinStep>> = HashMap::new();
        let mut queue = VecDeque::new();
        for table in joined {
            reached_by.insert(table.clone(), None);
            queue.push_back(table.clone());
        }

        while let Some(current) = queue.pop_front() {
            let outgoing = self.introspector.table(&current)?.foreign_keys.iter();
            let neighbours = outgoing
                .map(|fk| (fk.foreign_table.clone(), fk))
                .chain(
                    incoming
                        .get(&current)
                        .into_iter()
                        .flatten()
                        .map(|fk| (fk.local_table.clone(), fk)),
                );

            for (next, fk) in neighbours {
                if reached_by.contains_key(&next) {
                    continue;
                }
                reached_by.insert(
                    next.clone(),
                    Some(JoinStep {
                        table: next.clone(),
                        foreign_key: fk.clone(),
                    }),
                );
                if next == target {
                    return Ok(Some(Self::unwind_path(&reached_by, target)));
                }
                queue.push_back(next);
            }
        }
        Ok(None)
    }

    fn unwind_path(reached_by: &HashMap<String, Option<JoinStep>>, target: &str) -> Vec<JoinStep> {
        let mut path = Vec::new();
        let mut current = target.to_string();
        while let Some(Some(step)) = reached_by.get(&current) {
            let previous = if step.foreign_key.local_table == step.table {
                step.foreign_key.foreign_table.clone()
            } else {
                step.foreign_key.local_table.clone()
            };
            path.push(step.clone());
            current = previous;
        }
        path.reverse();
        path
    }
}
