/// Cache for inheritance relationships
///
/// Walking parent/children foreign keys touches every table of the schema.
/// The results only depend on the schema, so they are cached per table and
/// shared by every query compiled against it.
///
/// # Architecture
///
/// Cache Key: (caller-chosen prefix, relationship kind, table name)
/// Cache Value: the foreign keys making up the relationship chain
///
/// The prefix lets several schemas share one cache instance without their
/// entries colliding. Dropping a schema means `invalidate_prefix`.
///
/// # Configuration
///
/// Environment variables (see [`crate::config::EngineConfig`]):
/// - `EAGERQL_RELATIONSHIP_CACHE_ENABLED` (default: true)
/// - `EAGERQL_RELATIONSHIP_CACHE_MAX_ENTRIES` (default: 1000)
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::table_schema::ForeignKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    /// Ancestor chain, nearest parent first
    Parents,
    /// Every transitive descendant, breadth first
    Children,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationshipCacheKey {
    pub prefix: String,
    pub kind: RelationshipKind,
    pub table: String,
}

impl RelationshipCacheKey {
    pub fn new(prefix: &str, kind: RelationshipKind, table: &str) -> Self {
        RelationshipCacheKey {
            prefix: prefix.to_string(),
            kind,
            table: table.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    foreign_keys: Arc<Vec<ForeignKey>>,
    /// Logical clock value of the last access (for LRU)
    last_accessed: u64,
}

#[derive(Debug, Clone)]
pub struct RelationshipCacheConfig {
    pub enabled: bool,
    /// Maximum number of entries (LRU eviction)
    pub max_entries: usize,
}

impl Default for RelationshipCacheConfig {
    fn default() -> Self {
        RelationshipCacheConfig {
            enabled: true,
            max_entries: 1000,
        }
    }
}

/// Relationship cache with LRU eviction
pub struct RelationshipCache {
    cache: Mutex<HashMap<RelationshipCacheKey, CacheEntry>>,
    config: RelationshipCacheConfig,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl RelationshipCache {
    pub fn new(config: RelationshipCacheConfig) -> Self {
        RelationshipCache {
            cache: Mutex::new(HashMap::new()),
            config,
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RelationshipCacheConfig::default())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RelationshipCacheKey, CacheEntry>> {
        // entries are plain data, a poisoned lock still holds a usable map
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    pub fn get(&self, key: &RelationshipCacheKey) -> Option<Arc<Vec<ForeignKey>>> {
        if !self.config.enabled {
            return None;
        }

        let now = self.tick();
        let mut cache = self.lock();
        if let Some(entry) = cache.get_mut(key) {
            entry.last_accessed = now;
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(Arc::clone(&entry.foreign_keys))
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Insert a relationship chain. May trigger LRU eviction.
    pub fn insert(&self, key: RelationshipCacheKey, foreign_keys: Arc<Vec<ForeignKey>>) {
        if !self.config.enabled || self.config.max_entries == 0 {
            return;
        }

        let entry = CacheEntry {
            foreign_keys,
            last_accessed: self.tick(),
        };

        let mut cache = self.lock();
        if !cache.contains_key(&key) && cache.len() >= self.config.max_entries {
            self.evict_lru(&mut cache);
        }
        cache.insert(key, entry);
    }

    fn evict_lru(&self, cache: &mut HashMap<RelationshipCacheKey, CacheEntry>) {
        if let Some((key, _)) = cache.iter().min_by_key(|(_, entry)| entry.last_accessed) {
            let key = key.clone();
            cache.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drop every entry stored under `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) {
        let mut cache = self.lock();
        cache.retain(|key, _| key.prefix != prefix);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        let cache = self.lock();
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: cache.len(),
            max_entries: self.config.max_entries,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub max_entries: usize,
}

impl CacheMetrics {
    /// Calculate cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
