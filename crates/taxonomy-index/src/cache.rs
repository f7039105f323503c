//! Row caching for the query layer.
//!
//! Provides an LRU cache of [`IndexRow`]s keyed by node id. The index is
//! immutable between rebuilds, so entries never go stale on their own;
//! callers clear the cache after a rebuild.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use taxonomy_tree::TaxId;

use crate::config::CacheConfig;
use crate::row::IndexRow;

/// Thread-safe LRU cache of index rows.
///
/// # Example
///
/// ```rust
/// use taxonomy_index::{CacheConfig, RowCache};
///
/// let cache = RowCache::new(CacheConfig { max_entries: 2 });
/// assert!(cache.get(1).is_none());
/// assert_eq!(cache.stats().misses, 1);
/// ```
pub struct RowCache {
    inner: Mutex<LruCache<TaxId, IndexRow>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RowCache {
    /// Creates a cache with the given configuration.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Gets a cached row, promoting it to most-recently-used.
    pub fn get(&self, id: TaxId) -> Option<IndexRow> {
        let found = self.inner.lock().get(&id).cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Stores a row, evicting the least recently used entry when full.
    pub fn insert(&self, row: IndexRow) {
        self.inner.lock().put(row.id, row);
    }

    /// Checks for a key without touching the LRU order or the counters.
    pub fn contains(&self, id: TaxId) -> bool {
        self.inner.lock().contains(&id)
    }

    /// Number of cached rows.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&self) {
        self.inner.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.len(),
            capacity: inner.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for RowCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("RowCache")
            .field("entries", &stats.entries)
            .field("capacity", &stats.capacity)
            .finish()
    }
}

/// Statistics about the cache state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Rows currently cached.
    pub entries: usize,
    /// Maximum number of cached rows.
    pub capacity: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that fell through to the store.
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
