//! Size-accounted LRU cache.
//!
//! Recency order lives in an `IndexMap`: index 0 is the least recently used
//! entry, the back is the most recently used. Promotion is `shift_remove`
//! plus re-insert at the back, eviction is `shift_remove_index(0)`. Both are
//! O(1) amortized.
//!
//! Capacity is measured in bytes, not entries. Every resident entry costs
//! `key.len() + value.len()`, and inserts evict from the cold end until the
//! cache fits under `max_bytes` again. A `max_bytes` of 0 disables eviction.

use crate::view::ByteView;
use indexmap::IndexMap;

/// Callback invoked with the key and value of every evicted entry.
///
/// Fires synchronously inside the operation that removes the entry.
pub type EvictionCallback = Box<dyn FnMut(&str, &ByteView) + Send>;

/// Counters for cache effectiveness monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions.
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in `[0.0, 1.0]`. Zero lookups count as a rate of 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Byte-bounded LRU over string keys and immutable values.
///
/// Not thread-safe. The owning group wraps it in a mutex and holds that
/// mutex only for `get` and `add`, never across I/O.
pub struct Lru {
    max_bytes: u64,
    used: u64,
    entries: IndexMap<String, ByteView>,
    on_evict: Option<EvictionCallback>,
    stats: CacheStats,
}

impl Lru {
    /// Creates a cache bounded to `max_bytes`. 0 means unbounded.
    #[must_use]
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            used: 0,
            entries: IndexMap::new(),
            on_evict: None,
            stats: CacheStats::default(),
        }
    }

    /// Creates a bounded cache that reports every eviction to `on_evict`.
    #[must_use]
    pub fn with_eviction_callback(max_bytes: u64, on_evict: EvictionCallback) -> Self {
        Self {
            on_evict: Some(on_evict),
            ..Self::new(max_bytes)
        }
    }

    /// Looks up `key`, promoting the entry to most recently used on a hit.
    ///
    /// Does not change the accounted byte count.
    pub fn get(&mut self, key: &str) -> Option<ByteView> {
        match self.entries.shift_remove(key) {
            Some(value) => {
                self.entries.insert(key.to_owned(), value.clone());
                self.stats.hits += 1;
                Some(value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Inserts or replaces `key`, then evicts cold entries until the cache
    /// fits under `max_bytes`.
    ///
    /// An update adjusts the byte count by the size delta of the value; the
    /// entry moves to most recently used either way.
    pub fn add(&mut self, key: &str, value: ByteView) {
        if let Some(old) = self.entries.shift_remove(key) {
            self.used = self.used - old.len() as u64 + value.len() as u64;
            self.entries.insert(key.to_owned(), value);
        } else {
            self.used += key.len() as u64 + value.len() as u64;
            self.entries.insert(key.to_owned(), value);
        }
        while self.max_bytes > 0 && self.used > self.max_bytes {
            self.remove_oldest();
        }
    }

    /// Evicts the least recently used entry, if any.
    pub fn remove_oldest(&mut self) {
        if let Some((key, value)) = self.entries.shift_remove_index(0) {
            self.used -= key.len() as u64 + value.len() as u64;
            self.stats.evictions += 1;
            if let Some(cb) = self.on_evict.as_mut() {
                cb(&key, &value);
            }
        }
    }

    /// Number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accounted bytes currently resident.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.used
    }

    /// Configured ceiling in bytes. 0 means unbounded.
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Returns true if `key` is resident, without touching recency.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Snapshot of the hit/miss/eviction counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl std::fmt::Debug for Lru {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lru")
            .field("max_bytes", &self.max_bytes)
            .field("used", &self.used)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
