//! Sharded memo of type classification verdicts.
//!
//! Each access checks out one shard with `try_lock`, starting from a
//! per-thread preferred index, so threads rarely contend. When every shard
//! is busy the access counts as a miss. Shards hold a soft number of
//! entries and evict one arbitrary entry when full.
//!
//! The cache only accelerates [`TypeClassifier`](crate::TypeClassifier);
//! a lost entry costs a recomputation, never a wrong answer.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use parking_lot::Mutex;

/// Number of shards in the global cache.
pub const SHARD_COUNT: usize = 8;

/// Soft entry limit per shard in the global cache.
pub const SHARD_CAPACITY: usize = 256;

thread_local! {
    static PREFERRED_SHARD: Cell<usize> = Cell::new(rand::random::<usize>());
}

/// Identity of a type for caching purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    name: &'static str,
    size: usize,
}

impl TypeKey {
    pub const fn new(name: &'static str, size: usize) -> Self {
        Self { name, size }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// Counters for cache diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Sharded type classification cache.
pub struct TypeCache {
    shards: Box<[Mutex<HashMap<TypeKey, bool>>]>,
    shard_capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl TypeCache {
    /// Create a cache with `shards` shards of `shard_capacity` soft entries.
    pub fn new(shards: usize, shard_capacity: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Mutex::new(HashMap::with_capacity(shard_capacity)))
            .collect();
        Self {
            shards,
            shard_capacity: shard_capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// The process-wide cache used by captures.
    pub fn global() -> &'static TypeCache {
        static GLOBAL: OnceLock<TypeCache> = OnceLock::new();
        GLOBAL.get_or_init(|| TypeCache::new(SHARD_COUNT, SHARD_CAPACITY))
    }

    /// Look up the cached verdict for `key`.
    pub fn load(&self, key: &TypeKey) -> Option<bool> {
        let found = self.with_shard(|shard| shard.get(key).copied()).flatten();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Record the verdict for `key`. Dropped silently if every shard is busy.
    pub fn store(&self, key: TypeKey, primitive: bool) {
        let capacity = self.shard_capacity;
        let evicted = self.with_shard(|shard| {
            let mut evicted = false;
            if shard.len() >= capacity && !shard.contains_key(&key) {
                if let Some(victim) = shard.keys().next().copied() {
                    shard.remove(&victim);
                    evicted = true;
                }
            }
            shard.insert(key, primitive);
            evicted
        });
        if evicted == Some(true) {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.shards.iter().map(|shard| shard.lock().len()).sum(),
        }
    }

    /// Remove every entry. Counters are kept.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.lock().clear();
        }
    }

    fn with_shard<R>(&self, f: impl FnOnce(&mut HashMap<TypeKey, bool>) -> R) -> Option<R> {
        let count = self.shards.len();
        let start = PREFERRED_SHARD.with(Cell::get) % count;
        for step in 0..count {
            let index = (start + step) % count;
            if let Some(mut shard) = self.shards[index].try_lock() {
                PREFERRED_SHARD.with(|preferred| preferred.set(index));
                return Some(f(&mut shard));
            }
        }
        None
    }
}

impl Default for TypeCache {
    fn default() -> Self {
        Self::new(SHARD_COUNT, SHARD_CAPACITY)
    }
}
