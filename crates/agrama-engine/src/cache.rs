//! Operation caches.
//!
//! Three moka LRU-style caches keyed by the blake3 hash of the canonical
//! arguments: query embeddings, deterministic transform outputs, and
//! search results. Content mutation invalidates the search cache, since
//! any of its entries may depend on the mutated path.

use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use serde_json::Value;

use agrama_core::config::CacheConfig;

/// Hit/miss counters for one cache.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Snapshot of one cache's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

impl CacheCounters {
    fn observe(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Cache key: blake3 of a primitive name and its canonical arguments.
pub fn cache_key(primitive: &str, args: &Value) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(primitive.as_bytes());
    hasher.update(b"\0");
    hasher.update(args.to_string().as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// The engine's operation caches.
pub struct OperationCache {
    embeddings: Cache<String, Vec<f32>>,
    embedding_counters: CacheCounters,
    transforms: Cache<String, Value>,
    transform_counters: CacheCounters,
    searches: Cache<String, Value>,
    search_counters: CacheCounters,
}

impl OperationCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            embeddings: Cache::new(config.embedding_entries),
            embedding_counters: CacheCounters::default(),
            transforms: Cache::new(config.transform_entries),
            transform_counters: CacheCounters::default(),
            searches: Cache::new(config.search_entries),
            search_counters: CacheCounters::default(),
        }
    }

    pub fn embedding(&self, key: &str) -> Option<Vec<f32>> {
        let found = self.embeddings.get(key);
        self.embedding_counters.observe(found.is_some());
        found
    }

    pub fn store_embedding(&self, key: String, vector: Vec<f32>) {
        self.embeddings.insert(key, vector);
    }

    pub fn transform(&self, key: &str) -> Option<Value> {
        let found = self.transforms.get(key);
        self.transform_counters.observe(found.is_some());
        found
    }

    pub fn store_transform(&self, key: String, output: Value) {
        self.transforms.insert(key, output);
    }

    pub fn search(&self, key: &str) -> Option<Value> {
        let found = self.searches.get(key);
        self.search_counters.observe(found.is_some());
        found
    }

    pub fn store_search(&self, key: String, result: Value) {
        self.searches.insert(key, result);
    }

    /// Content changed somewhere: every cached search result may depend on
    /// it, so the whole search cache goes.
    pub fn invalidate_searches(&self) {
        self.searches.invalidate_all();
    }

    pub fn stats(&self) -> Vec<(&'static str, CacheStats)> {
        vec![
            (
                "embeddings",
                CacheStats {
                    hits: self.embedding_counters.hits.load(Ordering::Relaxed),
                    misses: self.embedding_counters.misses.load(Ordering::Relaxed),
                    entries: self.embeddings.entry_count(),
                },
            ),
            (
                "transforms",
                CacheStats {
                    hits: self.transform_counters.hits.load(Ordering::Relaxed),
                    misses: self.transform_counters.misses.load(Ordering::Relaxed),
                    entries: self.transforms.entry_count(),
                },
            ),
            (
                "searches",
                CacheStats {
                    hits: self.search_counters.hits.load(Ordering::Relaxed),
                    misses: self.search_counters.misses.load(Ordering::Relaxed),
                    entries: self.searches.entry_count(),
                },
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> OperationCache {
        OperationCache::new(&CacheConfig::default())
    }

    #[test]
    fn keys_are_stable_and_argument_sensitive() {
        let a = cache_key("search", &serde_json::json!({"q": "x"}));
        let b = cache_key("search", &serde_json::json!({"q": "x"}));
        let c = cache_key("search", &serde_json::json!({"q": "y"}));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn hit_and_miss_counters_track_lookups() {
        let c = cache();
        assert!(c.embedding("missing").is_none());
        c.store_embedding("k".into(), vec![1.0]);
        assert!(c.embedding("k").is_some());

        let stats = c.stats();
        let (_, embedding_stats) = stats[0];
        assert_eq!(embedding_stats.hits, 1);
        assert_eq!(embedding_stats.misses, 1);
    }

    #[test]
    fn search_invalidation_clears_entries() {
        let c = cache();
        c.store_search("k".into(), serde_json::json!([1, 2]));
        assert!(c.search("k").is_some());
        c.invalidate_searches();
        assert!(c.search("k").is_none());
    }
}
