//! Engine configuration tree.
//!
//! One sub-config per subsystem, all serde-deserializable with full
//! defaults so an empty TOML file is a valid configuration.

pub mod defaults;

use serde::{Deserialize, Serialize};

/// Memory-pool budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Capacity of each fixed-object pool.
    pub fixed_capacity: usize,
    /// Number of bump arenas kept warm.
    pub arena_pool_size: usize,
    /// Capacity of the aligned embedding-buffer pool.
    pub aligned_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            fixed_capacity: defaults::DEFAULT_POOL_CAPACITY,
            arena_pool_size: defaults::DEFAULT_ARENA_POOL_SIZE,
            aligned_capacity: defaults::DEFAULT_POOL_CAPACITY,
        }
    }
}

/// Content-store policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Shard count for the path map (rounded up to a power of two).
    pub shards: usize,
    /// Every Nth version is a full anchor snapshot.
    pub anchor_interval: usize,
    /// Total byte budget across all paths.
    pub budget_bytes: u64,
    /// Logical root all paths must stay inside.
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            shards: defaults::DEFAULT_STORE_SHARDS,
            anchor_interval: defaults::DEFAULT_ANCHOR_INTERVAL,
            budget_bytes: defaults::DEFAULT_STORAGE_BUDGET_BYTES,
            root: String::new(),
        }
    }
}

/// HNSW index parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswConfig {
    /// Max neighbors per node on upper layers; layer 0 allows 2M.
    pub m: usize,
    /// Candidate beam width during insertion.
    pub ef_construction: usize,
    /// Default candidate beam width during queries.
    pub ef_search: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: defaults::DEFAULT_HNSW_M,
            ef_construction: defaults::DEFAULT_HNSW_EF_CONSTRUCTION,
            ef_search: defaults::DEFAULT_HNSW_EF_SEARCH,
        }
    }
}

/// BM25 scoring parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: defaults::DEFAULT_BM25_K1,
            b: defaults::DEFAULT_BM25_B,
        }
    }
}

/// Embedding shape shared by the index and the embedder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Full vector dimension.
    pub dimension: usize,
    /// Matryoshka prefix resolutions, ascending; last equals `dimension`.
    pub matryoshka_dims: Vec<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: defaults::DEFAULT_EMBEDDING_DIMENSION,
            matryoshka_dims: defaults::DEFAULT_MATRYOSHKA_DIMS.to_vec(),
        }
    }
}

/// Shortest-path traversal defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Default distance bound when a query does not supply one.
    pub default_bound: f64,
    /// Default hop limit for graph-mode search.
    pub max_depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            default_bound: defaults::DEFAULT_TRAVERSAL_BOUND,
            max_depth: defaults::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Operation-cache capacities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub embedding_entries: u64,
    pub transform_entries: u64,
    pub search_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            embedding_entries: defaults::DEFAULT_CACHE_CAPACITY,
            transform_entries: defaults::DEFAULT_CACHE_CAPACITY,
            search_entries: defaults::DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pool: PoolConfig,
    pub storage: StorageConfig,
    pub hnsw: HnswConfig,
    pub bm25: Bm25Config,
    pub embedding: EmbeddingConfig,
    pub traversal: TraversalConfig,
    pub cache: CacheConfig,
    /// Max concurrent primitive invocations (backpressure threshold).
    pub max_in_flight: usize,
}

impl EngineConfig {
    /// A config with every knob at its default.
    pub fn standard() -> Self {
        Self {
            max_in_flight: defaults::DEFAULT_MAX_IN_FLIGHT,
            ..Self::default()
        }
    }
}
