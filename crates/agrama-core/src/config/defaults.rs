//! Named default values for every config knob.

/// Full embedding dimension.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;

/// Matryoshka prefix resolutions (must include the full dimension).
pub const DEFAULT_MATRYOSHKA_DIMS: [usize; 3] = [64, 256, 768];

/// HNSW max neighbors per upper layer; layer 0 allows twice this.
pub const DEFAULT_HNSW_M: usize = 16;

/// HNSW construction beam width.
pub const DEFAULT_HNSW_EF_CONSTRUCTION: usize = 200;

/// HNSW default query beam width.
pub const DEFAULT_HNSW_EF_SEARCH: usize = 64;

/// BM25 term-frequency saturation.
pub const DEFAULT_BM25_K1: f32 = 1.2;

/// BM25 length-normalization strength.
pub const DEFAULT_BM25_B: f32 = 0.75;

/// Content-store shard count (power of two).
pub const DEFAULT_STORE_SHARDS: usize = 64;

/// Full snapshot every Nth version; the rest are reverse deltas.
pub const DEFAULT_ANCHOR_INTERVAL: usize = 10;

/// Content-store byte budget (1 GiB).
pub const DEFAULT_STORAGE_BUDGET_BYTES: u64 = 1 << 30;

/// Fixed-pool capacity per pooled type.
pub const DEFAULT_POOL_CAPACITY: usize = 4096;

/// Arena count kept warm for primitive scopes.
pub const DEFAULT_ARENA_POOL_SIZE: usize = 64;

/// Per-cache entry capacity for operation caches.
pub const DEFAULT_CACHE_CAPACITY: u64 = 2048;

/// Default shortest-path distance bound.
pub const DEFAULT_TRAVERSAL_BOUND: f64 = 50.0;

/// Default max hops for graph-mode search.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Maximum concurrent primitive invocations before the transport should
/// shed load.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 256;
