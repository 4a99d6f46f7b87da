//! # agrama-pool
//!
//! Memory-pool system for the engine's hot paths: fixed-object freelists,
//! operation-scoped bump arenas, and 32-byte-aligned f32 buffers for
//! width-8 SIMD. Acquisition never blocks beyond a freelist mutex;
//! exhaustion falls back transparently to the general allocator and is
//! counted.

pub mod aligned;
pub mod arena;
pub mod fixed;
pub mod stats;

pub use aligned::{AlignedVec, AlignedVecPool};
pub use arena::{ArenaGuard, ArenaPool};
pub use fixed::{FixedPool, Reset};
pub use stats::{PoolCounters, PoolStats};

use agrama_core::config::PoolConfig;
use agrama_core::models::SearchHit;

/// The engine's pre-registered pool budget: one arena pool for primitive
/// scopes, an aligned pool for embedding buffers, and fixed pools for the
/// hot reusable collections.
pub struct PoolSet {
    pub arenas: ArenaPool,
    pub embeddings: AlignedVecPool,
    pub hit_buffers: FixedPool<Vec<SearchHit>>,
    pub byte_buffers: FixedPool<Vec<u8>>,
}

impl PoolSet {
    /// Build every pool from the configured budget.
    pub fn new(config: &PoolConfig, embedding_dimension: usize) -> Self {
        Self {
            arenas: ArenaPool::new(config.arena_pool_size),
            embeddings: AlignedVecPool::new(embedding_dimension, config.aligned_capacity),
            hit_buffers: FixedPool::new(config.fixed_capacity),
            byte_buffers: FixedPool::new(config.fixed_capacity),
        }
    }

    /// Per-pool counter snapshots for observability.
    pub fn stats(&self) -> Vec<(&'static str, PoolStats)> {
        vec![
            ("arena", self.arenas.counters().snapshot()),
            ("aligned", self.embeddings.counters().snapshot()),
            ("hit_buffers", self.hit_buffers.counters().snapshot()),
            ("byte_buffers", self.byte_buffers.counters().snapshot()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_set_builds_from_config() {
        let set = PoolSet::new(&PoolConfig::default(), 64);
        let stats = set.stats();
        assert_eq!(stats.len(), 4);
        assert!(stats.iter().all(|(_, s)| s.acquired == 0));
    }
}
