//! The per-invocation primitive context.
//!
//! A scoped bundle of borrowed references — stores, indices, caches, the
//! operation arena, and the invoking agent — alive for exactly one
//! primitive execution.

use bumpalo::Bump;

use agrama_core::config::EngineConfig;
use agrama_core::models::{AgentSession, NodeId};
use agrama_core::time::Deadline;
use agrama_core::traits::{EmbeddingProvider, Tokenizer};
use agrama_crdt::DocumentRegistry;
use agrama_graph::GraphStore;
use agrama_index::{Bm25Index, HnswIndex};
use agrama_storage::ContentStore;

use crate::cache::OperationCache;
use crate::engine::AgramaEngine;
use crate::transforms::TransformRegistry;

pub struct PrimitiveContext<'e> {
    engine: &'e AgramaEngine,
    /// Operation-scoped bump arena; rewound when the invocation returns.
    pub arena: &'e Bump,
    pub agent_id: &'e str,
    pub deadline: Deadline,
    /// Monotonic microsecond timestamp taken at dispatch.
    pub started_us: u64,
}

impl<'e> PrimitiveContext<'e> {
    pub(crate) fn new(
        engine: &'e AgramaEngine,
        arena: &'e Bump,
        agent_id: &'e str,
        deadline: Deadline,
        started_us: u64,
    ) -> Self {
        Self {
            engine,
            arena,
            agent_id,
            deadline,
            started_us,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    pub fn content(&self) -> &ContentStore {
        self.engine.content()
    }

    pub fn graph(&self) -> &GraphStore {
        self.engine.graph()
    }

    pub fn hnsw(&self) -> &HnswIndex {
        self.engine.hnsw()
    }

    pub fn bm25(&self) -> &Bm25Index {
        self.engine.bm25()
    }

    pub fn docs(&self) -> &DocumentRegistry {
        self.engine.docs()
    }

    pub fn caches(&self) -> &OperationCache {
        self.engine.caches()
    }

    pub fn pools(&self) -> &agrama_pool::PoolSet {
        self.engine.pools()
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.engine.embedder()
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.engine.tokenizer()
    }

    pub fn transforms(&self) -> &TransformRegistry {
        self.engine.transforms()
    }

    /// Canonical display name for a node id, when the engine has seen one.
    pub fn name_of(&self, id: NodeId) -> Option<String> {
        self.engine.name_of(id)
    }

    pub(crate) fn remember_name(&self, id: NodeId, name: &str) {
        self.engine.remember_name(id, name);
    }

    /// The invoking agent's session snapshot.
    pub fn session(&self) -> Option<AgentSession> {
        self.engine.registry().session(self.agent_id)
    }
}
