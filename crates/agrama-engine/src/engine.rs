//! The engine: owns every store and index for the process lifetime,
//! dispatches primitives, and records provenance for each invocation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use serde_json::{json, Value};
use tracing::{debug, warn};

use agrama_core::config::EngineConfig;
use agrama_core::errors::{AgramaResult, ValidationError};
use agrama_core::models::{ActivityRecord, NodeId, OperationLogEntry};
use agrama_core::time::{now_micros, Deadline};
use agrama_core::traits::{EmbeddingProvider, Tokenizer};
use agrama_crdt::DocumentRegistry;
use agrama_graph::GraphStore;
use agrama_index::embedding::EmbeddingShape;
use agrama_index::{Bm25Index, DefaultTokenizer, HnswIndex, StatisticalEmbedder};
use agrama_pool::PoolSet;
use agrama_storage::ContentStore;

use crate::cache::OperationCache;
use crate::context::PrimitiveContext;
use crate::oplog::OperationLog;
use crate::primitives;
use crate::registry::AgentRegistry;
use crate::transforms::TransformRegistry;

/// The temporal knowledge-graph engine.
///
/// One instance per process; all configuration is carried here and
/// threaded through [`PrimitiveContext`] — there is no global state.
pub struct AgramaEngine {
    config: EngineConfig,
    pools: PoolSet,
    content: ContentStore,
    graph: GraphStore,
    hnsw: HnswIndex,
    bm25: Bm25Index,
    docs: DocumentRegistry,
    registry: AgentRegistry,
    oplog: OperationLog,
    caches: OperationCache,
    embedder: Arc<dyn EmbeddingProvider>,
    tokenizer: Arc<dyn Tokenizer>,
    transforms: TransformRegistry,
    /// NodeId → canonical name, for resolving search hits back to keys.
    names: DashMap<NodeId, String>,
    in_flight: AtomicUsize,
}

impl AgramaEngine {
    /// Build an engine with the statistical fallback embedder.
    pub fn new(config: EngineConfig) -> Self {
        let dimension = config.embedding.dimension;
        Self::with_embedder(config, Arc::new(StatisticalEmbedder::new(dimension)))
    }

    /// Build an engine around an external embedding provider. Falls back
    /// to the statistical embedder when the provider reports unavailable.
    pub fn with_embedder(config: EngineConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let embedder: Arc<dyn EmbeddingProvider> = if embedder.is_available() {
            embedder
        } else {
            warn!(
                provider = embedder.name(),
                "embedder unavailable, using statistical fallback"
            );
            Arc::new(StatisticalEmbedder::new(config.embedding.dimension))
        };

        let shape = EmbeddingShape::new(
            config.embedding.dimension,
            config.embedding.matryoshka_dims.clone(),
        );
        Self {
            pools: PoolSet::new(&config.pool, config.embedding.dimension),
            content: ContentStore::new(config.storage.clone()),
            graph: GraphStore::new(),
            hnsw: HnswIndex::new(config.hnsw.clone(), shape),
            bm25: Bm25Index::new(config.bm25.clone()),
            docs: DocumentRegistry::new(),
            registry: AgentRegistry::new(),
            oplog: OperationLog::new(),
            caches: OperationCache::new(&config.cache),
            embedder,
            tokenizer: Arc::new(DefaultTokenizer),
            transforms: TransformRegistry::standard(),
            names: DashMap::new(),
            in_flight: AtomicUsize::new(0),
            config,
        }
    }

    /// Invoke one primitive on behalf of an agent.
    ///
    /// Uniform contract: arguments are validated first; the invocation
    /// runs inside a freshly acquired arena released on every exit path;
    /// exactly one operation-log entry and one activity record are
    /// emitted; the agent's session counter advances whether or not the
    /// primitive succeeds.
    pub fn invoke(
        &self,
        primitive: &str,
        args: &Value,
        agent_id: &str,
        deadline: Deadline,
    ) -> AgramaResult<Value> {
        let _depth = DepthGuard::enter(&self.in_flight);
        self.registry.touch(agent_id);

        let seq = self.oplog.next_seq();
        let started_us = now_micros();
        let started = Instant::now();

        let result = {
            let arena = self.pools.arenas.acquire();
            let ctx = PrimitiveContext::new(self, &arena, agent_id, deadline, started_us);
            deadline
                .checkpoint()
                .and_then(|_| dispatch(&ctx, primitive, args))
        };

        self.registry.record_operation(agent_id);
        let result_bytes = match &result {
            Ok(value) => {
                // Serialize into a pooled scratch buffer; only the length
                // is kept.
                let mut buf = self.pools.byte_buffers.acquire();
                let _ = serde_json::to_writer(&mut buf, value);
                let n = buf.len();
                self.pools.byte_buffers.release(buf);
                n
            }
            Err(_) => 0,
        };
        self.oplog.append(OperationLogEntry {
            seq,
            primitive: primitive.to_string(),
            agent_id: agent_id.to_string(),
            started_us,
            elapsed_ns: started.elapsed().as_nanos() as u64,
            success: result.is_ok(),
            result_bytes,
        });
        self.registry.record_activity(ActivityRecord {
            seq,
            agent_id: agent_id.to_string(),
            primitive: primitive.to_string(),
            target: target_of(primitive, args),
            timestamp_us: started_us,
            success: result.is_ok(),
        });

        if let Err(err) = &result {
            debug!(primitive, agent = agent_id, error = %err, kind = err.kind(), "primitive failed");
        }
        result
    }

    /// Register an agent with a display name and capability tags.
    pub fn register_agent(&self, agent_id: &str, display_name: &str, capabilities: Vec<String>) {
        self.registry.register(agent_id, display_name, capabilities);
    }

    /// Pending-invocation gauge for transport backpressure.
    pub fn queue_depth(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Aggregated observability snapshot.
    pub fn stats(&self) -> Value {
        json!({
            "content": self.content.stats(),
            "graph": self.graph.stats(),
            "hnsw": self.hnsw.stats(),
            "lexical_docs": self.bm25.doc_count(),
            "documents": self.docs.len(),
            "agents": self.registry.agent_count(),
            "operations": self.oplog.len(),
            "queue_depth": self.queue_depth(),
            "pools": self.pools.stats().into_iter().collect::<std::collections::BTreeMap<_, _>>(),
            "caches": self.caches.stats().into_iter().collect::<std::collections::BTreeMap<_, _>>(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn hnsw(&self) -> &HnswIndex {
        &self.hnsw
    }

    pub fn bm25(&self) -> &Bm25Index {
        &self.bm25
    }

    pub fn docs(&self) -> &DocumentRegistry {
        &self.docs
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn oplog(&self) -> &OperationLog {
        &self.oplog
    }

    pub fn caches(&self) -> &OperationCache {
        &self.caches
    }

    pub fn pools(&self) -> &PoolSet {
        &self.pools
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    pub fn name_of(&self, id: NodeId) -> Option<String> {
        self.names.get(&id).map(|n| n.clone())
    }

    pub(crate) fn remember_name(&self, id: NodeId, name: &str) {
        self.names.insert(id, name.to_string());
    }
}

/// Name → handler dispatch.
fn dispatch(ctx: &PrimitiveContext<'_>, primitive: &str, args: &Value) -> AgramaResult<Value> {
    match primitive {
        "store" => primitives::store::run(ctx, args),
        "retrieve" => primitives::retrieve::run(ctx, args),
        "search" => primitives::search::run(ctx, args),
        "link" => primitives::link::run(ctx, args),
        "transform" => primitives::transform::run(ctx, args),
        name => Err(ValidationError::UnknownPrimitive {
            name: name.to_string(),
        }
        .into()),
    }
}

/// A short human-readable target for the activity feed.
fn target_of(primitive: &str, args: &Value) -> String {
    let field = match primitive {
        "store" | "retrieve" => "key",
        "search" => "query",
        "link" => "from",
        "transform" => "op",
        _ => return String::new(),
    };
    args.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .chars()
        .take(80)
        .collect()
}

struct DepthGuard<'a> {
    gauge: &'a AtomicUsize,
}

impl<'a> DepthGuard<'a> {
    fn enter(gauge: &'a AtomicUsize) -> Self {
        gauge.fetch_add(1, Ordering::Relaxed);
        Self { gauge }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.gauge.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AgramaEngine {
        AgramaEngine::new(EngineConfig::standard())
    }

    #[test]
    fn unknown_primitive_is_rejected_but_logged() {
        let e = engine();
        let err = e
            .invoke("explode", &json!({}), "a1", Deadline::none())
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(e.oplog().len(), 1);
        assert!(!e.oplog().tail(1)[0].success);
        assert_eq!(e.registry().session("a1").unwrap().operations, 1);
    }

    #[test]
    fn session_counter_advances_on_success_and_failure() {
        let e = engine();
        e.invoke(
            "store",
            &json!({"key": "k.txt", "value": "v"}),
            "a1",
            Deadline::none(),
        )
        .unwrap();
        let _ = e.invoke("store", &json!({}), "a1", Deadline::none());
        assert_eq!(e.registry().session("a1").unwrap().operations, 2);
    }

    #[test]
    fn expired_deadline_cancels_before_dispatch() {
        let e = engine();
        let err = e
            .invoke(
                "store",
                &json!({"key": "k.txt", "value": "v"}),
                "a1",
                Deadline::after_millis(0),
            )
            .unwrap_err();
        assert_eq!(err.kind(), "cancelled");
        assert!(e.content().get("k.txt").is_err(), "no partial write");
    }

    #[test]
    fn queue_depth_is_zero_when_idle() {
        let e = engine();
        assert_eq!(e.queue_depth(), 0);
        e.invoke(
            "store",
            &json!({"key": "k.txt", "value": "v"}),
            "a1",
            Deadline::none(),
        )
        .unwrap();
        assert_eq!(e.queue_depth(), 0);
    }

    #[test]
    fn activity_feed_records_every_call() {
        let e = engine();
        e.invoke(
            "store",
            &json!({"key": "a.txt", "value": "v"}),
            "a1",
            Deadline::none(),
        )
        .unwrap();
        let _ = e.invoke("search", &json!({"query": "v", "mode": "nope"}), "a2", Deadline::none());

        let feed = e.registry().activity_tail(0);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].primitive, "store");
        assert_eq!(feed[0].target, "a.txt");
        assert!(feed[0].success);
        assert!(!feed[1].success);
    }
}
