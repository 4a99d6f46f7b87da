//! The graph store.
//!
//! Nodes live in a flat arena; edges are index pairs into that arena, so
//! cyclic structures never cross-own. Each node's forward and reverse
//! adjacency is an `Arc`-snapshot swapped under a per-node lock: readers
//! clone the `Arc` and iterate without blocking writers. Edge insertion
//! locks the two endpoints in ascending NodeId order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::trace;

use agrama_core::errors::{AgramaResult, GraphError};
use agrama_core::models::{Direction, GraphEdge, GraphNode, NodeId, Relation};

/// One edge record inside an adjacency snapshot. `peer` is the arena index
/// of the other endpoint.
#[derive(Debug, Clone)]
pub(crate) struct EdgeRec {
    pub peer: u32,
    pub peer_id: NodeId,
    pub relation: Relation,
    pub weight: f64,
    pub attrs: BTreeMap<String, serde_json::Value>,
}

pub(crate) struct NodeSlot {
    pub node: RwLock<GraphNode>,
    pub out_edges: RwLock<Arc<Vec<EdgeRec>>>,
    pub in_edges: RwLock<Arc<Vec<EdgeRec>>>,
}

/// Node and edge counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: u64,
}

/// Typed directed graph with stable node identities.
pub struct GraphStore {
    arena: RwLock<Vec<Arc<NodeSlot>>>,
    index: DashMap<NodeId, u32>,
    edge_count: AtomicU64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            arena: RwLock::new(Vec::new()),
            index: DashMap::new(),
            edge_count: AtomicU64::new(0),
        }
    }

    /// Insert or update a node. Idempotent on NodeId: a second upsert
    /// overwrites kind, name, and attributes, never the identity.
    pub fn upsert_node(&self, node: GraphNode) -> u32 {
        if let Some(idx) = self.index.get(&node.id).map(|r| *r) {
            let arena = self.arena.read();
            *arena[idx as usize].node.write() = node;
            return idx;
        }

        // Slow path: take the arena write lock, then re-check the index so
        // two racing upserts of the same id agree on one slot.
        let mut arena = self.arena.write();
        if let Some(idx) = self.index.get(&node.id).map(|r| *r) {
            *arena[idx as usize].node.write() = node;
            return idx;
        }
        let idx = arena.len() as u32;
        let id = node.id;
        arena.push(Arc::new(NodeSlot {
            node: RwLock::new(node),
            out_edges: RwLock::new(Arc::new(Vec::new())),
            in_edges: RwLock::new(Arc::new(Vec::new())),
        }));
        self.index.insert(id, idx);
        trace!(node = %id, idx, "node added");
        idx
    }

    /// Arena index for a node id.
    pub(crate) fn resolve(&self, id: NodeId) -> Option<u32> {
        self.index.get(&id).map(|r| *r)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Clone of a node's current state.
    pub fn node(&self, id: NodeId) -> Option<GraphNode> {
        let idx = self.resolve(id)?;
        let arena = self.arena.read();
        let value = arena[idx as usize].node.read().clone();
        Some(value)
    }

    pub(crate) fn slot(&self, idx: u32) -> Arc<NodeSlot> {
        Arc::clone(&self.arena.read()[idx as usize])
    }

    pub(crate) fn node_count(&self) -> usize {
        self.arena.read().len()
    }

    pub(crate) fn edge_total(&self) -> u64 {
        self.edge_count.load(Ordering::Relaxed)
    }

    /// Insert or update the edge `(src, dst, relation)`.
    ///
    /// Both endpoints must exist. Forward and reverse adjacency are updated
    /// together under the two endpoint locks, taken in ascending NodeId
    /// order. A duplicate triple coalesces last-writer-wins on weight and
    /// attributes. Returns `true` when a new edge was created.
    ///
    /// # Errors
    /// `EndpointMissing` if either endpoint is unknown; `NegativeWeight`
    /// for weights below zero (they would break shortest-path semantics).
    pub fn add_edge(
        &self,
        src: NodeId,
        dst: NodeId,
        relation: Relation,
        weight: f64,
        attrs: BTreeMap<String, serde_json::Value>,
    ) -> AgramaResult<bool> {
        if !(weight >= 0.0) {
            return Err(GraphError::NegativeWeight { weight }.into());
        }
        let src_idx = self.resolve(src).ok_or(GraphError::EndpointMissing {
            src: src.raw(),
            dst: dst.raw(),
            which: "source",
        })?;
        let dst_idx = self.resolve(dst).ok_or(GraphError::EndpointMissing {
            src: src.raw(),
            dst: dst.raw(),
            which: "target",
        })?;

        let (src_slot, dst_slot) = {
            let arena = self.arena.read();
            (
                Arc::clone(&arena[src_idx as usize]),
                Arc::clone(&arena[dst_idx as usize]),
            )
        };

        // Self-loop: one slot, one lock.
        if src_idx == dst_idx {
            let mut out = src_slot.out_edges.write();
            let created = Self::upsert_rec(&mut out, dst_idx, dst, &relation, weight, &attrs);
            let mut inn = src_slot.in_edges.write();
            Self::upsert_rec(&mut inn, src_idx, src, &relation, weight, &attrs);
            if created {
                self.edge_count.fetch_add(1, Ordering::Relaxed);
            }
            return Ok(created);
        }

        // Consistent acquisition order: lower NodeId first.
        let created = if src < dst {
            let mut out = src_slot.out_edges.write();
            let mut inn = dst_slot.in_edges.write();
            let created = Self::upsert_rec(&mut out, dst_idx, dst, &relation, weight, &attrs);
            Self::upsert_rec(&mut inn, src_idx, src, &relation, weight, &attrs);
            created
        } else {
            let mut inn = dst_slot.in_edges.write();
            let mut out = src_slot.out_edges.write();
            let created = Self::upsert_rec(&mut out, dst_idx, dst, &relation, weight, &attrs);
            Self::upsert_rec(&mut inn, src_idx, src, &relation, weight, &attrs);
            created
        };

        if created {
            self.edge_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(created)
    }

    /// Replace-or-append into one adjacency snapshot.
    fn upsert_rec(
        list: &mut Arc<Vec<EdgeRec>>,
        peer: u32,
        peer_id: NodeId,
        relation: &Relation,
        weight: f64,
        attrs: &BTreeMap<String, serde_json::Value>,
    ) -> bool {
        let mut next: Vec<EdgeRec> = (**list).clone();
        let existing = next
            .iter_mut()
            .find(|e| e.peer == peer && e.relation == *relation);
        let created = match existing {
            Some(rec) => {
                rec.weight = weight;
                rec.attrs = attrs.clone();
                false
            }
            None => {
                next.push(EdgeRec {
                    peer,
                    peer_id,
                    relation: relation.clone(),
                    weight,
                    attrs: attrs.clone(),
                });
                true
            }
        };
        *list = Arc::new(next);
        created
    }

    /// Edges adjacent to `id` in the given direction, optionally filtered
    /// by relation. The result is a consistent snapshot.
    pub fn neighbors(
        &self,
        id: NodeId,
        direction: Direction,
        relation: Option<&Relation>,
    ) -> AgramaResult<Vec<GraphEdge>> {
        let idx = self.resolve(id).ok_or(GraphError::NodeNotFound { id: id.raw() })?;
        let slot = self.slot(idx);

        let mut out = Vec::new();
        if matches!(direction, Direction::Out | Direction::Both) {
            let snapshot = Arc::clone(&slot.out_edges.read());
            for rec in snapshot.iter() {
                if relation.map_or(true, |r| *r == rec.relation) {
                    out.push(GraphEdge {
                        src: id,
                        dst: rec.peer_id,
                        relation: rec.relation.clone(),
                        weight: rec.weight,
                        attrs: rec.attrs.clone(),
                    });
                }
            }
        }
        if matches!(direction, Direction::In | Direction::Both) {
            let snapshot = Arc::clone(&slot.in_edges.read());
            for rec in snapshot.iter() {
                if relation.map_or(true, |r| *r == rec.relation) {
                    out.push(GraphEdge {
                        src: rec.peer_id,
                        dst: id,
                        relation: rec.relation.clone(),
                        weight: rec.weight,
                        attrs: rec.attrs.clone(),
                    });
                }
            }
        }
        Ok(out)
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.node_count(),
            edges: self.edge_total(),
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
