//! Hierarchical navigable small-world index.
//!
//! Layered proximity graph: every node lives on layer 0, exponentially
//! fewer on each layer above, entry point at the top. Queries greedy-
//! descend the upper layers and run a bounded best-first search on layer
//! 0. Neighbor selection prefers diverse directions over raw closeness,
//! which is what keeps the small-world property under clustered data.
//!
//! Concurrency: queries take no exclusive locks; insertion locks one
//! node's neighbor list at a time during rewiring; the entry point is a
//! packed compare-and-swap word.

mod select;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use agrama_core::config::HnswConfig;
use agrama_core::errors::{AgramaResult, IndexError};
use agrama_core::models::NodeId;

use crate::embedding::{Embedding, EmbeddingShape};

use select::select_diverse;

/// Entry-point word: level in the high 32 bits, slab index in the low.
const EMPTY_ENTRY: u64 = u64::MAX;

fn pack_entry(level: usize, idx: u32) -> u64 {
    ((level as u64) << 32) | idx as u64
}

fn unpack_entry(word: u64) -> (usize, u32) {
    ((word >> 32) as usize, word as u32)
}

pub(crate) struct HnswNode {
    pub id: NodeId,
    pub embedding: Embedding,
    /// neighbors[layer]; the vector's length is the node's level + 1.
    pub neighbors: RwLock<Vec<Vec<u32>>>,
    pub deleted: AtomicBool,
}

/// One scored semantic hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemanticHit {
    pub id: NodeId,
    /// Cosine similarity to the query, higher = closer.
    pub score: f32,
}

/// Index statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct HnswStats {
    pub live: usize,
    pub slots: usize,
    pub top_level: usize,
}

/// The HNSW index.
pub struct HnswIndex {
    config: HnswConfig,
    shape: EmbeddingShape,
    nodes: RwLock<Vec<Arc<HnswNode>>>,
    id_index: DashMap<NodeId, u32>,
    entry: AtomicU64,
    live: AtomicUsize,
    rng: Mutex<StdRng>,
    /// Level-sampling factor 1/ln(M).
    ml: f64,
}

impl HnswIndex {
    pub fn new(config: HnswConfig, shape: EmbeddingShape) -> Self {
        Self::with_seed(config, shape, rand::random())
    }

    /// Deterministic level sampling, for tests and replay.
    pub fn with_seed(config: HnswConfig, shape: EmbeddingShape, seed: u64) -> Self {
        let ml = 1.0 / (config.m.max(2) as f64).ln();
        Self {
            config,
            shape,
            nodes: RwLock::new(Vec::new()),
            id_index: DashMap::new(),
            entry: AtomicU64::new(EMPTY_ENTRY),
            live: AtomicUsize::new(0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ml,
        }
    }

    pub fn len(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn stats(&self) -> HnswStats {
        let word = self.entry.load(Ordering::Acquire);
        HnswStats {
            live: self.len(),
            slots: self.nodes.read().len(),
            top_level: if word == EMPTY_ENTRY {
                0
            } else {
                unpack_entry(word).0
            },
        }
    }

    /// Sample an insertion level: floor(−ln(U) · mL).
    fn sample_level(&self) -> usize {
        let u: f64 = self.rng.lock().gen::<f64>().max(f64::MIN_POSITIVE);
        (-u.ln() * self.ml).floor() as usize
    }

    fn distance(&self, a: &Embedding, b: &Embedding, resolution: usize) -> f32 {
        1.0 - a.similarity_at(b, resolution)
    }

    /// Insert a vector under `id`. Re-inserting an id replaces its vector
    /// (the old node becomes a tombstone).
    ///
    /// # Errors
    /// `DimensionMismatch` if the vector is not the index's full dimension.
    pub fn insert(&self, id: NodeId, values: &[f32]) -> AgramaResult<()> {
        let embedding = Embedding::new(values, &self.shape)?;
        let level = self.sample_level();
        let full = self.shape.dimension;

        if let Some(old_idx) = self.id_index.get(&id).map(|r| *r) {
            let nodes = self.nodes.read();
            nodes[old_idx as usize].deleted.store(true, Ordering::Release);
            self.live.fetch_sub(1, Ordering::Relaxed);
        }

        let new_idx = {
            let mut nodes = self.nodes.write();
            let idx = nodes.len() as u32;
            nodes.push(Arc::new(HnswNode {
                id,
                embedding,
                neighbors: RwLock::new(vec![Vec::new(); level + 1]),
                deleted: AtomicBool::new(false),
            }));
            idx
        };
        self.id_index.insert(id, new_idx);
        self.live.fetch_add(1, Ordering::Relaxed);

        // First node becomes the entry point.
        if self
            .entry
            .compare_exchange(
                EMPTY_ENTRY,
                pack_entry(level, new_idx),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            trace!(node = %id, level, "hnsw entry point seeded");
            return Ok(());
        }

        let nodes = self.nodes.read();
        let query = &nodes[new_idx as usize].embedding;
        let (entry_level, entry_idx) = unpack_entry(self.entry.load(Ordering::Acquire));

        // Greedy descent through layers above the new node's level.
        let mut current = entry_idx;
        let mut layer = entry_level;
        while layer > level {
            current = self.greedy_step(&nodes, query, current, layer, full);
            layer -= 1;
        }

        // Wire layers level..=0 with a bounded best-first candidate search.
        let mut entries = vec![current];
        for l in (0..=level.min(entry_level)).rev() {
            let candidates = self.search_layer(
                &nodes,
                query,
                &entries,
                self.config.ef_construction,
                l,
                full,
            );
            let cap = self.layer_cap(l);
            let selected = select_diverse(&candidates, cap, |a, b| {
                self.distance(
                    &nodes[a as usize].embedding,
                    &nodes[b as usize].embedding,
                    full,
                )
            });
            for &(_, peer) in &selected {
                self.link(&nodes, new_idx, peer, l);
            }
            entries = candidates.iter().map(|&(_, idx)| idx).collect();
        }

        // Promote the entry point if the new node out-levels it.
        let mut cur = self.entry.load(Ordering::Acquire);
        while level > unpack_entry(cur).0 {
            match self.entry.compare_exchange(
                cur,
                pack_entry(level, new_idx),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => cur = observed,
            }
        }
        Ok(())
    }

    /// Tombstone a vector. Links remain; results skip it.
    pub fn remove(&self, id: NodeId) -> bool {
        let Some((_, idx)) = self.id_index.remove(&id) else {
            return false;
        };
        let nodes = self.nodes.read();
        if !nodes[idx as usize].deleted.swap(true, Ordering::AcqRel) {
            self.live.fetch_sub(1, Ordering::Relaxed);
        }
        true
    }

    /// k approximate nearest neighbors by cosine similarity.
    ///
    /// `resolution` selects a Matryoshka prefix; `None` compares at full
    /// dimension. Queries against an empty index return an empty list.
    ///
    /// # Errors
    /// `DimensionMismatch` for a wrong-length query, `BadResolution` for a
    /// prefix length the index was not configured with.
    pub fn search(
        &self,
        query_values: &[f32],
        k: usize,
        ef: usize,
        resolution: Option<usize>,
    ) -> AgramaResult<Vec<SemanticHit>> {
        let resolution = match resolution {
            Some(r) if !self.shape.supports(r) => {
                return Err(IndexError::BadResolution {
                    resolution: r,
                    full: self.shape.dimension,
                }
                .into())
            }
            Some(r) => r,
            None => self.shape.dimension,
        };
        let query = Embedding::new(query_values, &self.shape)?;

        let word = self.entry.load(Ordering::Acquire);
        if word == EMPTY_ENTRY || k == 0 {
            return Ok(Vec::new());
        }
        let (entry_level, entry_idx) = unpack_entry(word);
        let nodes = self.nodes.read();

        let mut current = entry_idx;
        for layer in (1..=entry_level).rev() {
            current = self.greedy_step(&nodes, &query, current, layer, resolution);
        }

        let ef = ef.max(k);
        let mut candidates = self.search_layer(&nodes, &query, &[current], ef, 0, resolution);
        candidates.retain(|&(_, idx)| !nodes[idx as usize].deleted.load(Ordering::Acquire));
        candidates.truncate(k);

        Ok(candidates
            .into_iter()
            .map(|(dist, idx)| SemanticHit {
                id: nodes[idx as usize].id,
                score: 1.0 - dist,
            })
            .collect())
    }

    fn layer_cap(&self, layer: usize) -> usize {
        if layer == 0 {
            self.config.m * 2
        } else {
            self.config.m
        }
    }

    /// One greedy hill-climb at `layer`: repeatedly move to the closest
    /// neighbor until no neighbor improves on the current node.
    fn greedy_step(
        &self,
        nodes: &[Arc<HnswNode>],
        query: &Embedding,
        start: u32,
        layer: usize,
        resolution: usize,
    ) -> u32 {
        let mut current = start;
        let mut best = self.distance(query, &nodes[current as usize].embedding, resolution);
        loop {
            let mut improved = false;
            let neighbors = {
                let guard = nodes[current as usize].neighbors.read();
                guard.get(layer).cloned().unwrap_or_default()
            };
            for peer in neighbors {
                let d = self.distance(query, &nodes[peer as usize].embedding, resolution);
                if d < best {
                    best = d;
                    current = peer;
                    improved = true;
                }
            }
            if !improved {
                return current;
            }
        }
    }

    /// Bounded best-first search at one layer. Returns up to `ef`
    /// candidates as (distance, index), closest first.
    fn search_layer(
        &self,
        nodes: &[Arc<HnswNode>],
        query: &Embedding,
        entries: &[u32],
        ef: usize,
        layer: usize,
        resolution: usize,
    ) -> Vec<(f32, u32)> {
        let mut visited: HashSet<u32> = HashSet::new();
        // Min-heap of frontier candidates and max-heap of current results,
        // both keyed on distance bits (nonnegative floats order by bits).
        let mut frontier: std::collections::BinaryHeap<std::cmp::Reverse<(u32, u32)>> =
            std::collections::BinaryHeap::new();
        let mut results: std::collections::BinaryHeap<(u32, u32)> =
            std::collections::BinaryHeap::new();

        for &e in entries {
            if !visited.insert(e) {
                continue;
            }
            let d = self.distance(query, &nodes[e as usize].embedding, resolution);
            frontier.push(std::cmp::Reverse((d.to_bits(), e)));
            results.push((d.to_bits(), e));
        }

        while let Some(std::cmp::Reverse((d_bits, idx))) = frontier.pop() {
            let worst = results.peek().map(|&(w, _)| w).unwrap_or(u32::MAX);
            if results.len() >= ef && d_bits > worst {
                break;
            }
            let neighbors = {
                let guard = nodes[idx as usize].neighbors.read();
                guard.get(layer).cloned().unwrap_or_default()
            };
            for peer in neighbors {
                if !visited.insert(peer) {
                    continue;
                }
                let d = self.distance(query, &nodes[peer as usize].embedding, resolution);
                let worst = results.peek().map(|&(w, _)| w).unwrap_or(u32::MAX);
                if results.len() < ef || d.to_bits() < worst {
                    frontier.push(std::cmp::Reverse((d.to_bits(), peer)));
                    results.push((d.to_bits(), peer));
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut out: Vec<(f32, u32)> = results
            .into_iter()
            .map(|(bits, idx)| (f32::from_bits(bits), idx))
            .collect();
        out.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        out
    }

    /// Add the bidirectional link (a, b) at `layer`, pruning either side
    /// that exceeds its cap with the same diversity heuristic. Locks one
    /// neighbor list at a time.
    fn link(&self, nodes: &[Arc<HnswNode>], a: u32, b: u32, layer: usize) {
        let full = self.shape.dimension;
        let cap = self.layer_cap(layer);
        for (from, to) in [(a, b), (b, a)] {
            let node = &nodes[from as usize];
            let mut guard = node.neighbors.write();
            let Some(list) = guard.get_mut(layer) else {
                continue; // peer's level is below this layer
            };
            if list.contains(&to) {
                continue;
            }
            list.push(to);
            if list.len() > cap {
                let ranked: Vec<(f32, u32)> = {
                    let mut v: Vec<(f32, u32)> = list
                        .iter()
                        .map(|&p| {
                            (
                                self.distance(
                                    &node.embedding,
                                    &nodes[p as usize].embedding,
                                    full,
                                ),
                                p,
                            )
                        })
                        .collect();
                    v.sort_by(|x, y| x.0.total_cmp(&y.0));
                    v
                };
                let kept = select_diverse(&ranked, cap, |x, y| {
                    self.distance(
                        &nodes[x as usize].embedding,
                        &nodes[y as usize].embedding,
                        full,
                    )
                });
                *list = kept.into_iter().map(|(_, p)| p).collect();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(dim: usize) -> EmbeddingShape {
        EmbeddingShape::new(dim, vec![dim / 2, dim])
    }

    fn index(dim: usize) -> HnswIndex {
        HnswIndex::with_seed(HnswConfig::default(), shape(dim), 42)
    }

    fn id(n: u64) -> NodeId {
        NodeId(n)
    }

    fn axis(dim: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[axis] = 1.0;
        v
    }

    #[test]
    fn empty_index_returns_empty_not_error() {
        let idx = index(8);
        let hits = idx.search(&axis(8, 0), 5, 16, None).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let idx = index(8);
        assert!(idx.insert(id(1), &[1.0, 2.0]).is_err());
        assert!(idx.search(&[1.0, 2.0], 5, 16, None).is_err());
    }

    #[test]
    fn finds_exact_match_first() {
        let idx = index(8);
        for i in 0..8 {
            idx.insert(id(i as u64), &axis(8, i)).unwrap();
        }
        let hits = idx.search(&axis(8, 3), 3, 32, None).unwrap();
        assert_eq!(hits[0].id, id(3));
        assert!((hits[0].score - 1.0).abs() < 1e-4);
    }

    #[test]
    fn returns_exactly_k_when_enough_live() {
        let idx = index(8);
        for i in 0..20u64 {
            let mut v = axis(8, (i % 8) as usize);
            v[(i as usize + 1) % 8] = 0.3;
            idx.insert(id(i), &v).unwrap();
        }
        let hits = idx.search(&axis(8, 0), 10, 32, None).unwrap();
        assert_eq!(hits.len(), 10);
        // Best-first order.
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn removed_ids_disappear_from_results() {
        let idx = index(8);
        for i in 0..8 {
            idx.insert(id(i as u64), &axis(8, i)).unwrap();
        }
        assert!(idx.remove(id(3)));
        let hits = idx.search(&axis(8, 3), 8, 32, None).unwrap();
        assert!(hits.iter().all(|h| h.id != id(3)));
        assert_eq!(idx.len(), 7);
    }

    #[test]
    fn reinsert_replaces_vector() {
        let idx = index(8);
        idx.insert(id(1), &axis(8, 0)).unwrap();
        idx.insert(id(1), &axis(8, 7)).unwrap();
        assert_eq!(idx.len(), 1);

        let hits = idx.search(&axis(8, 7), 1, 16, None).unwrap();
        assert_eq!(hits[0].id, id(1));
        assert!((hits[0].score - 1.0).abs() < 1e-4);
    }

    #[test]
    fn unsupported_resolution_is_rejected() {
        let idx = index(8);
        idx.insert(id(1), &axis(8, 0)).unwrap();
        assert!(idx.search(&axis(8, 0), 1, 16, Some(3)).is_err());
    }

    #[test]
    fn coarse_resolution_still_finds_neighbors() {
        let idx = index(8);
        for i in 0..8 {
            idx.insert(id(i as u64), &axis(8, i)).unwrap();
        }
        let hits = idx.search(&axis(8, 1), 2, 32, Some(4)).unwrap();
        assert_eq!(hits[0].id, id(1));
    }

    #[test]
    fn k_zero_returns_empty() {
        let idx = index(8);
        idx.insert(id(1), &axis(8, 0)).unwrap();
        assert!(idx.search(&axis(8, 0), 0, 16, None).unwrap().is_empty());
    }
}
