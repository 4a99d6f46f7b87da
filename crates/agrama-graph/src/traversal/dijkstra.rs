//! Exact bounded best-first expansion.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use agrama_core::models::{NodeId, TraversalDirection};

use crate::store::GraphStore;

use super::{expansion_edges, Entry};

struct HeapEntry {
    dist: f64,
    idx: u32,
    id: NodeId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.id == other.id
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: invert so the smallest distance pops
        // first; equal distances pop lower NodeId first.
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.id.cmp(&self.id))
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Multi-source Dijkstra from `seeds` (which may carry nonzero initial
/// distances), pruned at `bound`. Settled `(node, distance)` pairs are
/// merged into `dist`, keeping the minimum where entries already exist.
pub(crate) fn run(
    store: &GraphStore,
    seeds: &[Entry],
    bound: f64,
    direction: TraversalDirection,
    dist: &mut HashMap<u32, (NodeId, f64)>,
) {
    let mut heap = BinaryHeap::with_capacity(seeds.len());

    for &(idx, id, d) in seeds {
        if d > bound {
            continue;
        }
        let better = dist.get(&idx).map_or(true, |&(_, cur)| d < cur);
        if better {
            dist.insert(idx, (id, d));
        }
        heap.push(HeapEntry { dist: d, idx, id });
    }
    // Warm starts settled by earlier phases re-enter the queue so their
    // outgoing edges get relaxed at the current bound.
    for (&idx, &(id, d)) in dist.iter() {
        heap.push(HeapEntry { dist: d, idx, id });
    }

    while let Some(HeapEntry { dist: d, idx, id: _ }) = heap.pop() {
        match dist.get(&idx) {
            Some(&(_, best)) if d > best => continue, // stale entry
            _ => {}
        }
        for (peer, peer_id, weight) in expansion_edges(store, idx, direction) {
            let next = d + weight;
            if next > bound {
                continue;
            }
            let better = dist.get(&peer).map_or(true, |&(_, cur)| next < cur);
            if better {
                dist.insert(peer, (peer_id, next));
                heap.push(HeapEntry {
                    dist: next,
                    idx: peer,
                    id: peer_id,
                });
            }
        }
    }
}
