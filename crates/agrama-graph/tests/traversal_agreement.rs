//! Traversal agreement suite: the engine's settled distances must match an
//! independent Dijkstra on randomly generated graphs, at densities that
//! exercise both the recursive multi-source path and the plain fallback.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use agrama_core::models::{GraphNode, NodeId, NodeKind, Relation, TraversalDirection};
use agrama_graph::{shortest_paths, GraphStore};

fn random_graph(n: usize, m: usize, seed: u64) -> (GraphStore, Vec<NodeId>, Vec<(usize, usize, f64)>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let store = GraphStore::new();
    let ids: Vec<NodeId> = (0..n)
        .map(|i| {
            let node = GraphNode::new(format!("node:{i}"), NodeKind::Concept);
            let id = node.id;
            store.upsert_node(node);
            id
        })
        .collect();

    let mut edges = Vec::with_capacity(m);
    while edges.len() < m {
        let s = rng.gen_range(0..n);
        let d = rng.gen_range(0..n);
        if s == d {
            continue;
        }
        let w = rng.gen_range(0..=10) as f64;
        if store
            .add_edge(ids[s], ids[d], Relation::DependsOn, w, BTreeMap::new())
            .unwrap()
        {
            edges.push((s, d, w));
        }
    }
    (store, ids, edges)
}

/// Reference multi-source bounded Dijkstra over the raw edge list.
fn reference_distances(
    n: usize,
    edges: &[(usize, usize, f64)],
    sources: &[usize],
    bound: f64,
) -> HashMap<usize, f64> {
    let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for &(s, d, w) in edges {
        adj[s].push((d, w));
    }

    let mut dist: HashMap<usize, f64> = HashMap::new();
    let mut heap = std::collections::BinaryHeap::new();
    for &s in sources {
        dist.insert(s, 0.0);
        heap.push(std::cmp::Reverse((ordered_float(0.0), s)));
    }
    while let Some(std::cmp::Reverse((d_bits, u))) = heap.pop() {
        let d = f64::from_bits(d_bits);
        if dist.get(&u).is_some_and(|&cur| d > cur) {
            continue;
        }
        for &(v, w) in &adj[u] {
            let next = d + w;
            if next > bound {
                continue;
            }
            if dist.get(&v).map_or(true, |&cur| next < cur) {
                dist.insert(v, next);
                heap.push(std::cmp::Reverse((ordered_float(next), v)));
            }
        }
    }
    dist
}

/// Nonnegative f64 bits order the same as the floats themselves.
fn ordered_float(f: f64) -> u64 {
    f.to_bits()
}

fn check_agreement(n: usize, m: usize, seed: u64, rounds: usize) {
    let (store, ids, edges) = random_graph(n, m, seed);
    let id_to_pos: HashMap<NodeId, usize> = ids.iter().copied().enumerate().map(|(i, id)| (id, i)).collect();
    let mut rng = StdRng::seed_from_u64(seed ^ 0xfeed);

    for round in 0..rounds {
        let sources: Vec<usize> = (0..3).map(|_| rng.gen_range(0..n)).collect();
        let bound = 50.0;

        let source_ids: Vec<NodeId> = sources.iter().map(|&s| ids[s]).collect();
        let engine =
            shortest_paths(&store, &source_ids, bound, TraversalDirection::Forward).unwrap();
        let expected = reference_distances(n, &edges, &sources, bound);

        let engine_map: HashMap<usize, f64> = engine
            .iter()
            .map(|&(id, d)| (id_to_pos[&id], d))
            .collect();

        assert_eq!(
            engine_map.len(),
            expected.len(),
            "round {round}: settled set size mismatch"
        );
        for (node, d) in &expected {
            let got = engine_map.get(node);
            assert_eq!(
                got,
                Some(d),
                "round {round}: distance mismatch at node {node}"
            );
        }
    }
}

#[test]
fn agrees_with_reference_on_sparse_graphs() {
    // Density above the predicted-win threshold: plain Dijkstra path.
    check_agreement(400, 1600, 7, 25);
}

#[test]
fn agrees_with_reference_on_moderate_graphs() {
    // Density below the threshold: the recursive multi-source path runs.
    check_agreement(400, 600, 11, 25);
}

#[test]
fn agrees_with_petgraph_single_source() {
    let (store, ids, edges) = random_graph(120, 360, 3);

    let mut g = petgraph::Graph::<usize, f64>::new();
    let pg_nodes: Vec<_> = (0..ids.len()).map(|i| g.add_node(i)).collect();
    for &(s, d, w) in &edges {
        g.add_edge(pg_nodes[s], pg_nodes[d], w);
    }

    for source in [0usize, 17, 63] {
        let bound = 30.0;
        let engine =
            shortest_paths(&store, &[ids[source]], bound, TraversalDirection::Forward).unwrap();
        let oracle = petgraph::algo::dijkstra(&g, pg_nodes[source], None, |e| *e.weight());

        let expected: HashMap<NodeId, f64> = oracle
            .into_iter()
            .filter(|(_, d)| *d <= bound)
            .map(|(nx, d)| (ids[g[nx]], d))
            .collect();
        let engine_map: HashMap<NodeId, f64> = engine.into_iter().collect();
        assert_eq!(engine_map, expected, "source {source}");
    }
}
