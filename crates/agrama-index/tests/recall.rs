//! Recall sanity: approximate search against brute-force cosine on a
//! random vector set. The graph search must recover at least 90% of the
//! true top-10.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use agrama_core::config::HnswConfig;
use agrama_core::models::NodeId;
use agrama_index::embedding::EmbeddingShape;
use agrama_index::{simd, HnswIndex};

const DIM: usize = 64;
const N: usize = 800;
const QUERIES: usize = 20;
const K: usize = 10;

fn random_unit(rng: &mut StdRng) -> Vec<f32> {
    let mut v: Vec<f32> = (0..DIM).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    simd::normalize(&mut v);
    v
}

#[test]
fn recall_at_10_is_at_least_point_nine() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let vectors: Vec<Vec<f32>> = (0..N).map(|_| random_unit(&mut rng)).collect();

    let config = HnswConfig {
        ef_construction: 100,
        ..HnswConfig::default()
    };
    let index = HnswIndex::with_seed(config, EmbeddingShape::new(DIM, vec![DIM]), 7);
    for (i, v) in vectors.iter().enumerate() {
        index.insert(NodeId(i as u64), v).unwrap();
    }

    let mut found = 0usize;
    let mut expected_total = 0usize;
    for _ in 0..QUERIES {
        let query = random_unit(&mut rng);

        let mut truth: Vec<(f32, usize)> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (simd::dot(&query, v), i))
            .collect();
        truth.sort_by(|a, b| b.0.total_cmp(&a.0));
        let truth_ids: Vec<NodeId> = truth[..K].iter().map(|&(_, i)| NodeId(i as u64)).collect();

        let hits = index.search(&query, K, 100, None).unwrap();
        assert_eq!(hits.len(), K, "ef >= k must return exactly k results");

        expected_total += K;
        found += hits.iter().filter(|h| truth_ids.contains(&h.id)).count();
    }

    let recall = found as f64 / expected_total as f64;
    assert!(recall >= 0.9, "recall@{K} = {recall:.3}, expected >= 0.9");
}
