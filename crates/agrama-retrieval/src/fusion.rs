//! Weighted score fusion.
//!
//! Each source's scores are min-max normalized to [0,1] over its own top
//! results, then combined as α·lexical + β·semantic + γ·graph with absent
//! components contributing zero. Per-source normalized scores stay
//! attached to every hit for provenance.

use std::collections::HashMap;

use agrama_core::errors::{AgramaResult, ValidationError};
use agrama_core::models::{ComponentScores, NodeId, SearchHit};

/// Fusion weights. Each must be nonnegative and they may sum to at most 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl FusionWeights {
    pub fn new(alpha: f32, beta: f32, gamma: f32) -> AgramaResult<Self> {
        let valid = alpha >= 0.0
            && beta >= 0.0
            && gamma >= 0.0
            && alpha + beta + gamma <= 1.0 + f32::EPSILON;
        if !valid {
            return Err(ValidationError::InvalidWeights { alpha, beta, gamma }.into());
        }
        Ok(Self { alpha, beta, gamma })
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            alpha: 0.4,
            beta: 0.4,
            gamma: 0.2,
        }
    }
}

/// Min-max normalize a score list to [0,1] in place semantics: returns a
/// map id → normalized score. A single-element or constant list maps to 1.
fn normalize(hits: &[(NodeId, f32)]) -> HashMap<NodeId, f32> {
    if hits.is_empty() {
        return HashMap::new();
    }
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &(_, s) in hits {
        min = min.min(s);
        max = max.max(s);
    }
    let range = max - min;
    hits.iter()
        .map(|&(id, s)| {
            let normalized = if range <= f32::EPSILON {
                1.0
            } else {
                (s - min) / range
            };
            (id, normalized)
        })
        .collect()
}

/// Fuse three sub-result lists into the top-k ranked hits.
///
/// Tie-breaks, in order: higher fused score, higher lexical, higher
/// semantic, lower NodeId.
pub fn fuse(
    lexical: &[(NodeId, f32)],
    semantic: &[(NodeId, f32)],
    graph: &[(NodeId, f32)],
    weights: FusionWeights,
    k: usize,
) -> Vec<SearchHit> {
    if k == 0 {
        return Vec::new();
    }
    let lex = normalize(lexical);
    let sem = normalize(semantic);
    let gra = normalize(graph);

    let mut candidates: Vec<NodeId> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for id in lex.keys().chain(sem.keys()).chain(gra.keys()) {
        if seen.insert(*id) {
            candidates.push(*id);
        }
    }

    let mut hits: Vec<SearchHit> = candidates
        .into_iter()
        .map(|id| {
            let components = ComponentScores {
                lexical: lex.get(&id).copied().unwrap_or(0.0),
                semantic: sem.get(&id).copied().unwrap_or(0.0),
                graph: gra.get(&id).copied().unwrap_or(0.0),
            };
            let score = weights.alpha * components.lexical
                + weights.beta * components.semantic
                + weights.gamma * components.graph;
            SearchHit {
                id,
                score,
                snippet: None,
                components,
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.components.lexical.total_cmp(&a.components.lexical))
            .then_with(|| b.components.semantic.total_cmp(&a.components.semantic))
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.truncate(k);
    hits
}

/// Issue the three sub-queries in parallel.
pub fn run_parallel<L, S, G>(
    lexical: L,
    semantic: S,
    graph: G,
) -> (Vec<(NodeId, f32)>, Vec<(NodeId, f32)>, Vec<(NodeId, f32)>)
where
    L: FnOnce() -> Vec<(NodeId, f32)> + Send,
    S: FnOnce() -> Vec<(NodeId, f32)> + Send,
    G: FnOnce() -> Vec<(NodeId, f32)> + Send,
{
    let (lex, (sem, gra)) = rayon::join(lexical, || rayon::join(semantic, graph));
    (lex, sem, gra)
}
