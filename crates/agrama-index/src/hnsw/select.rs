//! Diversity-preferring neighbor selection.
//!
//! The classic HNSW heuristic: walk candidates closest-first and keep one
//! only if it is closer to the query than to every neighbor already kept.
//! A candidate that sits behind an already-kept neighbor adds no new
//! direction to the graph and is skipped.

/// Select up to `cap` neighbors from `candidates` (sorted by ascending
/// distance-to-query). `pair_distance` measures distance between two
/// candidate indices.
pub(crate) fn select_diverse<F>(
    candidates: &[(f32, u32)],
    cap: usize,
    pair_distance: F,
) -> Vec<(f32, u32)>
where
    F: Fn(u32, u32) -> f32,
{
    let mut selected: Vec<(f32, u32)> = Vec::with_capacity(cap.min(candidates.len()));
    for &(dist_to_query, candidate) in candidates {
        if selected.len() >= cap {
            break;
        }
        let dominated = selected
            .iter()
            .any(|&(_, kept)| pair_distance(candidate, kept) < dist_to_query);
        if !dominated {
            selected.push((dist_to_query, candidate));
        }
    }

    // Backfill with skipped candidates if diversity left slots empty;
    // capped lists should stay full so the graph keeps its degree.
    if selected.len() < cap {
        for &(d, c) in candidates {
            if selected.len() >= cap {
                break;
            }
            if !selected.iter().any(|&(_, s)| s == c) {
                selected.push((d, c));
            }
        }
        selected.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    selected
}
