//! Recursive bounded multi-source shortest paths.
//!
//! Structure: when the source set is small or recursion bottoms out, fall
//! through to exact best-first expansion. Otherwise select up to `t`
//! pivots spanning the frontier's distance range, settle the near half of
//! the space through the pivots at `bound / 2`, then expand the residual
//! sources against the warm distance table at the full bound. The final
//! expansion is itself exact, so settled distances are true shortest-path
//! distances within the bound regardless of how much the pivot phase
//! prefetched.

use std::collections::HashMap;

use agrama_core::models::{NodeId, TraversalDirection};

use crate::store::GraphStore;

use super::{dijkstra, BmsspParams, Entry, Frontier};

pub(crate) fn run(
    store: &GraphStore,
    seeds: &[Entry],
    bound: f64,
    level: usize,
    params: BmsspParams,
    direction: TraversalDirection,
    dist: &mut HashMap<u32, (NodeId, f64)>,
) {
    if level == 0 || seeds.len() <= params.k {
        dijkstra::run(store, seeds, bound, direction, dist);
        return;
    }

    // Bucket the frontier and take at most t pivots spread across the
    // distance range below the bound.
    let mut frontier = Frontier::new(bound, params.t.max(1) * 4);
    for &(idx, id, d) in seeds {
        if d <= bound {
            frontier.push(idx, id, d);
        }
    }
    let pivots = frontier.pull_spread(params.t);
    if pivots.is_empty() {
        return;
    }

    // Settle the near half of the space through the pivots.
    run(store, &pivots, bound / 2.0, level - 1, params, direction, dist);

    // Residual expansion: every remaining source plus the pivot results
    // already in `dist` re-enter an exact expansion at the full bound.
    let mut residual: Vec<Entry> = frontier.drain();
    residual.extend(pivots);
    dijkstra::run(store, &residual, bound, direction, dist);
}
