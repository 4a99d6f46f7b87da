//! # agrama-graph
//!
//! Typed directed graph over stable 64-bit node ids: a flat node arena
//! with forward and reverse adjacency kept as swap-on-write snapshots, and
//! a bounded multi-source shortest-path engine with density-aware fallback
//! to plain Dijkstra.

pub mod store;
pub mod traversal;

pub use store::{GraphStats, GraphStore};
pub use traversal::{expand_hops, shortest_paths, HopNode};
