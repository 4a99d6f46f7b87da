//! # agrama-crdt
//!
//! Per-document conflict-free replicated editing across agents. Operations
//! carry vector-clock snapshots and merge deterministically under any
//! delivery order consistent with causality; out-of-order arrivals are
//! buffered until their dependencies land.

pub mod document;
pub mod operation;
pub mod registry;
pub mod vector_clock;

pub use document::{ApplyOutcome, CollabDocument, LocalEdit};
pub use operation::{CrdtOperation, OpKind, Position};
pub use registry::DocumentRegistry;
pub use vector_clock::VectorClock;
