//! # agrama-core
//!
//! Foundation crate for the Agrama temporal knowledge-graph engine.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod time;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::EngineConfig;
pub use errors::{AgramaError, AgramaResult};
pub use models::{
    AgentSession, ContentVersion, Direction, GraphEdge, GraphNode, NodeId, NodeKind,
    OperationLogEntry, Relation, SearchHit, SearchMode, TraversalDirection,
};
pub use time::{now_micros, Deadline};
