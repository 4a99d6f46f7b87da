//! Per-agent sessions and the append-only activity feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live session state for one agent.
///
/// Registered lazily on the agent's first operation and updated on every
/// primitive call, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSession {
    pub agent_id: String,
    pub display_name: String,
    /// Capability tags declared at registration (informational).
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub started_at: DateTime<Utc>,
    /// Total primitive invocations by this agent.
    pub operations: u64,
    /// Monotonic microsecond timestamp of the last operation.
    pub last_activity_us: u64,
}

impl AgentSession {
    pub fn new(agent_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            display_name: display_name.into(),
            capabilities: Vec::new(),
            started_at: Utc::now(),
            operations: 0,
            last_activity_us: 0,
        }
    }
}

/// One provenance record per primitive call; the external activity feed is
/// a stream of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Position in the feed (same sequence space as the operation log).
    pub seq: u64,
    pub agent_id: String,
    pub primitive: String,
    /// Short human-readable summary, e.g. the key or query touched.
    pub target: String,
    pub timestamp_us: u64,
    pub success: bool,
}
