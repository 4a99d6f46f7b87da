//! Agent registry: lazy registration, per-agent session stats, and the
//! append-only activity feed.

use dashmap::DashMap;
use parking_lot::Mutex;

use agrama_core::models::{ActivityRecord, AgentSession};
use agrama_core::time::now_micros;

/// Thread-safe registry of agent sessions.
pub struct AgentRegistry {
    sessions: DashMap<String, AgentSession>,
    activity: Mutex<Vec<ActivityRecord>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            activity: Mutex::new(Vec::new()),
        }
    }

    /// Register an agent explicitly with a display name and capabilities.
    /// Re-registering updates the name and capabilities, keeping stats.
    pub fn register(&self, agent_id: &str, display_name: &str, capabilities: Vec<String>) {
        let mut entry = self
            .sessions
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentSession::new(agent_id, display_name));
        entry.display_name = display_name.to_string();
        entry.capabilities = capabilities;
    }

    /// Ensure an agent exists (lazy registration on first operation).
    pub fn touch(&self, agent_id: &str) {
        self.sessions
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentSession::new(agent_id, agent_id));
    }

    /// Count one operation against the agent's session, successful or not.
    pub fn record_operation(&self, agent_id: &str) {
        if let Some(mut session) = self.sessions.get_mut(agent_id) {
            session.operations += 1;
            session.last_activity_us = now_micros();
        }
    }

    /// Append a provenance record to the activity feed.
    pub fn record_activity(&self, record: ActivityRecord) {
        self.activity.lock().push(record);
    }

    /// Snapshot of one agent's session.
    pub fn session(&self, agent_id: &str) -> Option<AgentSession> {
        self.sessions.get(agent_id).map(|s| s.clone())
    }

    pub fn agent_count(&self) -> usize {
        self.sessions.len()
    }

    /// Activity records with `seq > since_seq`, oldest first. This is the
    /// read side of the external activity-feed stream.
    pub fn activity_tail(&self, since_seq: u64) -> Vec<ActivityRecord> {
        self.activity
            .lock()
            .iter()
            .filter(|r| r.seq > since_seq)
            .cloned()
            .collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_registers_lazily_once() {
        let reg = AgentRegistry::new();
        reg.touch("a1");
        reg.touch("a1");
        assert_eq!(reg.agent_count(), 1);
        assert_eq!(reg.session("a1").unwrap().operations, 0);
    }

    #[test]
    fn operations_count_every_invocation() {
        let reg = AgentRegistry::new();
        reg.touch("a1");
        reg.record_operation("a1");
        reg.record_operation("a1");
        assert_eq!(reg.session("a1").unwrap().operations, 2);
    }

    #[test]
    fn register_updates_identity_not_stats() {
        let reg = AgentRegistry::new();
        reg.touch("a1");
        reg.record_operation("a1");
        reg.register("a1", "Refactor Agent", vec!["code".into()]);
        let s = reg.session("a1").unwrap();
        assert_eq!(s.display_name, "Refactor Agent");
        assert_eq!(s.operations, 1);
    }

    #[test]
    fn activity_tail_filters_by_sequence() {
        let reg = AgentRegistry::new();
        for seq in 1..=3 {
            reg.record_activity(ActivityRecord {
                seq,
                agent_id: "a1".into(),
                primitive: "store".into(),
                target: format!("k{seq}"),
                timestamp_us: seq * 10,
                success: true,
            });
        }
        let tail = reg.activity_tail(1);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].seq, 2);
    }
}
