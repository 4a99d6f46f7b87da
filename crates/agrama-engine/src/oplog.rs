//! The operation log: a mutex-protected append-only vector with an atomic
//! sequence counter. Entries are totally ordered by `seq`.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use agrama_core::models::OperationLogEntry;

pub struct OperationLog {
    seq: AtomicU64,
    entries: Mutex<Vec<OperationLogEntry>>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Claim the next sequence number.
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn append(&self, entry: OperationLogEntry) {
        self.entries.lock().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recent `n` entries, oldest of those first.
    pub fn tail(&self, n: usize) -> Vec<OperationLogEntry> {
        let entries = self.entries.lock();
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(seq: u64, success: bool) -> OperationLogEntry {
        OperationLogEntry {
            seq,
            primitive: "store".into(),
            agent_id: "a".into(),
            started_us: seq,
            elapsed_ns: 100,
            success,
            result_bytes: 2,
        }
    }

    #[test]
    fn sequences_are_dense_and_increasing() {
        let log = OperationLog::new();
        assert_eq!(log.next_seq(), 1);
        assert_eq!(log.next_seq(), 2);
        assert_eq!(log.next_seq(), 3);
    }

    #[test]
    fn tail_returns_most_recent() {
        let log = OperationLog::new();
        for i in 1..=5 {
            log.append(entry(i, true));
        }
        let tail = log.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].seq, 4);
        assert_eq!(tail[1].seq, 5);
    }

    #[test]
    fn failures_are_logged_too() {
        let log = OperationLog::new();
        log.append(entry(1, false));
        assert_eq!(log.len(), 1);
        assert!(!log.tail(1)[0].success);
    }
}
