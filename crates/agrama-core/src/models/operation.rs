//! Operation-log records.

use serde::{Deserialize, Serialize};

/// One entry per primitive invocation, appended on completion whether the
/// invocation succeeded or failed. Entries are totally ordered by `seq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLogEntry {
    pub seq: u64,
    pub primitive: String,
    pub agent_id: String,
    /// Monotonic microsecond timestamp at dispatch.
    pub started_us: u64,
    pub elapsed_ns: u64,
    pub success: bool,
    /// Serialized size of the result (0 on failure).
    pub result_bytes: usize,
}
