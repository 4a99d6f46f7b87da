//! Immutable CRDT operations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vector_clock::VectorClock;

/// Stable identity of one text element (one inserted character).
///
/// `run` is the blake3-derived identity of the operation that created the
/// element; `seq` is the element's index within that operation's run.
/// Concurrent inserts at the same anchor order by descending `run` — the
/// deterministic tiebreaker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ElementId {
    pub run: u128,
    pub seq: u32,
}

/// Kind of a textual operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Insert,
    Delete,
    Modify,
}

/// A position in the document at the time the operation was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

/// One immutable operation. The anchor/target element ids carry the
/// rebasing information that makes concurrent application commute; the
/// `position` is the human-readable location at issue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrdtOperation {
    pub id: Uuid,
    pub agent: String,
    pub doc: String,
    pub kind: OpKind,
    pub position: Position,
    /// Inserted text (empty for pure deletes).
    pub payload: String,
    /// Element the inserted run attaches after; `None` = document start.
    pub anchor: Option<ElementId>,
    /// Elements tombstoned by this operation (deletes and modifies).
    pub targets: Vec<ElementId>,
    /// The origin document clock after the origin agent's increment.
    pub clock: VectorClock,
}

impl CrdtOperation {
    /// Deterministic tiebreaker: the first 16 bytes of blake3(op id).
    pub fn run_id(&self) -> u128 {
        run_id_for(self.id)
    }
}

/// The element-run identity derived from an operation id.
pub fn run_id_for(id: Uuid) -> u128 {
    let hash = blake3::hash(id.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash.as_bytes()[..16]);
    u128::from_le_bytes(bytes)
}
