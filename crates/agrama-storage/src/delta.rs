//! Anchor+delta physical representation for version histories.
//!
//! The newest version of a path is always a full anchor. Older versions
//! are stored as reverse deltas against their immediate successor: the
//! shared prefix/suffix lengths plus the replaced middle. Long histories
//! of mostly-similar content compress well; reconstruction of any version
//! is byte-exact by walking back from the nearest newer anchor.

use serde::{Deserialize, Serialize};

/// Physical form of one stored version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoredBytes {
    /// Full snapshot.
    Anchor(Vec<u8>),
    /// Reverse delta against the next-newer version.
    Delta(ReverseDelta),
}

/// Older = newer[..prefix] + middle + newer[newer.len()-suffix..].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseDelta {
    pub prefix: usize,
    pub suffix: usize,
    pub middle: Vec<u8>,
}

impl StoredBytes {
    /// Bytes of heap payload this representation holds.
    pub fn payload_len(&self) -> usize {
        match self {
            Self::Anchor(b) => b.len(),
            Self::Delta(d) => d.middle.len(),
        }
    }
}

/// Compute the reverse delta that reconstructs `older` from `newer`.
pub fn encode(newer: &[u8], older: &[u8]) -> ReverseDelta {
    let prefix = newer
        .iter()
        .zip(older.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = newer.len().min(older.len()) - prefix;
    let suffix = newer[prefix..]
        .iter()
        .rev()
        .zip(older[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count()
        .min(max_suffix);

    ReverseDelta {
        prefix,
        suffix,
        middle: older[prefix..older.len() - suffix].to_vec(),
    }
}

/// Apply a reverse delta to a newer version, producing the older bytes.
pub fn apply(newer: &[u8], delta: &ReverseDelta) -> Vec<u8> {
    let mut out = Vec::with_capacity(delta.prefix + delta.middle.len() + delta.suffix);
    out.extend_from_slice(&newer[..delta.prefix]);
    out.extend_from_slice(&delta.middle);
    out.extend_from_slice(&newer[newer.len() - delta.suffix..]);
    out
}
