//! Versioned content records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One immutable version of a path's content.
///
/// Timestamps are strictly increasing per path; previous versions are never
/// mutated once recorded. Metadata values are raw bytes — agents may attach
/// non-UTF-8 payloads and must get them back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentVersion {
    /// Validated, normalized path.
    pub path: String,
    /// Monotonic microsecond timestamp.
    pub timestamp_us: u64,
    /// Full content bytes of this version.
    #[serde(with = "serde_bytes_vec")]
    pub bytes: Vec<u8>,
    /// Agent that wrote this version.
    pub agent: String,
    /// Free-form metadata; values are opaque bytes.
    #[serde(default)]
    pub metadata: BTreeMap<String, Vec<u8>>,
}

/// serde helper: encode content bytes as an array of numbers in JSON while
/// staying compact for binary formats.
mod serde_bytes_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        Vec::<u8>::deserialize(de)
    }
}
