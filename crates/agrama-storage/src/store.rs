//! The sharded temporal content store.
//!
//! One writer / many readers per path via path-sharded `RwLock`s;
//! different paths proceed in parallel. Per-path timestamps are strictly
//! monotonic. Entries are created on first write and never deleted.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use agrama_core::config::StorageConfig;
use agrama_core::errors::{AgramaResult, StorageError};
use agrama_core::models::ContentVersion;
use agrama_core::time::now_micros;

use crate::delta::{self, StoredBytes};
use crate::path::{validate_path, RESERVED_PREFIX};

/// One recorded version: shared metadata plus its physical form.
#[derive(Debug, Clone)]
struct VersionRecord {
    timestamp_us: u64,
    agent: String,
    metadata: BTreeMap<String, Vec<u8>>,
    bytes: StoredBytes,
}

#[derive(Debug, Default)]
struct PathEntry {
    /// Oldest first; the last record is always an anchor (the current bytes).
    versions: Vec<VersionRecord>,
    /// Versions since the last retained anchor below the top.
    since_anchor: usize,
}

/// Aggregate store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub paths: usize,
    pub versions: usize,
    /// Physical payload bytes across anchors and deltas.
    pub payload_bytes: u64,
}

/// The temporal content store.
pub struct ContentStore {
    shards: Vec<RwLock<HashMap<String, PathEntry>>>,
    shard_mask: usize,
    config: StorageConfig,
    payload_bytes: AtomicU64,
}

impl ContentStore {
    pub fn new(config: StorageConfig) -> Self {
        let shard_count = config.shards.next_power_of_two().max(1);
        let shards = (0..shard_count).map(|_| RwLock::new(HashMap::new())).collect();
        Self {
            shards,
            shard_mask: shard_count - 1,
            config,
            payload_bytes: AtomicU64::new(0),
        }
    }

    fn shard_for(&self, path: &str) -> &RwLock<HashMap<String, PathEntry>> {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in path.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        &self.shards[(h as usize) & self.shard_mask]
    }

    /// Validate a raw path against this store's configuration.
    pub fn validate(&self, raw: &str) -> AgramaResult<String> {
        let normalized = validate_path(raw, &self.config)?;
        if normalized
            .strip_prefix(self.config.root.trim_end_matches('/'))
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(&normalized)
            .starts_with(RESERVED_PREFIX)
        {
            return Err(StorageError::PathDenied {
                path: normalized,
                reason: "reserved engine prefix".to_string(),
            }
            .into());
        }
        Ok(normalized)
    }

    /// Record a new version. Validation and budget checks run before any
    /// mutation; a failed put leaves the store unchanged.
    pub fn put(
        &self,
        raw_path: &str,
        bytes: Vec<u8>,
        agent: &str,
        metadata: BTreeMap<String, Vec<u8>>,
    ) -> AgramaResult<ContentVersion> {
        let path = self.validate(raw_path)?;

        let needed = bytes.len() as u64;
        let used = self.payload_bytes.load(Ordering::Relaxed);
        if used + needed > self.config.budget_bytes {
            return Err(StorageError::OutOfSpace {
                needed,
                remaining: self.config.budget_bytes.saturating_sub(used),
            }
            .into());
        }

        let mut shard = self.shard_for(&path).write();
        let entry = shard.entry(path.clone()).or_default();

        let timestamp_us = match entry.versions.last() {
            Some(last) => now_micros().max(last.timestamp_us + 1),
            None => now_micros(),
        };

        // Convert the previous top anchor to a reverse delta unless it is
        // due to be retained as a periodic anchor.
        let anchor_interval = self.config.anchor_interval.max(1);
        if let Some(prev) = entry.versions.last_mut() {
            let keep_anchor = entry.since_anchor + 1 >= anchor_interval;
            if keep_anchor {
                entry.since_anchor = 0;
            } else if let StoredBytes::Anchor(prev_bytes) = &prev.bytes {
                let full = prev_bytes.len() as u64;
                let d = delta::encode(&bytes, prev_bytes);
                // middle is a subslice of the older bytes, so this never wraps.
                self.payload_bytes
                    .fetch_sub(full - d.middle.len() as u64, Ordering::Relaxed);
                prev.bytes = StoredBytes::Delta(d);
                entry.since_anchor += 1;
            }
        }

        let version = ContentVersion {
            path: path.clone(),
            timestamp_us,
            bytes: bytes.clone(),
            agent: agent.to_string(),
            metadata: metadata.clone(),
        };
        entry.versions.push(VersionRecord {
            timestamp_us,
            agent: agent.to_string(),
            metadata,
            bytes: StoredBytes::Anchor(bytes),
        });
        self.payload_bytes.fetch_add(needed, Ordering::Relaxed);

        debug!(path = %path, version = entry.versions.len(), "content version recorded");
        Ok(version)
    }

    /// Current bytes for a path.
    pub fn get(&self, raw_path: &str) -> AgramaResult<Vec<u8>> {
        let path = self.validate(raw_path)?;
        let shard = self.shard_for(&path).read();
        let entry = shard.get(&path).ok_or(StorageError::NotFound { path: path.clone() })?;
        self.materialize(entry, entry.versions.len() - 1, &path)
    }

    /// Current version with metadata.
    pub fn get_version(&self, raw_path: &str) -> AgramaResult<ContentVersion> {
        let path = self.validate(raw_path)?;
        let shard = self.shard_for(&path).read();
        let entry = shard.get(&path).ok_or(StorageError::NotFound { path: path.clone() })?;
        let idx = entry.versions.len() - 1;
        self.version_at(entry, idx, &path)
    }

    /// Up to `limit` most recent versions, newest first.
    pub fn history(&self, raw_path: &str, limit: usize) -> AgramaResult<Vec<ContentVersion>> {
        let path = self.validate(raw_path)?;
        let shard = self.shard_for(&path).read();
        let entry = shard.get(&path).ok_or(StorageError::NotFound { path: path.clone() })?;

        let mut out = Vec::with_capacity(limit.min(entry.versions.len()));
        for idx in (0..entry.versions.len()).rev().take(limit) {
            out.push(self.version_at(entry, idx, &path)?);
        }
        Ok(out)
    }

    /// Versions of a path whose timestamps fall within `[start_us, end_us]`,
    /// newest first.
    pub fn history_range(
        &self,
        raw_path: &str,
        start_us: u64,
        end_us: u64,
    ) -> AgramaResult<Vec<ContentVersion>> {
        let path = self.validate(raw_path)?;
        let shard = self.shard_for(&path).read();
        let entry = shard.get(&path).ok_or(StorageError::NotFound { path: path.clone() })?;

        let mut out = Vec::new();
        for idx in (0..entry.versions.len()).rev() {
            let ts = entry.versions[idx].timestamp_us;
            if ts < start_us {
                break;
            }
            if ts <= end_us {
                out.push(self.version_at(entry, idx, &path)?);
            }
        }
        Ok(out)
    }

    /// Scan all paths for activity in `[start_us, end_us]`: returns
    /// `(path, latest matching timestamp, version count in range)` tuples.
    pub fn scan_range(&self, start_us: u64, end_us: u64) -> Vec<(String, u64, usize)> {
        let mut out = Vec::new();
        for shard in &self.shards {
            let shard = shard.read();
            for (path, entry) in shard.iter() {
                let mut latest = None;
                let mut count = 0;
                for record in entry.versions.iter().rev() {
                    if record.timestamp_us < start_us {
                        break;
                    }
                    if record.timestamp_us <= end_us {
                        count += 1;
                        latest.get_or_insert(record.timestamp_us);
                    }
                }
                if let Some(ts) = latest {
                    out.push((path.clone(), ts, count));
                }
            }
        }
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// Whether a (validated) path exists.
    pub fn contains(&self, raw_path: &str) -> bool {
        match self.validate(raw_path) {
            Ok(path) => self.shard_for(&path).read().contains_key(&path),
            Err(_) => false,
        }
    }

    pub fn stats(&self) -> StoreStats {
        let mut paths = 0;
        let mut versions = 0;
        for shard in &self.shards {
            let shard = shard.read();
            paths += shard.len();
            versions += shard.values().map(|e| e.versions.len()).sum::<usize>();
        }
        StoreStats {
            paths,
            versions,
            payload_bytes: self.payload_bytes.load(Ordering::Relaxed),
        }
    }

    /// Reconstruct the bytes of version `idx` (0 = oldest).
    fn materialize(&self, entry: &PathEntry, idx: usize, path: &str) -> AgramaResult<Vec<u8>> {
        // Find the nearest anchor at or above idx, then walk back down.
        let mut anchor_idx = idx;
        loop {
            match entry.versions.get(anchor_idx).map(|r| &r.bytes) {
                Some(StoredBytes::Anchor(bytes)) => {
                    let mut current = bytes.clone();
                    for i in (idx..anchor_idx).rev() {
                        match &entry.versions[i].bytes {
                            StoredBytes::Delta(d) => current = delta::apply(&current, d),
                            StoredBytes::Anchor(b) => current = b.clone(),
                        }
                    }
                    return Ok(current);
                }
                Some(StoredBytes::Delta(_)) => anchor_idx += 1,
                None => {
                    return Err(StorageError::CorruptHistory {
                        path: path.to_string(),
                        version: idx,
                        reason: "no anchor above delta chain".to_string(),
                    }
                    .into())
                }
            }
        }
    }

    fn version_at(&self, entry: &PathEntry, idx: usize, path: &str) -> AgramaResult<ContentVersion> {
        let record = &entry.versions[idx];
        Ok(ContentVersion {
            path: path.to_string(),
            timestamp_us: record.timestamp_us,
            bytes: self.materialize(entry, idx, path)?,
            agent: record.agent.clone(),
            metadata: record.metadata.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ContentStore {
        ContentStore::new(StorageConfig::default())
    }

    #[test]
    fn put_then_get_returns_last_write() {
        let s = store();
        s.put("doc/a.txt", b"hello".to_vec(), "agent-1", BTreeMap::new())
            .unwrap();
        s.put("doc/a.txt", b"hello world".to_vec(), "agent-1", BTreeMap::new())
            .unwrap();
        assert_eq!(s.get("doc/a.txt").unwrap(), b"hello world");
    }

    #[test]
    fn history_is_newest_first_and_byte_exact() {
        let s = store();
        let writes: Vec<String> = (0..25).map(|i| format!("content revision {i}")).collect();
        for w in &writes {
            s.put("doc/h.txt", w.clone().into_bytes(), "agent-1", BTreeMap::new())
                .unwrap();
        }
        let history = s.history("doc/h.txt", usize::MAX).unwrap();
        assert_eq!(history.len(), writes.len());
        for (i, version) in history.iter().enumerate() {
            let expected = &writes[writes.len() - 1 - i];
            assert_eq!(version.bytes, expected.as_bytes(), "version {i}");
        }
        // Timestamps strictly decrease in newest-first order.
        for pair in history.windows(2) {
            assert!(pair[0].timestamp_us > pair[1].timestamp_us);
        }
    }

    #[test]
    fn history_respects_limit() {
        let s = store();
        for i in 0..5 {
            s.put("doc/l.txt", vec![i], "a", BTreeMap::new()).unwrap();
        }
        let h = s.history("doc/l.txt", 2).unwrap();
        assert_eq!(h.len(), 2);
        assert_eq!(h[0].bytes, vec![4]);
        assert_eq!(h[1].bytes, vec![3]);
    }

    #[test]
    fn missing_path_is_not_found() {
        let s = store();
        assert!(matches!(
            s.get("doc/missing.txt"),
            Err(agrama_core::AgramaError::Storage(StorageError::NotFound { .. }))
        ));
    }

    #[test]
    fn invalid_path_leaves_store_unchanged() {
        let s = store();
        assert!(s.put("../evil", b"x".to_vec(), "a", BTreeMap::new()).is_err());
        assert_eq!(s.stats().paths, 0);
    }

    #[test]
    fn reserved_prefix_is_denied() {
        let s = store();
        assert!(matches!(
            s.put(".agrama/internal", b"x".to_vec(), "a", BTreeMap::new()),
            Err(agrama_core::AgramaError::Storage(StorageError::PathDenied { .. }))
        ));
    }

    #[test]
    fn budget_enforced_before_mutation() {
        let s = ContentStore::new(StorageConfig {
            budget_bytes: 8,
            ..StorageConfig::default()
        });
        assert!(s.put("a", vec![0; 6], "a", BTreeMap::new()).is_ok());
        assert!(matches!(
            s.put("b", vec![0; 6], "a", BTreeMap::new()),
            Err(agrama_core::AgramaError::Storage(StorageError::OutOfSpace { .. }))
        ));
        assert_eq!(s.stats().paths, 1);
    }

    #[test]
    fn non_utf8_metadata_round_trips() {
        let s = store();
        let mut meta = BTreeMap::new();
        meta.insert("raw".to_string(), vec![0xff, 0xfe, 0x00, 0x01]);
        s.put("doc/m.txt", b"body".to_vec(), "a", meta.clone()).unwrap();
        let v = s.get_version("doc/m.txt").unwrap();
        assert_eq!(v.metadata, meta);
    }

    #[test]
    fn similar_versions_compress() {
        let s = store();
        let base = "x".repeat(4096);
        for i in 0..8 {
            let content = format!("{base}{i}");
            s.put("doc/big.txt", content.into_bytes(), "a", BTreeMap::new())
                .unwrap();
        }
        let stats = s.stats();
        // 8 versions of ~4 KiB each would be ~32 KiB uncompressed; deltas
        // should keep physical payload well under half of that.
        assert!(
            stats.payload_bytes < 16 * 1024,
            "payload {} too large",
            stats.payload_bytes
        );
    }

    #[test]
    fn temporal_scan_finds_recent_writes() {
        let s = store();
        s.put("doc/t1.txt", b"one".to_vec(), "a", BTreeMap::new()).unwrap();
        let mid = agrama_core::time::now_micros();
        s.put("doc/t2.txt", b"two".to_vec(), "a", BTreeMap::new()).unwrap();

        let all = s.scan_range(0, u64::MAX);
        assert_eq!(all.len(), 2);
        let recent = s.scan_range(mid, u64::MAX);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].0, "doc/t2.txt");
    }
}
