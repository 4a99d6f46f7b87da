//! Distance-bucketed frontier.
//!
//! Entries land in coarse buckets keyed by distance; a bucket is sorted
//! only when pulled, so "give me the c smallest" never pays for a full
//! global sort of the frontier.

use std::collections::BTreeMap;

use agrama_core::models::NodeId;

use super::Entry;

pub(crate) struct Frontier {
    bucket_width: f64,
    buckets: BTreeMap<u64, Bucket>,
    len: usize,
}

struct Bucket {
    entries: Vec<Entry>,
    sorted: bool,
}

impl Frontier {
    /// A frontier covering distances `[0, bound]` with roughly `buckets`
    /// divisions.
    pub fn new(bound: f64, buckets: usize) -> Self {
        let width = if bound > 0.0 {
            bound / buckets.max(1) as f64
        } else {
            1.0
        };
        Self {
            bucket_width: width.max(f64::MIN_POSITIVE),
            buckets: BTreeMap::new(),
            len: 0,
        }
    }

    pub fn push(&mut self, idx: u32, id: NodeId, dist: f64) {
        let key = (dist / self.bucket_width) as u64;
        let bucket = self.buckets.entry(key).or_insert(Bucket {
            entries: Vec::new(),
            sorted: false,
        });
        bucket.entries.push((idx, id, dist));
        bucket.sorted = false;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pull the `c` globally smallest entries (distance, then NodeId).
    pub fn pull(&mut self, c: usize) -> Vec<Entry> {
        let mut out = Vec::with_capacity(c.min(self.len));
        while out.len() < c {
            let Some(mut slot) = self.buckets.first_entry() else {
                break;
            };
            let bucket = slot.get_mut();
            if !bucket.sorted {
                // Sort descending so the smallest pop off the tail.
                bucket
                    .entries
                    .sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| b.1.cmp(&a.1)));
                bucket.sorted = true;
            }
            while out.len() < c {
                match bucket.entries.pop() {
                    Some(entry) => {
                        self.len -= 1;
                        out.push(entry);
                    }
                    None => break,
                }
            }
            if bucket.entries.is_empty() {
                slot.remove();
            }
        }
        out
    }

    /// Pull up to `t` entries spread across distinct distance buckets: the
    /// smallest entry of each nonempty bucket, ascending. Used for pivot
    /// selection, where spanning the distance range matters more than
    /// taking the global minimum run.
    pub fn pull_spread(&mut self, t: usize) -> Vec<Entry> {
        let keys: Vec<u64> = self.buckets.keys().copied().take(t).collect();
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(bucket) = self.buckets.get_mut(&key) else {
                continue;
            };
            if !bucket.sorted {
                bucket
                    .entries
                    .sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| b.1.cmp(&a.1)));
                bucket.sorted = true;
            }
            if let Some(entry) = bucket.entries.pop() {
                self.len -= 1;
                out.push(entry);
            }
            if bucket.entries.is_empty() {
                self.buckets.remove(&key);
            }
        }
        out
    }

    /// Drain every remaining entry, unordered.
    pub fn drain(&mut self) -> Vec<Entry> {
        let mut out = Vec::with_capacity(self.len);
        for (_, bucket) in std::mem::take(&mut self.buckets) {
            out.extend(bucket.entries);
        }
        self.len = 0;
        out
    }
}
