//! Relaxed atomic counters shared by every pool flavor.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters for one pool. All updates are relaxed; these are
/// observability numbers, not synchronization.
#[derive(Debug, Default)]
pub struct PoolCounters {
    acquired: AtomicU64,
    released: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    in_use: AtomicU64,
    high_water: AtomicU64,
}

/// Point-in-time snapshot of a pool's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub acquired: u64,
    pub released: u64,
    /// Acquisitions served from the freelist.
    pub hits: u64,
    /// Acquisitions that fell back to the general allocator.
    pub misses: u64,
    pub in_use: u64,
    pub in_use_high_water: u64,
}

impl PoolCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an acquisition; `hit` is whether the freelist served it.
    pub fn record_acquire(&self, hit: bool) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        let now = self.in_use.fetch_add(1, Ordering::Relaxed) + 1;
        self.high_water.fetch_max(now, Ordering::Relaxed);
    }

    /// Record a release back to the pool (or to the allocator).
    pub fn record_release(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
        // Saturating: a release without a matching acquire is a caller bug
        // but must not wrap the gauge.
        let _ = self
            .in_use
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            in_use: self.in_use.load(Ordering::Relaxed),
            in_use_high_water: self.high_water.load(Ordering::Relaxed),
        }
    }
}
