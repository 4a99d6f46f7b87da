//! Process-monotonic microsecond clock and primitive deadlines.
//!
//! Content-version timestamps must be strictly increasing per path, so the
//! clock never returns the same value twice even when the wall clock ties
//! or steps backwards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::errors::{AgramaResult, EngineError};

static LAST_MICROS: AtomicU64 = AtomicU64::new(0);

/// Current time in microseconds since the Unix epoch, strictly increasing
/// across the whole process.
pub fn now_micros() -> u64 {
    let wall = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0);

    let mut prev = LAST_MICROS.load(Ordering::Relaxed);
    loop {
        let next = wall.max(prev + 1);
        match LAST_MICROS.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => prev = observed,
        }
    }
}

/// Optional deadline for a primitive invocation.
///
/// Handlers call [`Deadline::checkpoint`] between sub-operations; once the
/// deadline passes, the checkpoint fails with `DeadlineExceeded` and the
/// primitive unwinds through its normal error path.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
    started_at: Instant,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn none() -> Self {
        Self {
            expires_at: None,
            started_at: Instant::now(),
        }
    }

    /// A deadline expiring after the given number of milliseconds.
    pub fn after_millis(millis: u64) -> Self {
        let now = Instant::now();
        Self {
            expires_at: Some(now + std::time::Duration::from_millis(millis)),
            started_at: now,
        }
    }

    /// Check whether the deadline has passed.
    ///
    /// # Errors
    /// Returns `EngineError::DeadlineExceeded` once the deadline is behind us.
    pub fn checkpoint(&self) -> AgramaResult<()> {
        if let Some(expires_at) = self.expires_at {
            if Instant::now() >= expires_at {
                return Err(EngineError::DeadlineExceeded {
                    elapsed_ms: self.started_at.elapsed().as_millis() as u64,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Whether the deadline has already passed, without constructing an error.
    pub fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}
