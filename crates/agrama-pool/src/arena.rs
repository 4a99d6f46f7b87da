//! Operation-scoped bump arenas.
//!
//! A primitive invocation acquires one arena at entry, draws all its
//! transient allocations from it, and the guard rewinds the arena on every
//! exit path — early return, `?` propagation, or panic — because release
//! happens in `Drop`.

use bumpalo::Bump;
use parking_lot::Mutex;

use crate::stats::PoolCounters;

/// A freelist of warm [`Bump`] arenas.
pub struct ArenaPool {
    free: Mutex<Vec<Bump>>,
    capacity: usize,
    counters: PoolCounters,
}

impl ArenaPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
            counters: PoolCounters::new(),
        }
    }

    /// Acquire an arena for one operation scope.
    pub fn acquire(&self) -> ArenaGuard<'_> {
        let popped = self.free.lock().pop();
        let bump = match popped {
            Some(bump) => {
                self.counters.record_acquire(true);
                bump
            }
            None => {
                self.counters.record_acquire(false);
                Bump::new()
            }
        };
        ArenaGuard {
            bump: Some(bump),
            pool: self,
        }
    }

    pub fn counters(&self) -> &PoolCounters {
        &self.counters
    }

    fn give_back(&self, mut bump: Bump) {
        bump.reset();
        self.counters.record_release();
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(bump);
        }
    }
}

/// Scope guard holding one arena. Dereferences to [`Bump`]; rewinds and
/// returns the arena to its pool on drop.
pub struct ArenaGuard<'p> {
    bump: Option<Bump>,
    pool: &'p ArenaPool,
}

impl ArenaGuard<'_> {
    /// Bytes currently allocated in this arena.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.as_ref().map(Bump::allocated_bytes).unwrap_or(0)
    }
}

impl std::ops::Deref for ArenaGuard<'_> {
    type Target = Bump;

    fn deref(&self) -> &Bump {
        // Invariant: `bump` is only None after drop.
        self.bump.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for ArenaGuard<'_> {
    fn drop(&mut self) {
        if let Some(bump) = self.bump.take() {
            self.pool.give_back(bump);
        }
    }
}
