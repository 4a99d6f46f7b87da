//! Fixed-object pools: O(1) acquire/release freelists with a capacity
//! bound and transparent allocator fallback.

use parking_lot::Mutex;

use crate::stats::PoolCounters;

/// Objects that can be recycled through a [`FixedPool`].
///
/// `reset` must return the object to a state indistinguishable from
/// freshly constructed as far as the next user can observe.
pub trait Reset {
    fn reset(&mut self);
}

impl<T> Reset for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

/// A bounded freelist of reusable objects.
///
/// `acquire` pops from the freelist or falls back to `T::default()` when
/// empty (a counted miss). `release` resets the object and returns it
/// unless the pool is already at capacity, in which case the object is
/// dropped to the general allocator.
pub struct FixedPool<T: Default + Reset> {
    free: Mutex<Vec<T>>,
    capacity: usize,
    counters: PoolCounters,
}

impl<T: Default + Reset> FixedPool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
            counters: PoolCounters::new(),
        }
    }

    /// Take an object from the pool, or construct one if the pool is empty.
    pub fn acquire(&self) -> T {
        let popped = self.free.lock().pop();
        match popped {
            Some(obj) => {
                self.counters.record_acquire(true);
                obj
            }
            None => {
                self.counters.record_acquire(false);
                T::default()
            }
        }
    }

    /// Return an object to the pool. Objects beyond capacity are dropped.
    pub fn release(&self, mut obj: T) {
        obj.reset();
        self.counters.record_release();
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(obj);
        }
    }

    /// Number of objects currently sitting in the freelist.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    pub fn counters(&self) -> &PoolCounters {
        &self.counters
    }
}
