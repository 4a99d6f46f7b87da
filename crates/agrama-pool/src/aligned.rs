//! 32-byte-aligned f32 buffers for width-8 SIMD kernels.
//!
//! Allocation sizes are rounded up to a 32-byte multiple so an 8-lane f32
//! load never straddles the end of the buffer; the padding lanes stay zero.

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;

use parking_lot::Mutex;

use agrama_core::constants::EMBEDDING_ALIGN;

use crate::stats::PoolCounters;

/// Round an element count up to the next multiple of 8 f32 lanes.
fn padded_len(len: usize) -> usize {
    len.div_ceil(8) * 8
}

fn layout_for(padded: usize) -> Layout {
    // Alignment is a constant power of two and embedding dimensions are
    // bounded, so this cannot fail in practice.
    Layout::from_size_align(padded * std::mem::size_of::<f32>(), EMBEDDING_ALIGN)
        .unwrap_or_else(|_| unreachable!("embedding buffer layout overflow"))
}

/// An owned, 32-byte-aligned f32 buffer.
///
/// Logical length is `len`; physical capacity is padded to a multiple of 8
/// lanes and the padding is kept zeroed.
pub struct AlignedVec {
    ptr: NonNull<f32>,
    len: usize,
    padded: usize,
}

// The buffer is uniquely owned heap memory.
unsafe impl Send for AlignedVec {}
unsafe impl Sync for AlignedVec {}

impl AlignedVec {
    /// A zero-filled buffer of the given logical length.
    pub fn zeroed(len: usize) -> Self {
        let padded = padded_len(len.max(1));
        let layout = layout_for(padded);
        // SAFETY: layout has nonzero size.
        let raw = unsafe { alloc_zeroed(layout) } as *mut f32;
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };
        Self { ptr, len, padded }
    }

    /// A buffer holding a copy of `values`.
    pub fn from_slice(values: &[f32]) -> Self {
        let mut buf = Self::zeroed(values.len());
        buf.as_mut_slice().copy_from_slice(values);
        buf
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[f32] {
        // SAFETY: ptr covers `padded >= len` initialized elements.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        // SAFETY: as above; unique ownership.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// The buffer including its zero padding, always a multiple of 8 lanes.
    /// This is the view SIMD kernels read.
    pub fn padded_slice(&self) -> &[f32] {
        // SAFETY: the full padded region is allocated and initialized.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.padded) }
    }

    /// Zero the whole buffer, padding included.
    pub fn clear(&mut self) {
        // SAFETY: the full padded region is allocated.
        unsafe { std::ptr::write_bytes(self.ptr.as_ptr(), 0, self.padded) };
    }

    /// Resize the logical length within the same physical block if the
    /// padded capacity allows it; otherwise reallocate.
    fn reshape(&mut self, len: usize) {
        if padded_len(len.max(1)) == self.padded {
            self.len = len;
            self.clear();
        } else {
            *self = Self::zeroed(len);
        }
    }
}

impl Drop for AlignedVec {
    fn drop(&mut self) {
        // SAFETY: allocated with the identical layout in `zeroed`.
        unsafe { dealloc(self.ptr.as_ptr() as *mut u8, layout_for(self.padded)) };
    }
}

impl Clone for AlignedVec {
    fn clone(&self) -> Self {
        Self::from_slice(self.as_slice())
    }
}

impl std::ops::Deref for AlignedVec {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        self.as_slice()
    }
}

impl std::fmt::Debug for AlignedVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedVec").field("len", &self.len).finish()
    }
}

impl PartialEq for AlignedVec {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

/// A bounded freelist of [`AlignedVec`] buffers of one fixed dimension.
pub struct AlignedVecPool {
    dimension: usize,
    free: Mutex<Vec<AlignedVec>>,
    capacity: usize,
    counters: PoolCounters,
}

impl AlignedVecPool {
    pub fn new(dimension: usize, capacity: usize) -> Self {
        Self {
            dimension,
            free: Mutex::new(Vec::new()),
            capacity,
            counters: PoolCounters::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Acquire a zeroed buffer of the pool's dimension.
    pub fn acquire(&self) -> AlignedVec {
        let popped = self.free.lock().pop();
        match popped {
            Some(mut buf) => {
                self.counters.record_acquire(true);
                buf.reshape(self.dimension);
                buf
            }
            None => {
                self.counters.record_acquire(false);
                AlignedVec::zeroed(self.dimension)
            }
        }
    }

    /// Return a buffer. Wrong-dimension buffers are dropped rather than
    /// poisoning the freelist.
    pub fn release(&self, buf: AlignedVec) {
        self.counters.record_release();
        if buf.len() != self.dimension {
            return;
        }
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(buf);
        }
    }

    pub fn counters(&self) -> &PoolCounters {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_32_byte_aligned() {
        for len in [1, 7, 8, 64, 768, 1000] {
            let buf = AlignedVec::zeroed(len);
            assert_eq!(buf.as_slice().as_ptr() as usize % EMBEDDING_ALIGN, 0);
            assert_eq!(buf.padded_slice().len() % 8, 0);
            assert!(buf.padded_slice().len() >= len);
        }
    }

    #[test]
    fn from_slice_round_trips() {
        let values: Vec<f32> = (0..77).map(|i| i as f32 * 0.5).collect();
        let buf = AlignedVec::from_slice(&values);
        assert_eq!(buf.as_slice(), values.as_slice());
        // Padding beyond the logical length is zero.
        assert!(buf.padded_slice()[77..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn pool_reuses_and_zeroes() {
        let pool = AlignedVecPool::new(64, 4);
        let mut buf = pool.acquire();
        buf.as_mut_slice().fill(3.5);
        pool.release(buf);

        let buf = pool.acquire();
        assert_eq!(pool.counters().snapshot().hits, 1);
        assert!(buf.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn clone_is_deep() {
        let mut a = AlignedVec::from_slice(&[1.0, 2.0, 3.0]);
        let b = a.clone();
        a.as_mut_slice()[0] = 9.0;
        assert_eq!(b.as_slice(), &[1.0, 2.0, 3.0]);
    }
}
