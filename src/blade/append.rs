//! Fixed-capacity append buffer with an atomic write cursor.
//!
//! The CPU counterpart of a GPU append buffer: a pre-allocated slot array
//! paired with an atomically incremented write index. Reservation is a
//! compare-and-swap loop capped at capacity, so the counter saturates at
//! exactly `capacity` and no slot is ever double-assigned. Writes that lose
//! the capacity race are dropped, which is the documented resource-budget
//! policy rather than an error.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

use bytemuck::Zeroable;

pub struct AppendBuffer<T> {
    slots: Box<[UnsafeCell<T>]>,
    counter: AtomicU32,
}

// Safety: `reserve` hands out each slot index at most once between resets,
// so concurrent `push` calls write disjoint slots. Reading the written
// prefix requires `&mut self`.
unsafe impl<T: Send> Sync for AppendBuffer<T> {}

impl<T: Copy + Zeroable> AppendBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(T::zeroed()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            counter: AtomicU32::new(0),
        }
    }

    /// Reset the write cursor. Exclusive access required: the counter is
    /// reset only by the orchestrator, never by a writer.
    pub fn reset(&mut self) {
        *self.counter.get_mut() = 0;
    }

    /// Reserve the next slot, or None once the buffer is full.
    fn reserve(&self) -> Option<usize> {
        let capacity = self.slots.len() as u32;
        let mut current = self.counter.load(Ordering::Relaxed);
        loop {
            if current >= capacity {
                return None;
            }
            match self.counter.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Some(current as usize),
                Err(observed) => current = observed,
            }
        }
    }

    /// Append a value. Returns false if the buffer was full and the value
    /// was dropped.
    pub fn push(&self, value: T) -> bool {
        match self.reserve() {
            Some(index) => {
                // Safety: `index` is uniquely owned by this call (see the
                // Sync impl above).
                unsafe { *self.slots[index].get() = value };
                true
            }
            None => false,
        }
    }

    /// Number of values written since the last reset. Never exceeds
    /// capacity.
    pub fn len(&self) -> usize {
        self.counter.load(Ordering::Acquire) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The written prefix. Exclusive access guarantees no writer is racing.
    pub fn as_slice(&mut self) -> &[T] {
        let len = *self.counter.get_mut() as usize;
        // Safety: UnsafeCell<T> has the same layout as T, and no concurrent
        // writers exist under &mut self.
        unsafe { std::slice::from_raw_parts(self.slots.as_ptr() as *const T, len) }
    }
}
