// src/ring.rs
//! Bounded wait-free single-producer single-consumer ring buffer.
//!
//! One slot is sacrificed to distinguish full from empty, so a ring of
//! capacity N holds at most N-1 elements. Each side loads its own index
//! relaxed and the opposing index with acquire, writes or reads the slot,
//! then publishes its index with a release store; the release/acquire pair
//! on an index makes the matching slot access visible. The two indices
//! live on separate cache lines to keep producer and consumer from
//! false-sharing.
//!
//! The queue is safe only under the SPSC discipline: exactly one thread
//! calls `try_push` and exactly one calls `try_pop`.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

pub struct SpscRing<T> {
    buf: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    /// Consumer index; written only by the consumer.
    head: CachePadded<AtomicUsize>,
    /// Producer index; written only by the producer.
    tail: CachePadded<AtomicUsize>,
}

unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

impl<T> SpscRing<T> {
    /// Capacity must be a nonzero power of two.
    pub fn with_capacity(capacity: usize) -> SpscRing<T> {
        assert!(
            capacity.is_power_of_two(),
            "ring capacity must be a nonzero power of two, got {capacity}"
        );
        let buf = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();
        SpscRing {
            buf,
            mask: capacity - 1,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Push from the producer thread. On a full ring the value is handed
    /// back unchanged.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let next = (tail + 1) & self.mask;
        if next == self.head.load(Ordering::Acquire) {
            return Err(value);
        }
        unsafe {
            (*self.buf[tail].get()).write(value);
        }
        self.tail.store(next, Ordering::Release);
        Ok(())
    }

    /// Pop from the consumer thread. `None` iff the ring is empty.
    pub fn try_pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        if head == self.tail.load(Ordering::Acquire) {
            return None;
        }
        let value = unsafe { (*self.buf[head].get()).assume_init_read() };
        self.head.store((head + 1) & self.mask, Ordering::Release);
        Some(value)
    }

    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Approximate occupancy, for diagnostics.
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head) & self.mask
    }

    pub fn capacity(&self) -> usize {
        self.mask + 1
    }
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}
