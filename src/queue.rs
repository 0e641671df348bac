//! Wait-free single-producer/single-consumer ring queue.
//!
//! Bounded, power-of-two capacity. The two cursors grow monotonically and
//! live on separate cache lines to avoid false sharing; the effective slot
//! for cursor `k` is `buffer[k & (capacity - 1)]`.
//!
//! The queue is split into a [`Producer`] and a [`Consumer`] handle, so the
//! one-producer/one-consumer contract is enforced by ownership: the handles
//! are `Send` but cannot be cloned.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An atomic cursor padded out to its own cache line.
#[repr(align(64))]
struct Cursor(AtomicU64);

struct Inner<T> {
    /// Next slot the producer will write. Monotonic.
    write: Cursor,
    /// Next slot the consumer will read. Monotonic.
    read: Cursor,
    mask: u64,
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// SAFETY: slots are only touched under the SPSC protocol below; a slot is
// written by the single producer strictly before the release store that
// publishes it, and read by the single consumer strictly after the acquire
// load that observes it.
unsafe impl<T: Send> Send for Inner<T> {}
unsafe impl<T: Send> Sync for Inner<T> {}

/// Create a bounded SPSC queue with the given power-of-two capacity.
///
/// # Panics
/// Panics if `capacity` is zero or not a power of two.
pub fn spsc<T: Copy>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(
        capacity > 0 && capacity.is_power_of_two(),
        "queue capacity must be a non-zero power of two"
    );

    let buffer = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let inner = Arc::new(Inner {
        write: Cursor(AtomicU64::new(0)),
        read: Cursor(AtomicU64::new(0)),
        mask: capacity as u64 - 1,
        buffer,
    });

    (
        Producer {
            inner: Arc::clone(&inner),
        },
        Consumer { inner },
    )
}

/// Producer half of the queue. Exactly one exists per queue.
pub struct Producer<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Copy> Producer<T> {
    /// Push an item. Returns `false` iff the queue is full (no side effect).
    #[inline]
    pub fn push(&mut self, item: T) -> bool {
        let inner = &*self.inner;
        let write = inner.write.0.load(Ordering::Relaxed);
        let read = inner.read.0.load(Ordering::Acquire);

        // Occupancy is write - read on monotonic cursors.
        if write - read == inner.mask + 1 {
            return false;
        }

        let slot = &inner.buffer[(write & inner.mask) as usize];
        // SAFETY: the slot at `write` is not visible to the consumer until
        // the release store below, and this is the only producer.
        unsafe { (*slot.get()).write(item) };

        inner.write.0.store(write + 1, Ordering::Release);
        true
    }

    /// Number of items currently queued.
    #[inline]
    pub fn len(&self) -> usize {
        let write = self.inner.write.0.load(Ordering::Acquire);
        let read = self.inner.read.0.load(Ordering::Acquire);
        (write - read) as usize
    }

    /// Returns true if the queue holds no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.mask as usize + 1
    }
}

/// Consumer half of the queue. Exactly one exists per queue.
pub struct Consumer<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Copy> Consumer<T> {
    /// Pop the next item in FIFO order, or `None` if the queue is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let inner = &*self.inner;
        let read = inner.read.0.load(Ordering::Relaxed);
        let write = inner.write.0.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let slot = &inner.buffer[(read & inner.mask) as usize];
        // SAFETY: the acquire load above observed the producer's release
        // store for this slot, so it holds an initialised value, and this is
        // the only consumer.
        let value = unsafe { (*slot.get()).assume_init() };

        inner.read.0.store(read + 1, Ordering::Release);
        Some(value)
    }

    /// Number of items currently queued.
    #[inline]
    pub fn len(&self) -> usize {
        let write = self.inner.write.0.load(Ordering::Acquire);
        let read = self.inner.read.0.load(Ordering::Acquire);
        (write - read) as usize
    }

    /// Returns true if the queue holds no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.mask as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_fifo() {
        let (mut tx, mut rx) = spsc::<u64>(8);

        for i in 0..5 {
            assert!(tx.push(i));
        }
        assert_eq!(tx.len(), 5);

        for i in 0..5 {
            assert_eq!(rx.pop(), Some(i));
        }
        assert!(rx.is_empty());
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_full_queue_rejects() {
        let (mut tx, mut rx) = spsc::<u64>(4);

        for i in 0..4 {
            assert!(tx.push(i));
        }
        // Full: push fails with no side effect.
        assert!(!tx.push(99));
        assert_eq!(tx.len(), 4);

        assert_eq!(rx.pop(), Some(0));
        assert!(tx.push(99));
        assert_eq!(rx.pop(), Some(1));
        assert_eq!(rx.pop(), Some(2));
        assert_eq!(rx.pop(), Some(3));
        assert_eq!(rx.pop(), Some(99));
    }

    #[test]
    fn test_wraparound() {
        let (mut tx, mut rx) = spsc::<u64>(4);

        // Cycle through the ring several times.
        for round in 0..10u64 {
            for i in 0..4 {
                assert!(tx.push(round * 4 + i));
            }
            for i in 0..4 {
                assert_eq!(rx.pop(), Some(round * 4 + i));
            }
        }
    }

    #[test]
    #[should_panic]
    fn test_non_power_of_two_capacity_panics() {
        let _ = spsc::<u64>(100);
    }

    #[test]
    fn test_threaded_sequence_preserved() {
        const COUNT: u64 = 100_000;
        let (mut tx, mut rx) = spsc::<u64>(1024);

        let producer = std::thread::spawn(move || {
            for i in 0..COUNT {
                while !tx.push(i) {
                    std::thread::yield_now();
                }
            }
        });

        let mut expected = 0u64;
        while expected < COUNT {
            if let Some(value) = rx.pop() {
                assert_eq!(value, expected, "items reordered or lost");
                expected += 1;
            } else {
                std::hint::spin_loop();
            }
        }
        assert_eq!(rx.pop(), None);

        producer.join().unwrap();
    }
}
