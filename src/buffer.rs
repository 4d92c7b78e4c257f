//! Bounded FIFO buffer shared between producer and consumer threads.
//!
//! # Overview
//!
//! - Fixed capacity chosen at construction
//! - Two counting semaphores carry the accounting: free slots and ready items
//! - A single mutex serializes every queue access
//! - [`BoundedBuffer::produce`] blocks while the buffer is full;
//!   [`BoundedBuffer::consume`] blocks while it is empty
//!
//! Neither operation can fail: capacity is a hard resource limit enforced by
//! the semaphore wait, not a runtime check. Semaphore updates happen outside
//! the queue lock: a producer appends, leaves the critical section, and only
//! then signals item availability, so a consumer never observes the signal
//! before the append is committed.
//!
//! # Example
//!
//! ```
//! use silo::buffer::BoundedBuffer;
//!
//! let buffer = BoundedBuffer::new(4);
//!
//! buffer.produce(1u32);
//! buffer.produce(2u32);
//!
//! assert_eq!(buffer.consume(), 1);
//! assert_eq!(buffer.consume(), 2);
//! assert!(buffer.is_empty());
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::sync::semaphore::{Semaphore, Timeout};

/// Fixed-capacity FIFO queue with blocking produce and consume.
///
/// Shared by reference (typically `Arc`) across any number of producer and
/// consumer threads. Each produced item is consumed exactly once; which
/// consumer receives it is up to the OS scheduler.
pub struct BoundedBuffer<T> {
    queue: Mutex<VecDeque<T>>,
    /// Free capacity; producers take one permit per append.
    free_slots: Semaphore,
    /// Ready items; consumers take one permit per removal.
    items: Semaphore,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    /// Creates a buffer holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be greater than 0");
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            free_slots: Semaphore::new(capacity),
            items: Semaphore::new(0),
            capacity,
        }
    }

    /// Appends an item, blocking while the buffer is full.
    pub fn produce(&self, item: T) {
        self.produce_with(item, || {});
    }

    /// Appends an item and runs `critical` before the queue lock is released.
    ///
    /// Blocks while the buffer is full. The hook executes inside the critical
    /// section, serialized with every other buffer access; use it for work
    /// that must not interleave with other producers or consumers, such as
    /// emitting progress output.
    pub fn produce_with<F: FnOnce()>(&self, item: T, critical: F) {
        self.free_slots.acquire();
        self.append(item, critical);
        self.items.release();
    }

    /// Attempts to append without blocking.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` if the buffer is full, allowing retry.
    pub fn try_produce(&self, item: T) -> Result<(), T> {
        if !self.free_slots.try_acquire() {
            return Err(item);
        }
        self.append(item, || {});
        self.items.release();
        Ok(())
    }

    /// Appends an item, blocking until space is available or the timeout
    /// expires.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` on timeout.
    pub fn produce_timeout(&self, item: T, timeout: Timeout) -> Result<(), T> {
        if !self.free_slots.acquire_timeout(timeout) {
            return Err(item);
        }
        self.append(item, || {});
        self.items.release();
        Ok(())
    }

    /// Removes the oldest item, blocking while the buffer is empty.
    pub fn consume(&self) -> T {
        self.consume_with(|_| {})
    }

    /// Removes the oldest item and runs `critical` before the queue lock is
    /// released.
    ///
    /// Blocks while the buffer is empty. The hook receives a reference to the
    /// removed item and executes inside the critical section; see
    /// [`BoundedBuffer::produce_with`].
    pub fn consume_with<F: FnOnce(&T)>(&self, critical: F) -> T {
        self.items.acquire();
        let item = self.remove_front(critical);
        self.free_slots.release();
        item
    }

    /// Attempts to remove the oldest item without blocking.
    ///
    /// Returns `None` if the buffer is empty.
    #[must_use]
    pub fn try_consume(&self) -> Option<T> {
        if !self.items.try_acquire() {
            return None;
        }
        let item = self.remove_front(|_| {});
        self.free_slots.release();
        Some(item)
    }

    /// Removes the oldest item, blocking until one is available or the
    /// timeout expires.
    ///
    /// Returns `None` on timeout.
    #[must_use]
    pub fn consume_timeout(&self, timeout: Timeout) -> Option<T> {
        if !self.items.acquire_timeout(timeout) {
            return None;
        }
        let item = self.remove_front(|_| {});
        self.free_slots.release();
        Some(item)
    }

    /// Maximum number of items the buffer can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current queue length.
    ///
    /// A snapshot only; exact once all workers have quiesced.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().expect("buffer mutex poisoned").len()
    }

    /// Whether the queue is currently empty. Snapshot semantics as [`len`].
    ///
    /// [`len`]: BoundedBuffer::len
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free-slot permit count. At quiescence, `free_slots() + len()` equals
    /// the capacity.
    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.free_slots.available()
    }

    /// Ready-item permit count. At quiescence this equals `len()`.
    #[must_use]
    pub fn ready_items(&self) -> usize {
        self.items.available()
    }

    /// Critical section of a produce: append, then run the hook under the
    /// lock. Caller must hold a free-slot permit.
    fn append<F: FnOnce()>(&self, item: T, critical: F) {
        let mut queue = self.queue.lock().expect("buffer mutex poisoned");
        // A held free-slot permit guarantees room; anything else means the
        // counting protocol itself is broken.
        assert!(
            queue.len() < self.capacity,
            "free-slot permit granted on a full buffer"
        );
        queue.push_back(item);
        critical();
    }

    /// Critical section of a consume: remove the front item, then run the
    /// hook under the lock. Caller must hold an item permit.
    fn remove_front<F: FnOnce(&T)>(&self, critical: F) -> T {
        let mut queue = self.queue.lock().expect("buffer mutex poisoned");
        let item = queue
            .pop_front()
            .expect("item permit granted on an empty buffer");
        critical(&item);
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_basic_produce_consume() {
        let buffer = BoundedBuffer::new(8);

        buffer.produce(42u64);
        assert_eq!(buffer.consume(), 42);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let buffer = BoundedBuffer::new(16);

        for i in 0..10u64 {
            buffer.produce(i);
        }

        for i in 0..10u64 {
            assert_eq!(buffer.consume(), i);
        }
    }

    #[test]
    fn test_try_produce_full() {
        let buffer = BoundedBuffer::new(2);

        assert!(buffer.try_produce(1u64).is_ok());
        assert!(buffer.try_produce(2u64).is_ok());
        assert_eq!(buffer.try_produce(999u64), Err(999));

        assert_eq!(buffer.consume(), 1);
        assert!(buffer.try_produce(3u64).is_ok());
        assert_eq!(buffer.try_produce(1000u64), Err(1000));
    }

    #[test]
    fn test_try_consume_empty() {
        let buffer = BoundedBuffer::new(4);

        assert_eq!(buffer.try_consume(), None);

        buffer.produce(7u64);
        assert_eq!(buffer.try_consume(), Some(7));
        assert_eq!(buffer.try_consume(), None);
    }

    #[test]
    fn test_produce_timeout_full() {
        let buffer = BoundedBuffer::new(1);
        buffer.produce(1u64);

        let result = buffer.produce_timeout(2u64, Timeout::Duration(Duration::from_millis(20)));
        assert_eq!(result, Err(2));
    }

    #[test]
    fn test_consume_timeout_empty() {
        let buffer = BoundedBuffer::<u64>::new(4);

        let start = std::time::Instant::now();
        let result = buffer.consume_timeout(Timeout::Duration(Duration::from_millis(20)));
        assert_eq!(result, None);
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_permit_accounting() {
        let buffer = BoundedBuffer::new(5);

        assert_eq!(buffer.capacity(), 5);
        assert_eq!(buffer.free_slots(), 5);
        assert_eq!(buffer.ready_items(), 0);

        buffer.produce(1u64);
        buffer.produce(2u64);
        buffer.produce(3u64);

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.free_slots(), 2);
        assert_eq!(buffer.ready_items(), 3);
        assert_eq!(buffer.free_slots() + buffer.len(), buffer.capacity());

        buffer.consume();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.free_slots(), 3);
        assert_eq!(buffer.ready_items(), 2);
    }

    #[test]
    fn test_critical_hooks_run_per_operation() {
        let buffer = BoundedBuffer::new(4);
        let produced = AtomicBool::new(false);
        let consumed = AtomicBool::new(false);

        buffer.produce_with(11u64, || produced.store(true, Ordering::Relaxed));
        assert!(produced.load(Ordering::Relaxed));

        let item = buffer.consume_with(|item| {
            assert_eq!(*item, 11);
            consumed.store(true, Ordering::Relaxed);
        });
        assert_eq!(item, 11);
        assert!(consumed.load(Ordering::Relaxed));
    }

    #[test]
    fn test_blocked_consumer_wakes_on_produce() {
        let buffer = Arc::new(BoundedBuffer::new(1));

        let consumer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.consume())
        };

        // Give the consumer time to park on the empty buffer.
        thread::sleep(Duration::from_millis(50));
        buffer.produce(7u64);

        assert_eq!(consumer.join().unwrap(), 7);
    }

    #[test]
    fn test_blocked_producer_wakes_on_consume() {
        let buffer = Arc::new(BoundedBuffer::new(1));
        buffer.produce(1u64);

        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.produce(2))
        };

        // Give the producer time to park on the full buffer.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(buffer.consume(), 1);

        producer.join().unwrap();
        assert_eq!(buffer.consume(), 2);
    }

    #[test]
    fn test_concurrent_produce_consume() {
        let buffer = Arc::new(BoundedBuffer::new(8));
        let count = 1000u64;

        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for i in 0..count {
                    buffer.produce(i);
                }
            })
        };

        let consumer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                let mut received = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    received.push(buffer.consume());
                }
                received
            })
        };

        producer.join().unwrap();
        let received = consumer.join().unwrap();

        // Single producer, single consumer: FIFO order is observable.
        for (i, &value) in received.iter().enumerate() {
            assert_eq!(value, i as u64);
        }
        assert!(buffer.is_empty());
        assert_eq!(buffer.free_slots(), buffer.capacity());
    }

    #[test]
    fn test_non_copy_type() {
        let buffer = BoundedBuffer::new(4);

        buffer.produce("hello".to_string());
        buffer.produce("world".to_string());

        assert_eq!(buffer.consume(), "hello");
        assert_eq!(buffer.consume(), "world");
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_zero_capacity_rejected() {
        let _ = BoundedBuffer::<u64>::new(0);
    }
}
