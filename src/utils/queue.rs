//! # Concurrent Queue
//!
//! Mutex-guarded double-ended queue safe for many producers and one or more
//! consumers. This is the only channel through which inbound messages cross
//! from an endpoint's I/O thread to the application's thread(s).
//!
//! Every push wakes exactly one blocked waiter; [`ConcurrentQueue::wait`]
//! loops until the queue is non-empty, so spurious wakeups are harmless.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Thread-safe deque with a blocking wait for arrivals
pub struct ConcurrentQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> ConcurrentQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    // A panicking producer must not wedge every consumer, so poisoning is
    // absorbed rather than propagated.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item to the back of the queue, waking one waiter
    pub fn push_back(&self, item: T) {
        self.lock().push_back(item);
        self.available.notify_one();
    }

    /// Prepend an item to the front of the queue, waking one waiter
    pub fn push_front(&self, item: T) {
        self.lock().push_front(item);
        self.available.notify_one();
    }

    /// Remove and return the front item, if any
    pub fn pop_front(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Remove and return the back item, if any
    pub fn pop_back(&self) -> Option<T> {
        self.lock().pop_back()
    }

    /// Whether the queue is currently empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Discard all queued items
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Block the calling thread until the queue is non-empty.
    ///
    /// Returns immediately if items are already queued. Another consumer may
    /// drain the queue between this returning and a subsequent pop, so pops
    /// still return `Option`.
    pub fn wait(&self) {
        let guard = self.lock();
        let _guard = self
            .available
            .wait_while(guard, |items| items.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
    }
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
