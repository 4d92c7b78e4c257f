//! Counting semaphore with parked waiters.
//!
//! An integer permit count supporting blocking decrement and non-blocking
//! increment, built on a mutex-guarded counter and a condition variable.
//!
//! # Overview
//!
//! - [`Semaphore::acquire`] - suspend until a permit is available, then take it
//! - [`Semaphore::release`] - return a permit and wake one waiter
//! - A blocked thread is parked by the OS and burns no CPU until woken
//!
//! # Example
//!
//! ```
//! use silo::sync::semaphore::Semaphore;
//!
//! let sem = Semaphore::new(2);
//! sem.acquire();
//! sem.acquire();
//! assert!(!sem.try_acquire());
//! sem.release();
//! assert!(sem.try_acquire());
//! ```

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use minstant::Instant;

/// Timeout specification for blocking operations.
#[derive(Debug, Clone, Copy)]
pub enum Timeout {
    /// Wait indefinitely.
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

/// Counting semaphore.
///
/// The permit count stays in `[0, usize::MAX]`; `acquire` blocks while it is
/// zero. Which of several waiters a `release` wakes is up to the OS
/// scheduler; there is no fairness guarantee.
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Creates a semaphore with `permits` initially available.
    #[must_use]
    pub const fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Blocks until a permit is available, then takes it.
    pub fn acquire(&self) {
        let mut permits = self.permits.lock().expect("semaphore mutex poisoned");
        // Re-check after every wakeup: wakeups can be spurious, and another
        // waiter may have taken the permit first.
        while *permits == 0 {
            permits = self
                .available
                .wait(permits)
                .expect("semaphore mutex poisoned");
        }
        *permits -= 1;
    }

    /// Attempts to take a permit without blocking.
    ///
    /// Returns `false` if no permit is available.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        let mut permits = self.permits.lock().expect("semaphore mutex poisoned");
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Blocks until a permit is available or the timeout expires.
    ///
    /// Returns `true` if a permit was taken.
    #[must_use]
    pub fn acquire_timeout(&self, timeout: Timeout) -> bool {
        let duration = match timeout {
            Timeout::Infinite => {
                self.acquire();
                return true;
            }
            Timeout::Duration(d) => d,
        };
        let deadline = Instant::now() + duration;
        let mut permits = self.permits.lock().expect("semaphore mutex poisoned");
        while *permits == 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .available
                .wait_timeout(permits, deadline - now)
                .expect("semaphore mutex poisoned");
            permits = guard;
        }
        *permits -= 1;
        true
    }

    /// Returns a permit and wakes one waiting thread, if any.
    pub fn release(&self) {
        let mut permits = self.permits.lock().expect("semaphore mutex poisoned");
        *permits += 1;
        drop(permits);
        self.available.notify_one();
    }

    /// Current permit count.
    ///
    /// A snapshot only: another thread may acquire or release immediately
    /// after this returns. Exact once all workers have quiesced.
    #[must_use]
    pub fn available(&self) -> usize {
        *self.permits.lock().expect("semaphore mutex poisoned")
    }
}
