//! Wake-up signalling for consumers that would rather sleep than poll.
//!
//! A [`Producer`](crate::Producer) with an attached [`Notify`] handle calls
//! [`Notify::notify`] once for every successful push. The handle is owned by
//! the caller; the queue only keeps a shared reference to it.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A counting signal incremented once per pushed element.
pub trait Notify: Send + Sync {
    fn notify(&self);
}

impl<F> Notify for F
where
    F: Fn() + Send + Sync,
{
    #[inline]
    fn notify(&self) {
        self()
    }
}

/// Counting semaphore.
///
/// Each [`post`](Semaphore::post) adds one permit and wakes one waiter; each
/// successful wait takes one permit.
#[derive(Debug, Default)]
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Creates a semaphore holding `initial` permits.
    pub fn new(initial: usize) -> Self {
        Self {
            permits: Mutex::new(initial),
            available: Condvar::new(),
        }
    }

    /// Adds one permit.
    pub fn post(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.available.notify_one();
    }

    /// Blocks until a permit is available, then takes it.
    pub fn wait(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.available.wait(&mut permits);
        }
        *permits -= 1;
    }

    /// Takes a permit if one is available without blocking.
    pub fn try_wait(&self) -> bool {
        let mut permits = self.permits.lock();
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Like [`wait`](Semaphore::wait) but gives up after `timeout`.
    ///
    /// Returns `true` if a permit was taken.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut permits = self.permits.lock();
        while *permits == 0 {
            if self.available.wait_until(&mut permits, deadline).timed_out() {
                break;
            }
        }
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Current number of permits. Stale as soon as it returns.
    pub fn count(&self) -> usize {
        *self.permits.lock()
    }
}

impl Notify for Semaphore {
    #[inline]
    fn notify(&self) {
        self.post();
    }
}
