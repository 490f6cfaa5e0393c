//! Lock-free, bounded, single-producer single-consumer FIFO.
//!
//! [`Fifo::split`] allocates a ring of `capacity` slots and returns the only
//! [`Producer`] and the only [`Consumer`] for it. Neither handle is `Clone`
//! and every operation that moves a cursor takes `&mut self`, so the
//! one-producer/one-consumer discipline is enforced by ownership.
//!
//! # Example
//! ```
//! use spsc_fifo::{Error, Fifo};
//!
//! let (mut tx, mut rx) = Fifo::split(32).unwrap();
//! assert_eq!(tx.size(), 31);
//!
//! tx.push(42).unwrap();
//! assert_eq!(rx.peek(), Ok(&42));
//! assert_eq!(rx.pop(), Ok(42));
//! assert_eq!(rx.pop(), Err(Error::Underflow));
//! ```
//!
//! # Blocking consumers
//!
//! Nothing here blocks. A consumer that wants to sleep while the queue is
//! empty attaches a [`Notify`] handle such as [`Semaphore`] to the producer
//! and waits on it after an `Underflow`:
//!
//! ```
//! use spsc_fifo::{Fifo, Semaphore};
//! use std::sync::Arc;
//!
//! let ready = Arc::new(Semaphore::new(0));
//! let (mut tx, mut rx) = Fifo::builder(8).notifier(ready.clone()).split().unwrap();
//!
//! std::thread::spawn(move || tx.push("hello").unwrap());
//!
//! ready.wait();
//! assert_eq!(rx.pop(), Ok("hello"));
//! ```
//!
//! [`Semaphore`]: crate::notify::Semaphore

use super::inner_spsc::RingBuffer;
use crate::error::{PushError, Result};
use crate::notify::Notify;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Capacity used by the demonstration program.
pub const DEFAULT_CAPACITY: usize = 32;

/// Entry point for creating a FIFO and splitting it into its two halves.
pub struct Fifo;

impl Fifo {
    /// Creates a FIFO with `capacity` slots, `capacity - 1` of them usable.
    ///
    /// Fails with [`Error::CapacityTooSmall`](crate::Error::CapacityTooSmall)
    /// below two slots and [`Error::Allocation`](crate::Error::Allocation) if
    /// the storage cannot be reserved.
    pub fn split<T: Send>(capacity: usize) -> Result<(Producer<T>, Consumer<T>)> {
        Self::builder(capacity).split()
    }

    /// Starts configuring a FIFO with `capacity` slots.
    pub fn builder(capacity: usize) -> FifoBuilder {
        FifoBuilder {
            capacity,
            notifier: None,
        }
    }
}

/// Construction-time settings for a FIFO.
pub struct FifoBuilder {
    capacity: usize,
    notifier: Option<Arc<dyn Notify>>,
}

impl FifoBuilder {
    /// Signals `notifier` once per successful push.
    pub fn notifier(mut self, notifier: Arc<dyn Notify>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Allocates the ring and returns its only producer and consumer.
    ///
    /// Fails like [`Fifo::split`].
    pub fn split<T: Send>(self) -> Result<(Producer<T>, Consumer<T>)> {
        let inner = Arc::new(RingBuffer::new(self.capacity)?);
        tracing::debug!(
            capacity = self.capacity,
            usable = inner.size(),
            notifier = self.notifier.is_some(),
            "created fifo"
        );

        let producer = Producer {
            inner: Arc::clone(&inner),
            notifier: self.notifier,
        };
        let consumer = Consumer {
            inner,
            _not_sync: PhantomData,
        };
        Ok((producer, consumer))
    }
}

impl fmt::Debug for FifoBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FifoBuilder")
            .field("capacity", &self.capacity)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

/// The writing half of a FIFO.
pub struct Producer<T> {
    inner: Arc<RingBuffer<T>>,
    notifier: Option<Arc<dyn Notify>>,
}

impl<T> Producer<T> {
    /// Appends `value` at the back of the queue.
    ///
    /// Fails with the item handed back inside [`PushError`] if the queue is
    /// full; nothing is written in that case. On success the attached
    /// notifier, if any, is signalled exactly once.
    #[inline]
    pub fn push(&mut self, value: T) -> std::result::Result<(), PushError<T>> {
        // SAFETY: `Producer` is not `Clone` and `push` takes `&mut self`.
        unsafe { self.inner.push(value)? };
        if let Some(notifier) = &self.notifier {
            notifier.notify();
        }
        Ok(())
    }

    /// Replaces the notifier signalled on each push, returning the old one.
    ///
    /// `None` disables notification.
    pub fn attach_notifier(&mut self, notifier: Option<Arc<dyn Notify>>) -> Option<Arc<dyn Notify>> {
        tracing::debug!(attached = notifier.is_some(), "fifo notifier changed");
        std::mem::replace(&mut self.notifier, notifier)
    }

    /// Usable capacity, one less than the allocated slots.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// Allocated slots, including the reserved one.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Occupied slots as seen by the producer.
    ///
    /// Exact for the producer's own pushes. The consumer may pop concurrently,
    /// so this is an upper bound on the true occupancy.
    #[inline]
    pub fn used(&self) -> usize {
        self.inner.used()
    }

    /// `size() - used()`; a lower bound on the slots a push can fill.
    #[inline]
    pub fn free(&self) -> usize {
        self.size() - self.used()
    }

    /// Returns `true` if a push would currently fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Returns `true` if a pop would currently fail.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("size", &self.size())
            .field("used", &self.used())
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

/// The reading half of a FIFO.
pub struct Consumer<T> {
    inner: Arc<RingBuffer<T>>,
    // `peek` hands out `&T`; sharing `&Consumer` across threads would need `T: Sync`.
    _not_sync: PhantomData<Cell<()>>,
}

impl<T> Consumer<T> {
    /// Removes and returns the element at the front of the queue.
    ///
    /// Fails with [`Error::Underflow`](crate::Error::Underflow) if the queue
    /// is empty.
    #[inline]
    pub fn pop(&mut self) -> Result<T> {
        // SAFETY: `Consumer` is not `Clone`, `pop` takes `&mut self`, so no
        // reference from `peek` is alive.
        unsafe { self.inner.pop() }
    }

    /// Borrows the element at the front of the queue without removing it.
    ///
    /// Repeated calls return the same element until the next [`pop`](Self::pop),
    /// which returns it.
    #[inline]
    pub fn peek(&self) -> Result<&T> {
        // SAFETY: only the consumer moves the read cursor and it needs
        // `&mut self` to do so, which ends this borrow first. The producer
        // never writes a slot between the read and write cursors.
        unsafe { self.inner.peek().map(|ptr| &*ptr) }
    }

    /// Usable capacity, one less than the allocated slots.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// Allocated slots, including the reserved one.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Occupied slots as seen by the consumer.
    ///
    /// Every slot counted here can be popped. The producer may push
    /// concurrently, so this is a lower bound on the true occupancy.
    #[inline]
    pub fn used(&self) -> usize {
        self.inner.used()
    }

    /// `size() - used()`.
    #[inline]
    pub fn free(&self) -> usize {
        self.size() - self.used()
    }

    /// Returns `true` if a push would currently fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Returns `true` if a pop would currently fail.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("size", &self.size())
            .field("used", &self.used())
            .finish()
    }
}
