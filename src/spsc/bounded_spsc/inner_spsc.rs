use crate::error::{Error, PushError, Result};
use crossbeam::utils::CachePadded;
use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::atomic::{
        AtomicUsize,
        Ordering::{Acquire, Relaxed, Release},
    },
};

/// Fixed-capacity ring shared by one [`super::channel::Producer`] and one
/// [`super::channel::Consumer`].
///
/// # Overview
///
/// `RingBuffer` stores up to `capacity - 1` elements in a contiguous slot
/// array. The write cursor is advanced only by the producer, the read cursor
/// only by the consumer. One slot is always left empty so that
/// `read == write` means empty and `next(write) == read` means full, with no
/// shared count to contend on.
///
/// # Cache padding
///
/// Both cursors are wrapped in [`CachePadded`] so the producer's stores do not
/// invalidate the consumer's cache line and vice versa.
///
/// # Memory ordering
///
/// Each side owns one cursor and reads the other:
///
/// | side     | own cursor load | peer cursor load | own cursor store |
/// |----------|-----------------|------------------|------------------|
/// | producer | `Relaxed`       | `Acquire` (read) | `Release` (write)|
/// | consumer | `Relaxed`       | `Acquire` (write)| `Release` (read) |
///
/// The producer writes the slot *before* its `Release` store of `write`, and
/// the consumer's `Acquire` load of `write` synchronizes with it, so a slot
/// below the observed write cursor is always fully written. Symmetrically the
/// consumer moves the element out *before* its `Release` store of `read`, so
/// when the producer observes the new read cursor the vacated slot is free.
///
/// # Wrap-around logic
///
/// Cursors stay in `0..capacity`. Instead of `% capacity` the increment is
/// masked by a comparison:
///
/// ```rust
/// let index = 3;
/// let capacity = 4;
/// let next_index = (index + 1) * ((index + 1) < capacity) as usize;
/// assert_eq!(next_index, 0);
/// ```
pub(crate) struct RingBuffer<T> {
    write: CachePadded<AtomicUsize>,
    read: CachePadded<AtomicUsize>,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// Slots are handed between exactly one producer and one consumer; ownership
// of each slot is decided by the cursor pair.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Allocates `capacity` slots with both cursors at zero.
    pub(crate) fn new(capacity: usize) -> Result<Self> {
        if capacity < 2 {
            return Err(Error::CapacityTooSmall { capacity });
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| Error::Allocation { capacity })?;
        // SAFETY: the capacity is reserved and `UnsafeCell<MaybeUninit<T>>`
        // needs no initialization. Constant time, also for zero-sized `T`.
        unsafe { slots.set_len(capacity) };

        Ok(Self {
            write: CachePadded::new(AtomicUsize::new(0)),
            read: CachePadded::new(AtomicUsize::new(0)),
            slots: slots.into_boxed_slice(),
        })
    }

    #[inline(always)]
    fn next(&self, index: usize) -> usize {
        (index + 1) * ((index + 1) < self.slots.len()) as usize
    }

    /// Copies `value` into the slot under the write cursor and publishes it.
    ///
    /// Returns the item back inside [`PushError`] if the ring is full.
    ///
    /// # Safety
    ///
    /// The caller must be the only thread pushing into this ring.
    #[inline]
    pub(crate) unsafe fn push(&self, value: T) -> std::result::Result<(), PushError<T>> {
        let write = self.write.load(Relaxed);
        let next_write = self.next(write);

        let read = self.read.load(Acquire);
        if next_write == read {
            tracing::trace!(write, read, "push rejected, queue is full");
            return Err(PushError(value));
        }

        // The slot at `write` is outside `read..write`, so the consumer
        // does not touch it until the store below.
        unsafe { (*self.slots[write].get()).write(value) };
        self.write.store(next_write, Release);
        Ok(())
    }

    /// Moves the element under the read cursor out and releases its slot.
    ///
    /// # Safety
    ///
    /// The caller must be the only thread popping from or peeking into this
    /// ring, and must not hold a reference obtained from [`peek`](Self::peek).
    #[inline]
    pub(crate) unsafe fn pop(&self) -> Result<T> {
        let read = self.read.load(Relaxed);

        let write = self.write.load(Acquire);
        if read == write {
            tracing::trace!(write, read, "pop rejected, queue is empty");
            return Err(Error::Underflow);
        }

        let value = unsafe { (*self.slots[read].get()).assume_init_read() };
        self.read.store(self.next(read), Release);
        Ok(value)
    }

    /// Returns a pointer to the element under the read cursor without
    /// advancing it.
    ///
    /// # Safety
    ///
    /// The caller must be the only consumer. The pointee stays valid until
    /// the next [`pop`](Self::pop).
    #[inline]
    pub(crate) unsafe fn peek(&self) -> Result<*const T> {
        let read = self.read.load(Relaxed);

        let write = self.write.load(Acquire);
        if read == write {
            tracing::trace!(write, read, "peek rejected, queue is empty");
            return Err(Error::Underflow);
        }

        Ok(unsafe { (*self.slots[read].get()).as_ptr() })
    }

    /// Number of slots allocated, including the reserved one.
    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of elements the ring can hold at once.
    #[inline(always)]
    pub(crate) fn size(&self) -> usize {
        self.slots.len() - 1
    }

    /// Occupied slots, `(write - read) mod capacity`.
    ///
    /// The two cursors are loaded one after the other, not as a pair. Under
    /// concurrent use the result is an estimate: see
    /// [`Producer::used`](super::channel::Producer::used) and
    /// [`Consumer::used`](super::channel::Consumer::used) for which way it errs.
    #[inline]
    pub(crate) fn used(&self) -> usize {
        let write = self.write.load(Acquire);
        let read = self.read.load(Acquire);
        if write >= read {
            write - read
        } else {
            write + self.slots.len() - read
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.write.load(Acquire) == self.read.load(Acquire)
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        let write = self.write.load(Acquire);
        self.next(write) == self.read.load(Acquire)
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        // `&mut self`: both handles are gone, plain reads are enough.
        let write = *self.write.get_mut();
        let mut idx = *self.read.get_mut();
        while idx != write {
            unsafe { self.slots[idx].get_mut().assume_init_drop() };
            idx = self.next(idx);
        }
    }
}
