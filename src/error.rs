//! Error types returned by the FIFO.
//!
//! Overflow and Underflow are per-call conditions. The queue stays usable
//! after either one.

use std::fmt;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A push was attempted while every usable slot was occupied.
    #[error("queue is full")]
    Overflow,

    /// A pop or peek was attempted on an empty queue.
    #[error("queue is empty")]
    Underflow,

    /// The requested capacity cannot hold any element (one slot is reserved).
    #[error("capacity {capacity} is too small, at least 2 slots are required")]
    CapacityTooSmall { capacity: usize },

    /// The backing store could not be allocated.
    #[error("failed to allocate storage for {capacity} slots")]
    Allocation { capacity: usize },
}

/// Discriminant of [`Error`], for callers that only branch on the condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Overflow,
    Underflow,
    CapacityTooSmall,
    Allocation,
}

impl Error {
    /// The condition behind this error, without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Overflow => ErrorKind::Overflow,
            Error::Underflow => ErrorKind::Underflow,
            Error::CapacityTooSmall { .. } => ErrorKind::CapacityTooSmall,
            Error::Allocation { .. } => ErrorKind::Allocation,
        }
    }
}

/// Returned by a push into a full queue. Hands the rejected item back.
#[derive(Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is full")]
pub struct PushError<T>(pub T);

impl<T> PushError<T> {
    /// Always [`ErrorKind::Overflow`].
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Overflow
    }

    /// Recovers the item that could not be pushed.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

// Manual impl so `T` does not need to be `Debug`.
impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PushError(..)")
    }
}

impl<T> From<PushError<T>> for Error {
    fn from(_: PushError<T>) -> Self {
        Error::Overflow
    }
}
