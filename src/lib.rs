//! Bounded, lock-free single-producer single-consumer FIFO.
//!
//! A fixed ring of `N` slots hands records from exactly one producer thread
//! to exactly one consumer thread. One slot stays empty to tell "full" from
//! "empty", so `N - 1` elements fit at once. Pushing into a full queue fails
//! with a [`PushError`] that hands the item back and converts into
//! [`Error::Overflow`]. Popping from an empty one fails with
//! [`Error::Underflow`]. Neither call ever blocks, and the queue stays usable
//! after either error.
//!
//! ```
//! use spsc_fifo::{Error, Fifo};
//!
//! let (mut tx, mut rx) = Fifo::split::<u32>(4)?;
//! for v in 1..=3 {
//!     tx.push(v)?;
//! }
//! assert_eq!(tx.push(4).map_err(Error::from), Err(Error::Overflow));
//!
//! assert_eq!(rx.pop()?, 1);
//! assert_eq!(rx.used(), 2);
//! # Ok::<(), Error>(())
//! ```

pub mod error;
pub mod notify;
pub mod spsc;

pub use error::{Error, ErrorKind, PushError, Result};
pub use notify::{Notify, Semaphore};
pub use spsc::bounded_spsc::{Consumer, DEFAULT_CAPACITY, Fifo, FifoBuilder, Producer};
