mod channel;
pub(crate) mod inner_spsc;


pub use channel::{Consumer, DEFAULT_CAPACITY, Fifo, FifoBuilder, Producer};
