//! # Ring Item Storage
//!
//! Byte sink and byte source abstractions for ring item producers and
//! consumers.
//!
//! Sinks and sources are **opaque byte stores** - they do not interpret the
//! ring items that pass through them.
//!
//! ## Design Principles
//!
//! - `put`/`get` move whole byte ranges or fail without side effects
//! - Sinks backed by contiguous memory can hand out a [`Reservation`] so an
//!   item is built in place and published with a single cursor advance
//! - A reservation borrows the sink, so it cannot outlive the commit
//!
//! ## Available Implementations
//!
//! - [`RingBuffer`] - Fixed-capacity circular buffer supporting reservations
//! - [`InMemoryStream`] - Unbounded append-only stream for tests
//!
//! ## Example
//!
//! ```rust
//! use ringitem_storage::{ByteSink, RingBuffer};
//!
//! let mut ring = RingBuffer::new(64);
//! let mut reservation = ring.reserve(4).unwrap();
//! reservation.as_mut_slice().copy_from_slice(&[1, 2, 3, 4]);
//! reservation.commit(4).unwrap();
//! assert_eq!(ring.len(), 4);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod ring;

pub use backend::{ByteSink, ByteSource, Reservation, RingCursor};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStream;
pub use ring::RingBuffer;
