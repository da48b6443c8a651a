//! Byte sink and byte source traits.

use crate::error::{StorageError, StorageResult};

/// A destination for encoded ring items.
///
/// Sinks are **opaque byte stores**. `put` copies bytes in; sinks backed by
/// contiguous shared memory may additionally hand out a [`Reservation`] so a
/// producer can build an item directly in place and publish it with
/// [`Reservation::commit`].
///
/// # Invariants
///
/// - `put` either stores all of `data` or fails without storing any of it
/// - a reservation never aliases bytes that are readable by a consumer
/// - at most one reservation is live at a time (enforced by `&mut self`)
pub trait ByteSink {
    /// Copies `data` into the sink.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Full`] if the sink cannot hold `data`.
    fn put(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Returns the number of bytes that can be written contiguously at the
    /// write cursor without wrapping.
    ///
    /// Sinks that cannot hand out in-place regions report zero.
    ///
    /// Producers may poll this while waiting for room. The value can only grow
    /// between polls when another party frees space through interior or
    /// shared-memory mutability; a sink owned by the polling thread never
    /// changes while it is borrowed.
    fn contiguous_space(&self) -> usize {
        0
    }

    /// Reserves `len` contiguous bytes at the write cursor.
    ///
    /// Returns `None` if fewer than `len` contiguous bytes are free or the
    /// sink does not support in-place construction.
    fn reserve(&mut self, len: usize) -> Option<Reservation<'_>> {
        let _ = len;
        None
    }
}

/// A source of encoded ring items.
pub trait ByteSource {
    /// Fills `buf` completely from the source.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EndOfStream`] if the source is exhausted before
    /// the first byte, or [`StorageError::ReadPastEnd`] if it ends part way.
    fn get(&mut self, buf: &mut [u8]) -> StorageResult<()>;
}

/// Read/write positions of a circular byte region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCursor {
    capacity: usize,
    write: usize,
    read: usize,
    used: usize,
}

impl RingCursor {
    /// Creates a cursor pair for an empty region of `capacity` bytes.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            write: 0,
            read: 0,
            used: 0,
        }
    }

    /// Total size of the region.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Offset of the next byte to be written.
    #[must_use]
    pub const fn write_offset(&self) -> usize {
        self.write
    }

    /// Offset of the next byte to be read.
    #[must_use]
    pub const fn read_offset(&self) -> usize {
        self.read
    }

    /// Bytes written but not yet read.
    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    /// Bytes that may still be written, ignoring wrap.
    #[must_use]
    pub const fn free(&self) -> usize {
        self.capacity - self.used
    }

    /// Free bytes between the write cursor and either the reader or the end
    /// of the region, whichever comes first.
    #[must_use]
    pub fn contiguous_free(&self) -> usize {
        let to_end = self.capacity - self.write;
        to_end.min(self.free())
    }

    /// Publishes `len` bytes at the write cursor.
    pub fn advance_write(&mut self, len: usize) {
        debug_assert!(len <= self.free());
        if self.capacity == 0 {
            return;
        }
        self.write = (self.write + len) % self.capacity;
        self.used += len;
    }

    /// Consumes `len` bytes at the read cursor.
    pub fn advance_read(&mut self, len: usize) {
        debug_assert!(len <= self.used);
        if self.capacity == 0 {
            return;
        }
        self.read = (self.read + len) % self.capacity;
        self.used -= len;
    }
}

/// A borrowed, writable region inside a sink.
///
/// The region stays invisible to consumers until [`commit`](Self::commit)
/// advances the sink's write cursor. Dropping a reservation without
/// committing abandons whatever was written into it.
#[derive(Debug)]
pub struct Reservation<'a> {
    region: &'a mut [u8],
    cursor: &'a mut RingCursor,
}

impl<'a> Reservation<'a> {
    /// Creates a reservation over `region`, published through `cursor`.
    pub fn new(region: &'a mut [u8], cursor: &'a mut RingCursor) -> Self {
        Self { region, cursor }
    }

    /// Size of the reserved region.
    #[must_use]
    pub fn len(&self) -> usize {
        self.region.len()
    }

    /// Returns `true` if the region is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// The reserved bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &*self.region
    }

    /// The reserved bytes, writable.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut *self.region
    }

    /// Publishes the first `len` bytes of the region.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OverCommit`] if `len` exceeds the reservation.
    pub fn commit(self, len: usize) -> StorageResult<()> {
        if len > self.region.len() {
            return Err(StorageError::OverCommit {
                committed: len,
                reserved: self.region.len(),
            });
        }
        self.cursor.advance_write(len);
        Ok(())
    }
}
