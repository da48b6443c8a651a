//! In-memory circular byte buffer.

use crate::backend::{ByteSink, ByteSource, Reservation, RingCursor};
use crate::error::{StorageError, StorageResult};

/// A fixed-capacity circular byte buffer.
///
/// This is the in-process stand-in for the shared-memory ring that data
/// producers write into. Bytes are published either by copying (`put`) or by
/// building an item in place inside a [`Reservation`] and committing it.
///
/// `put` and `get` wrap around the end of the storage; reservations never do,
/// so a reservation can only be granted for space that is contiguous before
/// the wrap point.
///
/// # Example
///
/// ```rust
/// use ringitem_storage::{ByteSink, ByteSource, RingBuffer};
///
/// let mut ring = RingBuffer::new(32);
/// ring.put(b"hello").unwrap();
/// let mut out = [0u8; 5];
/// ring.get(&mut out).unwrap();
/// assert_eq!(&out, b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: Vec<u8>,
    cursor: RingCursor,
}

impl RingBuffer {
    /// Creates an empty ring of `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            cursor: RingCursor::new(capacity),
        }
    }

    /// Total size of the ring.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cursor.capacity()
    }

    /// Bytes currently readable.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cursor.used()
    }

    /// Returns `true` if nothing is readable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursor.used() == 0
    }

    /// Bytes that can still be written, counting wrapped space.
    #[must_use]
    pub fn free(&self) -> usize {
        self.cursor.free()
    }

    /// Returns the read/write positions.
    #[must_use]
    pub fn cursor(&self) -> RingCursor {
        self.cursor
    }

    /// Discards `len` readable bytes without copying them out.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`] if fewer than `len` bytes are readable.
    pub fn skip(&mut self, len: usize) -> StorageResult<()> {
        if len > self.cursor.used() {
            return Err(StorageError::ReadPastEnd {
                requested: len,
                available: self.cursor.used(),
            });
        }
        self.cursor.advance_read(len);
        Ok(())
    }
}

impl ByteSink for RingBuffer {
    fn put(&mut self, bytes: &[u8]) -> StorageResult<()> {
        if bytes.len() > self.cursor.free() {
            return Err(StorageError::Full {
                needed: bytes.len(),
                available: self.cursor.free(),
            });
        }
        if bytes.is_empty() {
            return Ok(());
        }

        let start = self.cursor.write_offset();
        let first = bytes.len().min(self.data.len() - start);
        self.data[start..start + first].copy_from_slice(&bytes[..first]);
        let rest = bytes.len() - first;
        if rest > 0 {
            self.data[..rest].copy_from_slice(&bytes[first..]);
        }
        self.cursor.advance_write(bytes.len());
        Ok(())
    }

    fn contiguous_space(&self) -> usize {
        self.cursor.contiguous_free()
    }

    fn reserve(&mut self, len: usize) -> Option<Reservation<'_>> {
        if len > self.cursor.contiguous_free() {
            return None;
        }
        let start = self.cursor.write_offset();
        let region = &mut self.data[start..start + len];
        Some(Reservation::new(region, &mut self.cursor))
    }
}

impl ByteSource for RingBuffer {
    fn get(&mut self, buf: &mut [u8]) -> StorageResult<()> {
        let available = self.cursor.used();
        if buf.is_empty() {
            return Ok(());
        }
        if available == 0 {
            return Err(StorageError::EndOfStream);
        }
        if buf.len() > available {
            return Err(StorageError::ReadPastEnd {
                requested: buf.len(),
                available,
            });
        }

        let start = self.cursor.read_offset();
        let first = buf.len().min(self.data.len() - start);
        buf[..first].copy_from_slice(&self.data[start..start + first]);
        let rest = buf.len() - first;
        if rest > 0 {
            buf[first..].copy_from_slice(&self.data[..rest]);
        }
        self.cursor.advance_read(buf.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_new_is_empty() {
        let ring = RingBuffer::new(64);
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 64);
        assert_eq!(ring.free(), 64);
        assert_eq!(ring.contiguous_space(), 64);
    }

    #[test]
    fn ring_put_get_roundtrip() {
        let mut ring = RingBuffer::new(16);
        ring.put(b"abcdef").unwrap();
        assert_eq!(ring.len(), 6);

        let mut out = [0u8; 6];
        ring.get(&mut out).unwrap();
        assert_eq!(&out, b"abcdef");
        assert!(ring.is_empty());
    }

    #[test]
    fn ring_put_wraps_around() {
        let mut ring = RingBuffer::new(8);
        ring.put(b"123456").unwrap();
        ring.skip(6).unwrap();

        ring.put(b"abcdef").unwrap();
        let mut out = [0u8; 6];
        ring.get(&mut out).unwrap();
        assert_eq!(&out, b"abcdef");
    }

    #[test]
    fn ring_put_when_full_fails() {
        let mut ring = RingBuffer::new(4);
        ring.put(b"abc").unwrap();
        let result = ring.put(b"de");
        assert!(matches!(
            result,
            Err(StorageError::Full {
                needed: 2,
                available: 1
            })
        ));
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn ring_get_empty_is_end_of_stream() {
        let mut ring = RingBuffer::new(4);
        let mut out = [0u8; 1];
        assert!(matches!(ring.get(&mut out), Err(StorageError::EndOfStream)));
    }

    #[test]
    fn ring_get_past_end_fails() {
        let mut ring = RingBuffer::new(8);
        ring.put(b"ab").unwrap();
        let mut out = [0u8; 4];
        assert!(matches!(
            ring.get(&mut out),
            Err(StorageError::ReadPastEnd { .. })
        ));
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn ring_reserve_commit_publishes_bytes() {
        let mut ring = RingBuffer::new(16);
        let mut reservation = ring.reserve(8).unwrap();
        reservation.as_mut_slice()[..4].copy_from_slice(b"wxyz");
        reservation.commit(4).unwrap();

        assert_eq!(ring.len(), 4);
        let mut out = [0u8; 4];
        ring.get(&mut out).unwrap();
        assert_eq!(&out, b"wxyz");
    }

    #[test]
    fn ring_reserve_refuses_wrapping_region() {
        let mut ring = RingBuffer::new(16);
        ring.put(&[0u8; 12]).unwrap();
        ring.skip(12).unwrap();

        assert_eq!(ring.free(), 16);
        assert_eq!(ring.contiguous_space(), 4);
        assert!(ring.reserve(8).is_none());
        assert!(ring.reserve(4).is_some());
    }

    #[test]
    fn ring_dropped_reservation_publishes_nothing() {
        let mut ring = RingBuffer::new(16);
        {
            let mut reservation = ring.reserve(8).unwrap();
            reservation.as_mut_slice().fill(0xAA);
        }
        assert!(ring.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn interleaved_put_get_preserves_order(
                chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..24), 1..40)
            ) {
                let mut ring = RingBuffer::new(32);
                for chunk in &chunks {
                    ring.put(chunk).unwrap();
                    let mut out = vec![0u8; chunk.len()];
                    ring.get(&mut out).unwrap();
                    prop_assert_eq!(&out, chunk);
                    prop_assert!(ring.is_empty());
                }
            }
        }
    }
}
