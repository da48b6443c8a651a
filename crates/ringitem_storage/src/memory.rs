//! In-memory append-only stream for testing.

use crate::backend::{ByteSink, ByteSource};
use crate::error::{StorageError, StorageResult};

/// An unbounded in-memory byte stream.
///
/// Writes append to the end, reads consume from the front. Suitable for:
/// - Unit tests
/// - Capturing items produced by a writer for later inspection
/// - Replaying a recorded byte stream into a consumer
///
/// # Example
///
/// ```rust
/// use ringitem_storage::{ByteSink, ByteSource, InMemoryStream};
///
/// let mut stream = InMemoryStream::new();
/// stream.put(b"test data").unwrap();
/// assert_eq!(stream.remaining(), 9);
///
/// let mut word = [0u8; 4];
/// stream.get(&mut word).unwrap();
/// assert_eq!(&word, b"test");
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryStream {
    data: Vec<u8>,
    read_pos: usize,
}

impl InMemoryStream {
    /// Creates a new empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stream with pre-existing data to be read.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self { data, read_pos: 0 }
    }

    /// Returns all bytes ever written, including those already read.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.read_pos
    }

    /// Clears all data and rewinds the read position.
    pub fn clear(&mut self) {
        self.data.clear();
        self.read_pos = 0;
    }
}

impl ByteSink for InMemoryStream {
    fn put(&mut self, bytes: &[u8]) -> StorageResult<()> {
        self.data.extend_from_slice(bytes);
        Ok(())
    }
}

impl ByteSource for InMemoryStream {
    fn get(&mut self, buf: &mut [u8]) -> StorageResult<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let available = self.remaining();
        if available == 0 {
            return Err(StorageError::EndOfStream);
        }
        if buf.len() > available {
            return Err(StorageError::ReadPastEnd {
                requested: buf.len(),
                available,
            });
        }
        let end = self.read_pos + buf.len();
        buf.copy_from_slice(&self.data[self.read_pos..end]);
        self.read_pos = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_new_is_empty() {
        let stream = InMemoryStream::new();
        assert_eq!(stream.remaining(), 0);
        assert!(stream.data().is_empty());
    }

    #[test]
    fn stream_put_appends() {
        let mut stream = InMemoryStream::new();
        stream.put(b"hello").unwrap();
        stream.put(b" world").unwrap();
        assert_eq!(stream.data(), b"hello world");
        assert_eq!(stream.remaining(), 11);
    }

    #[test]
    fn stream_get_consumes_in_order() {
        let mut stream = InMemoryStream::with_data(b"hello world".to_vec());

        let mut first = [0u8; 5];
        stream.get(&mut first).unwrap();
        assert_eq!(&first, b"hello");

        let mut second = [0u8; 6];
        stream.get(&mut second).unwrap();
        assert_eq!(&second, b" world");
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn stream_get_at_end_is_end_of_stream() {
        let mut stream = InMemoryStream::with_data(b"ab".to_vec());
        let mut buf = [0u8; 2];
        stream.get(&mut buf).unwrap();
        assert!(matches!(stream.get(&mut buf), Err(StorageError::EndOfStream)));
    }

    #[test]
    fn stream_get_partial_fails_without_consuming() {
        let mut stream = InMemoryStream::with_data(b"abc".to_vec());
        let mut buf = [0u8; 8];
        let result = stream.get(&mut buf);
        assert!(matches!(
            result,
            Err(StorageError::ReadPastEnd {
                requested: 8,
                available: 3
            })
        ));
        assert_eq!(stream.remaining(), 3);
    }

    #[test]
    fn stream_empty_get_succeeds() {
        let mut stream = InMemoryStream::new();
        let mut buf = [0u8; 0];
        assert!(stream.get(&mut buf).is_ok());
    }

    #[test]
    fn stream_does_not_reserve() {
        let mut stream = InMemoryStream::new();
        assert_eq!(stream.contiguous_space(), 0);
        assert!(stream.reserve(4).is_none());
    }

    #[test]
    fn stream_clear() {
        let mut stream = InMemoryStream::with_data(b"some data".to_vec());
        stream.clear();
        assert_eq!(stream.remaining(), 0);
    }
}
