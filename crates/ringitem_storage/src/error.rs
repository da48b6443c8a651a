//! Error types for sink and source operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while moving bytes into a sink or out of a source.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A `get` asked for more bytes than the source holds.
    #[error("read beyond end of data: requested {requested} bytes, {available} available")]
    ReadPastEnd {
        /// The requested read length.
        requested: usize,
        /// The bytes currently readable.
        available: usize,
    },

    /// A `put` did not fit in the free space of the sink.
    #[error("sink full: needed {needed} bytes, {available} free")]
    Full {
        /// The bytes the caller tried to write.
        needed: usize,
        /// The free space at the time of the call.
        available: usize,
    },

    /// A reservation was committed with more bytes than it reserved.
    #[error("commit of {committed} bytes exceeds reservation of {reserved} bytes")]
    OverCommit {
        /// Bytes the caller tried to commit.
        committed: usize,
        /// Bytes held by the reservation.
        reserved: usize,
    },

    /// The source reached a clean end of stream before any byte was read.
    #[error("end of stream")]
    EndOfStream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_sizes() {
        let full = StorageError::Full {
            needed: 40,
            available: 8,
        };
        assert_eq!(full.to_string(), "sink full: needed 40 bytes, 8 free");

        let over = StorageError::OverCommit {
            committed: 9,
            reserved: 4,
        };
        assert_eq!(
            over.to_string(),
            "commit of 9 bytes exceeds reservation of 4 bytes"
        );
        assert_eq!(StorageError::EndOfStream.to_string(), "end of stream");
    }
}
