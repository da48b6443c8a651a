//! Error types for ring item operations.

use std::collections::TryReserveError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while building, decoding, or indexing ring items.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Sink or source error.
    #[error("storage error: {0}")]
    Storage(#[from] ringitem_storage::StorageError),

    /// Memory for an item or pooled block could not be reserved.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// A body header field was requested from an item that has none.
    #[error("item of type {item_type} has no body header")]
    NoBodyHeader {
        /// Type code of the item.
        item_type: u32,
    },

    /// An accessor was used on an item of the wrong kind.
    #[error("invalid item type: expected {expected}, got {actual}")]
    InvalidItemType {
        /// What the accessor accepts.
        expected: String,
        /// Type code of the item.
        actual: u32,
    },

    /// A field or write does not fit in the space available for it.
    #[error("{field} too large: {size} bytes exceeds maximum of {max} bytes")]
    FieldTooLarge {
        /// Name of the field or region.
        field: &'static str,
        /// Size the caller asked for.
        size: usize,
        /// Largest size permitted.
        max: usize,
    },

    /// The input ended before a complete structure could be read.
    #[error("insufficient data: needed {needed} bytes, {available} available")]
    InsufficientData {
        /// Bytes required to complete the structure.
        needed: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// The bytes do not describe a valid item.
    #[error("invalid item format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// The caller supplied an unusable argument.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a no-body-header error.
    pub fn no_body_header(item_type: u32) -> Self {
        Self::NoBodyHeader { item_type }
    }

    /// Creates an invalid item type error.
    pub fn invalid_item_type(expected: impl Into<String>, actual: u32) -> Self {
        Self::InvalidItemType {
            expected: expected.into(),
            actual,
        }
    }

    /// Creates a field too large error.
    pub fn field_too_large(field: &'static str, size: usize, max: usize) -> Self {
        Self::FieldTooLarge { field, size, max }
    }

    /// Creates an insufficient data error.
    pub fn insufficient_data(needed: usize, available: usize) -> Self {
        Self::InsufficientData { needed, available }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns `true` if the error means the input was cut short.
    ///
    /// Callers reading from a live stream typically treat this as "wait for
    /// more data" rather than corruption.
    #[must_use]
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}
