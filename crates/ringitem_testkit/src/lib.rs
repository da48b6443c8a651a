//! # Ring Item Testkit
//!
//! Test utilities for the ring item crates.
//!
//! This crate provides:
//! - Fixtures that build items and built event bodies in one call
//! - Property-based test generators using proptest
//! - Hex helpers for byte-exact assertions
//! - Fuzz harnesses for decoding and fragment indexing
//! - Stress helpers for the fragment pool and ring buffer
//! - Serializable test vectors for other implementations of the format
//!
//! ## Usage
//!
//! ```rust
//! use ringitem_testkit::prelude::*;
//! use ringitem_core::FormatVersion;
//!
//! let item = physics_event(FormatVersion::V11, b"payload", Some(body_header(7, 1)));
//! assert_eq!(item.body(), b"payload");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod golden;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::golden::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use golden::*;
pub use stress::*;
pub use vectors::*;
