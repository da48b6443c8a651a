//! # Ring Item Core
//!
//! Binary ring item codec for data acquisition pipelines.
//!
//! This crate provides:
//! - [`RingItem`], the generic item engine: envelope, cursor-built body,
//!   optional body header with slide insertion, zero-copy construction
//! - Wire format adapters for v10, v11 and v12 ([`V10`], [`V11`], [`V12`])
//! - [`FragmentIndex`], a zero-copy parser for built event bodies
//! - [`FragmentPool`], a block pool for the event builder's hot path
//!
//! Sinks and sources come from `ringitem_storage`; this crate never owns a
//! transport.
//!
//! ## Example
//!
//! ```rust
//! use ringitem_core::{ItemType, WireFormat, V11};
//!
//! let mut item = V11::new_item(ItemType::PHYSICS_EVENT, 10).unwrap();
//! item.append(&[0u8; 10]).unwrap();
//! item.update_size();
//! assert_eq!(item.size(), 22);
//!
//! item.set_body_header(0x12_3456_7890, 2, 1).unwrap();
//! assert_eq!(item.size(), 38);
//! assert_eq!(item.body(), &[0u8; 10]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod fragment;
mod item;
mod types;
mod version;

pub use config::{PoolConfig, ReserveConfig};
pub use error::{CoreError, CoreResult};
pub use fragment::{
    index_fragments, size_class, write_fragment, BuiltEventWriter, Fragment, FragmentDescriptor,
    FragmentHeader, FragmentIndex, FragmentPool, FreeLists, LockMode, Locked, PoolStats, Unlocked,
    BODY_PREFIX_SIZE,
};
pub use item::{
    BodyHeader, BodyShape, ByteOrder, Framing, RingItem, BODY_HEADER_SLOT_SIZE, ENVELOPE_OVERHEAD,
    ENVELOPE_SIZE, INLINE_CAPACITY, MAX_ITEM_SIZE, MIN_BODY_HEADER_SIZE,
};
pub use types::{FormatVersion, ItemType, NULL_TIMESTAMP};
pub use version::{parse_format_item, WireFormat, FORMAT_BODY_SIZE, V10, V11, V12};
