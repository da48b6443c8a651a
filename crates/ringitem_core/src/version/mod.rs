//! Wire format adapters.
//!
//! Three generations of the ring item format share the envelope but disagree
//! on what follows it:
//!
//! | Version | Body header | Notes |
//! |---------|-------------|-------|
//! | v10 | never | body starts right after the envelope |
//! | v11 | optional | first body word is `0` or the header size |
//! | v12 | optional | as v11, plus an original source id stored in the body of most kinds |
//!
//! Each adapter is a stateless policy over [`RingItem`]: it picks the
//! [`Framing`] and supplies version-specific helpers. Choosing an adapter
//! for a given input is left to the caller, typically by matching on a
//! [`FormatVersion`].
//!
//! ## Ring format items
//!
//! v11 and later streams announce themselves with a `RING_FORMAT` item whose
//! body (after the zero body header word) is:
//!
//! ```text
//! | major u16 | minor u16 |
//! ```

mod v10;
mod v11;
mod v12;

pub use v10::V10;
pub use v11::V11;
pub use v12::V12;

use ringitem_storage::{ByteSink, ByteSource};

use crate::config::ReserveConfig;
use crate::error::{CoreError, CoreResult};
use crate::item::{read_u16, BodyHeader, Framing, RingItem};
use crate::types::{FormatVersion, ItemType};

/// Body size of a ring format item: major (2) + minor (2).
pub const FORMAT_BODY_SIZE: usize = 4;

/// A wire format generation.
///
/// All operations have default implementations driven by
/// [`FRAMING`](Self::FRAMING); adapters only override what differs.
pub trait WireFormat {
    /// The version this adapter handles.
    const VERSION: FormatVersion;

    /// Whether items carry a body header slot.
    const FRAMING: Framing;

    /// Minor version announced in ring format items.
    const MINOR: u16 = 0;

    /// Creates an empty item.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Allocation`] if storage cannot be reserved.
    fn new_item(item_type: ItemType, capacity_hint: usize) -> CoreResult<RingItem<'static>> {
        RingItem::new(item_type, capacity_hint, Self::FRAMING)
    }

    /// Creates an empty item that starts with `header`.
    ///
    /// # Errors
    ///
    /// Fails for formats without body headers.
    fn new_item_with_body_header(
        item_type: ItemType,
        capacity_hint: usize,
        header: &BodyHeader,
    ) -> CoreResult<RingItem<'static>> {
        let mut item = Self::new_item(item_type, capacity_hint.saturating_add(header.size()))?;
        item.replace_body_header(header)?;
        Ok(item)
    }

    /// Creates an item directly inside `sink` when it has room.
    ///
    /// See [`RingItem::new_zero_copy`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Allocation`] if the fallback storage cannot be
    /// reserved.
    fn new_zero_copy<'a>(
        item_type: ItemType,
        capacity_hint: usize,
        sink: &'a mut dyn ByteSink,
        config: &ReserveConfig,
    ) -> CoreResult<RingItem<'a>> {
        RingItem::new_zero_copy(item_type, capacity_hint, Self::FRAMING, sink, config)
    }

    /// Decodes an item of this version from the front of `bytes`.
    ///
    /// # Errors
    ///
    /// See [`RingItem::from_bytes`].
    fn decode(bytes: &[u8]) -> CoreResult<RingItem<'static>> {
        RingItem::from_bytes(bytes, Self::FRAMING)
    }

    /// Reads one item of this version from `source`.
    ///
    /// # Errors
    ///
    /// See [`RingItem::read_from`].
    fn read_from(source: &mut dyn ByteSource) -> CoreResult<RingItem<'static>> {
        RingItem::read_from(source, Self::FRAMING)
    }

    /// Builds the `RING_FORMAT` item announcing this version.
    ///
    /// # Errors
    ///
    /// Fails for versions that predate format items.
    fn format_item() -> CoreResult<RingItem<'static>> {
        if Self::FRAMING == Framing::Bare {
            return Err(CoreError::invalid_argument(format!(
                "{} streams have no ring format item",
                Self::VERSION
            )));
        }
        let mut item = Self::new_item(ItemType::RING_FORMAT, FORMAT_BODY_SIZE)?;
        let mut body = [0u8; FORMAT_BODY_SIZE];
        body[..2].copy_from_slice(&Self::VERSION.major().to_le_bytes());
        body[2..].copy_from_slice(&Self::MINOR.to_le_bytes());
        item.append(&body)?;
        item.update_size();
        Ok(item)
    }
}

/// Reads `(major, minor)` from a ring format item.
///
/// # Errors
///
/// - [`CoreError::InvalidItemType`] if `item` is not a `RING_FORMAT` item
/// - [`CoreError::InsufficientData`] if the body is too short
pub fn parse_format_item(item: &RingItem<'_>) -> CoreResult<(u16, u16)> {
    if item.item_type() != ItemType::RING_FORMAT {
        return Err(CoreError::invalid_item_type(
            "RING_FORMAT",
            item.item_type().as_u32(),
        ));
    }
    let body = item.body();
    if body.len() < FORMAT_BODY_SIZE {
        return Err(CoreError::insufficient_data(FORMAT_BODY_SIZE, body.len()));
    }
    let (major, minor) = (read_u16(body, 0), read_u16(body, 2));
    if item.is_foreign_order() {
        Ok((major.swap_bytes(), minor.swap_bytes()))
    } else {
        Ok((major, minor))
    }
}

impl FormatVersion {
    /// Framing used by items of this version.
    #[must_use]
    pub const fn framing(self) -> Framing {
        match self {
            Self::V10 => V10::FRAMING,
            Self::V11 => V11::FRAMING,
            Self::V12 => V12::FRAMING,
        }
    }

    /// Creates an empty item of this version.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Allocation`] if storage cannot be reserved.
    pub fn new_item(self, item_type: ItemType, capacity_hint: usize) -> CoreResult<RingItem<'static>> {
        RingItem::new(item_type, capacity_hint, self.framing())
    }

    /// Decodes an item of this version from the front of `bytes`.
    ///
    /// # Errors
    ///
    /// See [`RingItem::from_bytes`].
    pub fn decode(self, bytes: &[u8]) -> CoreResult<RingItem<'static>> {
        RingItem::from_bytes(bytes, self.framing())
    }

    /// Reads one item of this version from `source`.
    ///
    /// # Errors
    ///
    /// See [`RingItem::read_from`].
    pub fn read_from(self, source: &mut dyn ByteSource) -> CoreResult<RingItem<'static>> {
        RingItem::read_from(source, self.framing())
    }

    /// Builds the ring format item for this version.
    ///
    /// # Errors
    ///
    /// Fails for v10.
    pub fn format_item(self) -> CoreResult<RingItem<'static>> {
        match self {
            Self::V10 => V10::format_item(),
            Self::V11 => V11::format_item(),
            Self::V12 => V12::format_item(),
        }
    }

    /// Looks up the version announced by a ring format item.
    ///
    /// # Errors
    ///
    /// Fails if `item` is not a format item or names an unknown major version.
    pub fn from_format_item(item: &RingItem<'_>) -> CoreResult<Self> {
        let (major, minor) = parse_format_item(item)?;
        Self::from_major(major).ok_or_else(|| {
            CoreError::invalid_argument(format!("unknown ring format version {major}.{minor}"))
        })
    }
}
