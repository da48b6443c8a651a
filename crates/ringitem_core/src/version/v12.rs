//! Version 12: v11 framing plus a body-stored original source id.

use crate::error::{CoreError, CoreResult};
use crate::item::{read_u32, write_u32, Framing, RingItem};
use crate::types::{FormatVersion, ItemType};
use crate::version::WireFormat;

/// The v12 wire format.
///
/// Framing is identical to v11. The event builder may rewrite the body
/// header source id, so most item kinds also record the producer's id inside
/// the body. [`original_source_id`](Self::original_source_id) reads that
/// field and never consults the body header.
///
/// | Kind | Body offset |
/// |------|-------------|
/// | state change (begin/end/pause/resume/abnormal end) | 16 |
/// | periodic scalers | 24 |
/// | text (packet types, monitored variables) | 16 |
/// | physics event count | 20 |
#[derive(Debug, Clone, Copy, Default)]
pub struct V12;

impl WireFormat for V12 {
    const VERSION: FormatVersion = FormatVersion::V12;
    const FRAMING: Framing = Framing::Slotted;
}

impl V12 {
    /// Body offset of the original source id for `item_type`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidItemType`] for kinds that do not store one.
    pub fn original_source_id_offset(item_type: ItemType) -> CoreResult<usize> {
        match item_type {
            t if t.is_state_change() => Ok(16),
            ItemType::PERIODIC_SCALERS => Ok(24),
            ItemType::PACKET_TYPES | ItemType::MONITORED_VARIABLES => Ok(16),
            ItemType::PHYSICS_EVENT_COUNT => Ok(20),
            other => Err(CoreError::invalid_item_type(
                "state change, scaler, text or event count item",
                other.as_u32(),
            )),
        }
    }

    /// Reads the id of the source that produced `item`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidItemType`] for kinds without the field
    /// - [`CoreError::InsufficientData`] if the body is too short to hold it
    pub fn original_source_id(item: &RingItem<'_>) -> CoreResult<u32> {
        let offset = Self::field_offset(item)?;
        let value = read_u32(item.body(), offset);
        if item.is_foreign_order() {
            Ok(value.swap_bytes())
        } else {
            Ok(value)
        }
    }

    /// Stores the id of the source that produced `item`.
    ///
    /// The body must already extend past the field.
    ///
    /// # Errors
    ///
    /// See [`original_source_id`](Self::original_source_id).
    pub fn set_original_source_id(item: &mut RingItem<'_>, source_id: u32) -> CoreResult<()> {
        let offset = Self::field_offset(item)?;
        let value = if item.is_foreign_order() {
            source_id.swap_bytes()
        } else {
            source_id
        };
        write_u32(item.body_mut(), offset, value);
        Ok(())
    }

    fn field_offset(item: &RingItem<'_>) -> CoreResult<usize> {
        let offset = Self::original_source_id_offset(item.item_type())?;
        let needed = offset + 4;
        if item.body_size() < needed {
            return Err(CoreError::insufficient_data(needed, item.body_size()));
        }
        Ok(offset)
    }
}
