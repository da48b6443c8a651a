//! Version 11: optional body headers.

use crate::item::Framing;
use crate::types::FormatVersion;
use crate::version::WireFormat;

/// The v11 wire format.
///
/// The first body word is `0` when the item has no body header; otherwise it
/// is the header size and the header follows. Body headers can be added after
/// the body is written: the body slides forward to make room.
#[derive(Debug, Clone, Copy, Default)]
pub struct V11;

impl WireFormat for V11 {
    const VERSION: FormatVersion = FormatVersion::V11;
    const FRAMING: Framing = Framing::Slotted;
}
