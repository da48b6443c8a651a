//! Event-builder fragment header and built-event body construction.

use crate::error::{CoreError, CoreResult};
use crate::item::{read_u32, read_u64, write_u32, write_u64, RingItem};

/// Size of the total-byte-count prefix at the start of a built event body.
pub const BODY_PREFIX_SIZE: usize = 4;

/// Fixed header in front of every fragment in a built event.
///
/// The payload that follows is `payload_size` bytes, normally a complete
/// ring item from one source.
///
/// ```text
/// | timestamp u64 | source id u32 | payload size u32 | barrier u32 | payload |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FragmentHeader {
    /// Timestamp used to order fragments.
    pub timestamp: u64,
    /// Source that produced the fragment.
    pub source_id: u32,
    /// Bytes of payload following the header.
    pub payload_size: u32,
    /// Barrier code, zero for ordinary data.
    pub barrier: u32,
}

impl FragmentHeader {
    /// Encoded size of a fragment header.
    pub const SIZE: usize = 20;

    /// Creates a fragment header.
    #[must_use]
    pub const fn new(timestamp: u64, source_id: u32, payload_size: u32, barrier: u32) -> Self {
        Self {
            timestamp,
            source_id,
            payload_size,
            barrier,
        }
    }

    /// Bytes from the start of this header to the start of the next one.
    #[must_use]
    pub const fn stride(&self) -> usize {
        Self::SIZE + self.payload_size as usize
    }

    /// Writes the header at the start of `out`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InsufficientData`] if `out` is shorter than
    /// [`SIZE`](Self::SIZE).
    pub fn encode_into(&self, out: &mut [u8]) -> CoreResult<()> {
        if out.len() < Self::SIZE {
            return Err(CoreError::insufficient_data(Self::SIZE, out.len()));
        }
        write_u64(out, 0, self.timestamp);
        write_u32(out, 8, self.source_id);
        write_u32(out, 12, self.payload_size);
        write_u32(out, 16, self.barrier);
        Ok(())
    }

    /// Encodes the header into a fixed array.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        write_u64(&mut out, 0, self.timestamp);
        write_u32(&mut out, 8, self.source_id);
        write_u32(&mut out, 12, self.payload_size);
        write_u32(&mut out, 16, self.barrier);
        out
    }

    /// Decodes a header from the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InsufficientData`] if fewer than
    /// [`SIZE`](Self::SIZE) bytes are available.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() < Self::SIZE {
            return Err(CoreError::insufficient_data(Self::SIZE, bytes.len()));
        }
        Ok(Self {
            timestamp: read_u64(bytes, 0),
            source_id: read_u32(bytes, 8),
            payload_size: read_u32(bytes, 12),
            barrier: read_u32(bytes, 16),
        })
    }
}

/// Appends one fragment (header then payload) to `out`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidArgument`] if `header.payload_size` does not
/// match `payload.len()`, or [`CoreError::Allocation`] if `out` cannot grow.
pub fn write_fragment(out: &mut Vec<u8>, header: &FragmentHeader, payload: &[u8]) -> CoreResult<()> {
    if header.payload_size as usize != payload.len() {
        return Err(CoreError::invalid_argument(format!(
            "fragment header declares {} payload bytes but {} were given",
            header.payload_size,
            payload.len()
        )));
    }
    out.try_reserve(FragmentHeader::SIZE + payload.len())?;
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(payload);
    Ok(())
}

/// Accumulates fragments into the body of a built event.
///
/// The body starts with a 4-byte count of all body bytes (the count
/// included), followed by the fragments back to back.
///
/// # Example
///
/// ```rust
/// use ringitem_core::{BuiltEventWriter, FragmentHeader, FragmentIndex};
///
/// let mut writer = BuiltEventWriter::new();
/// writer.push(&FragmentHeader::new(10, 1, 3, 0), b"abc").unwrap();
/// let body = writer.finish().unwrap();
///
/// let mut index = FragmentIndex::new();
/// let fragments = index.index_body(&body).unwrap();
/// assert_eq!(fragments.len(), 1);
/// assert_eq!(fragments[0].payload_size, 3);
/// ```
#[derive(Debug, Clone)]
pub struct BuiltEventWriter {
    body: Vec<u8>,
    fragments: usize,
}

impl Default for BuiltEventWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltEventWriter {
    /// Creates a writer with an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            body: vec![0u8; BODY_PREFIX_SIZE],
            fragments: 0,
        }
    }

    /// Number of fragments pushed so far.
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Body bytes so far, prefix included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns `true` if no fragment has been pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments == 0
    }

    /// Appends a fragment.
    ///
    /// # Errors
    ///
    /// See [`write_fragment`].
    pub fn push(&mut self, header: &FragmentHeader, payload: &[u8]) -> CoreResult<()> {
        write_fragment(&mut self.body, header, payload)?;
        self.fragments += 1;
        Ok(())
    }

    /// Appends `item` as a fragment, taking the fragment header fields from
    /// the item's body header.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoBodyHeader`] if the item has no body header, or
    /// [`CoreError::FieldTooLarge`] if it is too big for a fragment.
    pub fn push_item(&mut self, item: &RingItem<'_>) -> CoreResult<()> {
        let payload = item.as_bytes();
        let payload_size = u32::try_from(payload.len())
            .map_err(|_| CoreError::field_too_large("fragment payload", payload.len(), u32::MAX as usize))?;
        let header = FragmentHeader::new(item.timestamp()?, item.source_id()?, payload_size, item.barrier()?);
        self.push(&header, payload)
    }

    /// Writes the byte count prefix and returns the body.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FieldTooLarge`] if the body exceeds the 32-bit
    /// prefix.
    pub fn finish(mut self) -> CoreResult<Vec<u8>> {
        let total = u32::try_from(self.body.len())
            .map_err(|_| CoreError::field_too_large("built event body", self.body.len(), u32::MAX as usize))?;
        write_u32(&mut self.body, 0, total);
        Ok(self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemType;
    use crate::version::{WireFormat, V11};

    #[test]
    fn header_layout() {
        let header = FragmentHeader::new(0x0102_0304_0506_0708, 3, 16, 2);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..8], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&bytes[8..12], &[3, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[16, 0, 0, 0]);
        assert_eq!(&bytes[16..20], &[2, 0, 0, 0]);
        assert_eq!(FragmentHeader::decode(&bytes).unwrap(), header);
        assert_eq!(header.stride(), 36);
    }

    #[test]
    fn decode_short_header_fails() {
        assert!(FragmentHeader::decode(&[0u8; 19]).unwrap_err().is_insufficient_data());
        assert!(FragmentHeader::default()
            .encode_into(&mut [0u8; 4])
            .unwrap_err()
            .is_insufficient_data());
    }

    #[test]
    fn write_fragment_checks_payload_size() {
        let mut out = Vec::new();
        let result = write_fragment(&mut out, &FragmentHeader::new(0, 0, 5, 0), b"abc");
        assert!(matches!(result, Err(CoreError::InvalidArgument { .. })));
        assert!(out.is_empty());
    }

    #[test]
    fn writer_prefix_counts_itself() {
        let writer = BuiltEventWriter::new();
        assert!(writer.is_empty());
        assert_eq!(writer.finish().unwrap(), vec![4, 0, 0, 0]);

        let mut writer = BuiltEventWriter::new();
        writer.push(&FragmentHeader::new(1, 1, 2, 0), b"xy").unwrap();
        let body = writer.finish().unwrap();
        assert_eq!(body.len(), 4 + 20 + 2);
        assert_eq!(read_u32(&body, 0), 26);
    }

    #[test]
    fn push_item_uses_body_header() {
        let mut item = V11::new_item(ItemType::PHYSICS_EVENT, 4).unwrap();
        item.append(b"evt!").unwrap();
        item.set_body_header(500, 6, 0).unwrap();

        let mut writer = BuiltEventWriter::new();
        writer.push_item(&item).unwrap();
        assert_eq!(writer.fragment_count(), 1);

        let body = writer.finish().unwrap();
        let header = FragmentHeader::decode(&body[BODY_PREFIX_SIZE..]).unwrap();
        assert_eq!(header.timestamp, 500);
        assert_eq!(header.source_id, 6);
        assert_eq!(header.payload_size as usize, item.size());
        assert_eq!(&body[BODY_PREFIX_SIZE + FragmentHeader::SIZE..], item.as_bytes());
    }

    #[test]
    fn push_item_without_body_header_fails() {
        let item = V11::new_item(ItemType::PHYSICS_EVENT, 0).unwrap();
        let mut writer = BuiltEventWriter::new();
        assert!(matches!(
            writer.push_item(&item),
            Err(CoreError::NoBodyHeader { .. })
        ));
        assert!(writer.is_empty());
    }
}
