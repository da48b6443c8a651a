//! Body header (event-builder provenance) encoding.

use crate::error::{CoreError, CoreResult};
use crate::item::envelope::{
    read_u32, read_u64, write_u32, write_u64, ByteOrder, BODY_HEADER_SLOT_SIZE,
    MIN_BODY_HEADER_SIZE,
};
use crate::types::NULL_TIMESTAMP;

/// Optional header between the envelope and the body.
///
/// The size word is extensible: producers may append vendor words after the
/// barrier. Those words are kept verbatim in [`extension`](Self::extension)
/// and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BodyHeader {
    /// Event timestamp, or [`NULL_TIMESTAMP`].
    pub timestamp: u64,
    /// Source that produced the item. May be rewritten by the event builder.
    pub source_id: u32,
    /// Barrier code; zero when the item is not a barrier.
    pub barrier: u32,
    extension: Vec<u8>,
}

impl BodyHeader {
    /// Size of a header without extension words.
    pub const MIN_SIZE: usize = MIN_BODY_HEADER_SIZE;

    /// Creates a header without extension words.
    #[must_use]
    pub fn new(timestamp: u64, source_id: u32, barrier: u32) -> Self {
        Self {
            timestamp,
            source_id,
            barrier,
            extension: Vec::new(),
        }
    }

    /// Creates a header with no timestamp, for producers that have none.
    #[must_use]
    pub fn untimed(source_id: u32) -> Self {
        Self::new(NULL_TIMESTAMP, source_id, 0)
    }

    /// Attaches trailing vendor words.
    #[must_use]
    pub fn with_extension(mut self, extension: Vec<u8>) -> Self {
        self.extension = extension;
        self
    }

    /// Trailing words after the barrier.
    #[must_use]
    pub fn extension(&self) -> &[u8] {
        &self.extension
    }

    /// Encoded size, including extension words.
    #[must_use]
    pub fn size(&self) -> usize {
        Self::MIN_SIZE + self.extension.len()
    }

    /// Returns `true` if the timestamp is set.
    #[must_use]
    pub fn has_timestamp(&self) -> bool {
        self.timestamp != NULL_TIMESTAMP
    }

    /// Writes the header at the start of `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if `out` is shorter than [`size`](Self::size) or the
    /// size does not fit the 32-bit size word.
    pub fn encode_into(&self, out: &mut [u8]) -> CoreResult<()> {
        self.encode_ordered(out, ByteOrder::Native)
    }

    /// Writes the header in `order`; extension words are copied verbatim.
    pub(crate) fn encode_ordered(&self, out: &mut [u8], order: ByteOrder) -> CoreResult<()> {
        let size = self.size();
        if out.len() < size {
            return Err(CoreError::insufficient_data(size, out.len()));
        }
        write_u32(out, 0, order.u32(size_word(size)?));
        write_u64(out, 4, order.u64(self.timestamp));
        write_u32(out, 12, order.u32(self.source_id));
        write_u32(out, 16, order.u32(self.barrier));
        out[Self::MIN_SIZE..size].copy_from_slice(&self.extension);
        Ok(())
    }

    /// Encodes the header into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FieldTooLarge`] if the extension words push the
    /// size past the 32-bit size word.
    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        let mut out = vec![0u8; self.size()];
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Decodes a header whose size word starts at `bytes[0]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the size word is below the minimum or claims more
    /// bytes than `bytes` holds.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        Self::decode_ordered(bytes, ByteOrder::Native)
    }

    /// Decodes a header written in `order`.
    pub(crate) fn decode_ordered(bytes: &[u8], order: ByteOrder) -> CoreResult<Self> {
        if bytes.len() < BODY_HEADER_SLOT_SIZE {
            return Err(CoreError::insufficient_data(
                BODY_HEADER_SLOT_SIZE,
                bytes.len(),
            ));
        }
        let size = order.u32(read_u32(bytes, 0)) as usize;
        if size < Self::MIN_SIZE {
            return Err(CoreError::invalid_format(format!(
                "body header size {size} is below the minimum of {}",
                Self::MIN_SIZE
            )));
        }
        if size > bytes.len() {
            return Err(CoreError::insufficient_data(size, bytes.len()));
        }

        Ok(Self {
            timestamp: order.u64(read_u64(bytes, 4)),
            source_id: order.u32(read_u32(bytes, 12)),
            barrier: order.u32(read_u32(bytes, 16)),
            extension: bytes[Self::MIN_SIZE..size].to_vec(),
        })
    }
}

/// The 32-bit size word for a header of `size` bytes.
fn size_word(size: usize) -> CoreResult<u32> {
    u32::try_from(size)
        .map_err(|_| CoreError::field_too_large("body header", size, u32::MAX as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_layout() {
        let header = BodyHeader::new(0x1234_5678_90, 2, 1);
        let bytes = header.to_bytes().unwrap();

        assert_eq!(bytes.len(), 20);
        assert_eq!(read_u32(&bytes, 0), 20);
        assert_eq!(read_u64(&bytes, 4), 0x1234_5678_90);
        assert_eq!(read_u32(&bytes, 12), 2);
        assert_eq!(read_u32(&bytes, 16), 1);
    }

    #[test]
    fn extension_words_survive_decode() {
        let header = BodyHeader::new(7, 3, 0).with_extension(vec![0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(header.size(), 24);

        let bytes = header.to_bytes().unwrap();
        assert_eq!(read_u32(&bytes, 0), 24);
        let decoded = BodyHeader::decode(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.extension(), &[0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn decode_rejects_undersized_header() {
        let mut bytes = BodyHeader::new(1, 1, 1).to_bytes().unwrap();
        write_u32(&mut bytes, 0, 12);
        assert!(matches!(
            BodyHeader::decode(&bytes),
            Err(CoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn decode_rejects_truncated_header() {
        let bytes = BodyHeader::new(1, 1, 1).to_bytes().unwrap();
        assert!(BodyHeader::decode(&bytes[..16]).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn encode_into_short_buffer_fails() {
        let mut out = [0u8; 10];
        let result = BodyHeader::new(1, 2, 3).encode_into(&mut out);
        assert!(result.unwrap_err().is_insufficient_data());
    }

    #[test]
    fn untimed_header() {
        let header = BodyHeader::untimed(9);
        assert!(!header.has_timestamp());
        assert_eq!(header.source_id, 9);
        assert_eq!(header.barrier, 0);
    }

    #[test]
    fn size_word_rejects_oversized_header() {
        assert_eq!(size_word(24).unwrap(), 24);
        assert!(matches!(
            size_word(u32::MAX as usize + 1),
            Err(CoreError::FieldTooLarge { .. })
        ));
    }

    #[test]
    fn swapped_order_roundtrip() {
        let header = BodyHeader::new(0x0102_0304_0506_0708, 44, 2).with_extension(vec![1, 2, 3, 4]);
        let mut out = vec![0u8; header.size()];
        header.encode_ordered(&mut out, ByteOrder::Swapped).unwrap();

        assert_eq!(&out[..4], &24u32.to_be_bytes());
        assert_eq!(&out[12..16], &44u32.to_be_bytes());
        assert_eq!(&out[20..], &[1, 2, 3, 4]);
        assert_eq!(BodyHeader::decode_ordered(&out, ByteOrder::Swapped).unwrap(), header);
    }
}
