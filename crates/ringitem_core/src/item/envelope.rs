//! Envelope layout constants and fixed-width field access.

/// Size of the envelope: total size (4) + type (4).
pub const ENVELOPE_SIZE: usize = 8;

/// Size of the body header slot when it holds only the zero sentinel.
pub const BODY_HEADER_SLOT_SIZE: usize = 4;

/// Size of a body header without extension words:
/// size (4) + timestamp (8) + source id (4) + barrier (4).
pub const MIN_BODY_HEADER_SIZE: usize = 20;

/// Room reserved beyond the caller's capacity hint when an item is created,
/// enough for the envelope and a minimal body header.
pub const ENVELOPE_OVERHEAD: usize = ENVELOPE_SIZE + MIN_BODY_HEADER_SIZE;

/// Mask of the significant bits of a type code.
const TYPE_MASK: u32 = 0xFFFF;

/// Byte order of an item relative to the order this crate writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian, as written by this crate.
    Native,
    /// Written by a producer of the opposite endianness.
    Swapped,
}

impl ByteOrder {
    /// Infers the producer's byte order from a raw envelope type word.
    ///
    /// Type codes use only the low 16 bits, so a word whose low half is zero
    /// and whose high half is not was written in the opposite order.
    #[must_use]
    pub const fn detect(type_word: u32) -> Self {
        if type_word & TYPE_MASK == 0 && type_word != 0 {
            Self::Swapped
        } else {
            Self::Native
        }
    }

    /// Converts a 32-bit word between this order and native order.
    #[must_use]
    pub const fn u32(self, word: u32) -> u32 {
        match self {
            Self::Native => word,
            Self::Swapped => word.swap_bytes(),
        }
    }

    /// Converts a 64-bit word between this order and native order.
    #[must_use]
    pub const fn u64(self, word: u64) -> u64 {
        match self {
            Self::Native => word,
            Self::Swapped => word.swap_bytes(),
        }
    }
}

/// Reads a little-endian `u32` at `offset`.
///
/// Callers guarantee `offset + 4 <= bytes.len()`.
#[inline]
pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Reads a little-endian `u16` at `offset`.
#[inline]
pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Reads a little-endian `u64` at `offset`.
#[inline]
pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
        bytes[offset + 4],
        bytes[offset + 5],
        bytes[offset + 6],
        bytes[offset + 7],
    ])
}

/// Writes a little-endian `u32` at `offset`.
#[inline]
pub(crate) fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Writes a little-endian `u64` at `offset`.
#[inline]
pub(crate) fn write_u64(bytes: &mut [u8], offset: usize, value: u64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_native_type_word() {
        assert_eq!(ByteOrder::detect(30), ByteOrder::Native);
        assert_eq!(ByteOrder::detect(0), ByteOrder::Native);
        assert_eq!(ByteOrder::detect(0xFFFF), ByteOrder::Native);
    }

    #[test]
    fn detect_swapped_type_word() {
        let swapped = 30u32.swap_bytes();
        assert_eq!(ByteOrder::detect(swapped), ByteOrder::Swapped);
        assert_eq!(ByteOrder::Swapped.u32(swapped), 30);
    }

    #[test]
    fn field_access_is_little_endian() {
        let mut buf = [0u8; 12];
        write_u32(&mut buf, 0, 0x0102_0304);
        write_u64(&mut buf, 4, 0x1122_3344_5566_7788);
        assert_eq!(&buf[..4], &[4, 3, 2, 1]);
        assert_eq!(read_u32(&buf, 0), 0x0102_0304);
        assert_eq!(read_u64(&buf, 4), 0x1122_3344_5566_7788);
    }
}
