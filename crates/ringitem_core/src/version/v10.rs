//! Version 10: no body headers.

use crate::item::Framing;
use crate::types::FormatVersion;
use crate::version::WireFormat;

/// The v10 wire format.
///
/// The body starts immediately after the envelope. Body header accessors on
/// v10 items always fail with [`CoreError::NoBodyHeader`](crate::CoreError::NoBodyHeader)
/// and setting one fails with `InvalidArgument`.
#[derive(Debug, Clone, Copy, Default)]
pub struct V10;

impl WireFormat for V10 {
    const VERSION: FormatVersion = FormatVersion::V10;
    const FRAMING: Framing = Framing::Bare;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::item::BodyHeader;
    use crate::types::ItemType;

    #[test]
    fn body_follows_envelope() {
        let mut item = V10::new_item(ItemType::PHYSICS_EVENT, 16).unwrap();
        item.append(&[1, 2, 3, 4]).unwrap();
        item.update_size();

        assert_eq!(item.size(), 12);
        assert_eq!(item.body_offset(), 8);
        assert_eq!(item.as_bytes(), &[12, 0, 0, 0, 30, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn body_header_accessors_fail() {
        let mut item = V10::new_item(ItemType::PHYSICS_EVENT, 0).unwrap();
        assert!(!item.has_body_header());
        assert!(matches!(
            item.timestamp(),
            Err(CoreError::NoBodyHeader { .. })
        ));
        assert!(matches!(
            item.set_body_header(1, 2, 3),
            Err(CoreError::InvalidArgument { .. })
        ));
        assert!(V10::new_item_with_body_header(ItemType::PHYSICS_EVENT, 0, &BodyHeader::new(1, 2, 3))
            .is_err());
    }

    #[test]
    fn zero_first_word_is_body() {
        let mut item = V10::new_item(ItemType::PHYSICS_EVENT, 8).unwrap();
        item.append(&[0, 0, 0, 0, 9, 9]).unwrap();
        item.update_size();

        let decoded = V10::decode(item.as_bytes()).unwrap();
        assert_eq!(decoded.body(), &[0, 0, 0, 0, 9, 9]);
        assert!(!decoded.has_body_header());
    }
}
