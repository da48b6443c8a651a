//! Fuzz testing harnesses for ring items.
//!
//! These targets can be driven by cargo-fuzz or any other fuzzer. Each one
//! asserts the invariants that must hold for arbitrary input; none may panic.

use ringitem_core::{FormatVersion, FragmentIndex, RingItem, WireFormat, ENVELOPE_SIZE, V11};

/// Fuzz target for item decoding.
///
/// Tests that arbitrary byte sequences either:
/// - Decode to an item whose encoded bytes are a prefix of the input, or
/// - Return a proper error (no panics)
pub fn fuzz_decode(data: &[u8]) {
    for version in [FormatVersion::V10, FormatVersion::V11, FormatVersion::V12] {
        if let Ok(item) = version.decode(data) {
            assert!(item.size() >= ENVELOPE_SIZE);
            assert!(item.size() <= data.len());
            assert_eq!(
                item.size(),
                item.body_offset() + item.body_size(),
                "size invariant broken for {version}"
            );
            assert_eq!(item.as_bytes(), &data[..item.size()]);
            let _ = item.timestamp();
            let _ = format!("{item:?}");
        }
    }
}

/// Fuzz target for built event indexing.
///
/// Successful indexing must account for every fragment byte; failures must
/// leave the index empty.
pub fn fuzz_index(data: &[u8]) {
    let mut index = FragmentIndex::new();
    match index.index(data) {
        Ok(fragments) => {
            let covered: usize = fragments
                .iter()
                .map(|f| 20 + f.item_header.len() + f.item_body.len())
                .sum();
            assert_eq!(covered, data.len());
        }
        Err(_) => assert!(index.is_empty()),
    }
    let _ = index.index_body(data);
}

/// Fuzz target for body header insertion.
///
/// The first bytes pick header fields; the rest become the body, which must
/// survive insertion unchanged.
pub fn fuzz_slide(data: &[u8]) {
    let (fields, body) = data.split_at(data.len().min(8));
    let mut word = [0u8; 8];
    word[..fields.len()].copy_from_slice(fields);
    let timestamp = u64::from_le_bytes(word);

    let mut item = match V11::new_item(ringitem_core::ItemType::PHYSICS_EVENT, body.len()) {
        Ok(item) => item,
        Err(_) => return,
    };
    if item.append(body).is_err() {
        return;
    }
    item.update_size();
    let before = item.body_size();

    item.set_body_header(timestamp, word[0].into(), 0)
        .expect("slotted items accept a body header");

    assert_eq!(item.body(), body);
    assert_eq!(item.body_size(), before);
    assert_eq!(item.size(), ENVELOPE_SIZE + 20 + body.len());

    let decoded = RingItem::from_bytes(item.as_bytes(), V11::FRAMING).expect("re-decode");
    assert_eq!(decoded.timestamp().expect("header present"), timestamp);
}
