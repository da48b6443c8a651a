//! Benchmark utilities.

use rand::Rng;
use ringitem_core::{BodyHeader, BuiltEventWriter, ItemType, WireFormat, V11};

/// Generate random body bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate fragment payload sizes uniformly in `0..max`.
pub fn random_sizes(count: usize, max: usize) -> Vec<usize> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen_range(0..max.max(1))).collect()
}

/// Build a built event body of `count` v11 physics events with
/// `body_size`-byte bodies.
pub fn built_event_body(count: usize, body_size: usize) -> Vec<u8> {
    let body = random_data(body_size);
    let mut writer = BuiltEventWriter::new();
    for sid in 0..count as u32 {
        let header = BodyHeader::new(u64::from(sid) * 100, sid, 0);
        let mut item =
            V11::new_item_with_body_header(ItemType::PHYSICS_EVENT, body_size, &header).unwrap();
        item.append(&body).unwrap();
        item.update_size();
        writer.push_item(&item).unwrap();
    }
    writer.finish().unwrap()
}
