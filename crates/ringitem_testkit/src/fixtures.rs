//! Test fixtures for ring items and built events.
//!
//! Fixtures panic on failure: they are for tests, where a broken fixture
//! should stop the test immediately.

use ringitem_core::{
    BodyHeader, BuiltEventWriter, FormatVersion, ItemType, RingItem, WireFormat, V12,
};

/// Bytes reserved for a state change title, terminator included.
pub const TITLE_FIELD_SIZE: usize = 81;

/// A body header with no barrier.
#[must_use]
pub fn body_header(timestamp: u64, source_id: u32) -> BodyHeader {
    BodyHeader::new(timestamp, source_id, 0)
}

/// Builds a finished item of `item_type` with `body`, optionally headed by
/// `header`.
pub fn item_with_body(
    version: FormatVersion,
    item_type: ItemType,
    body: &[u8],
    header: Option<BodyHeader>,
) -> RingItem<'static> {
    let mut item = version
        .new_item(item_type, body.len())
        .expect("Failed to create item");
    item.append(body).expect("Failed to append body");
    if let Some(header) = header {
        item.replace_body_header(&header)
            .expect("Failed to set body header");
    }
    item.update_size();
    item
}

/// Builds a finished physics event.
pub fn physics_event(
    version: FormatVersion,
    body: &[u8],
    header: Option<BodyHeader>,
) -> RingItem<'static> {
    item_with_body(version, ItemType::PHYSICS_EVENT, body, header)
}

/// One source's contribution to a built event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSpec {
    /// Fragment timestamp.
    pub timestamp: u64,
    /// Producing source.
    pub source_id: u32,
    /// Barrier code.
    pub barrier: u32,
    /// Body of the embedded physics event.
    pub body: Vec<u8>,
}

impl FragmentSpec {
    /// Creates a fragment with no barrier.
    #[must_use]
    pub fn new(timestamp: u64, source_id: u32, body: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp,
            source_id,
            barrier: 0,
            body: body.into(),
        }
    }

    /// The embedded item, a v11 physics event headed by this fragment's
    /// timestamp, source and barrier.
    pub fn item(&self) -> RingItem<'static> {
        physics_event(
            FormatVersion::V11,
            &self.body,
            Some(BodyHeader::new(self.timestamp, self.source_id, self.barrier)),
        )
    }
}

/// Builds a built event body (byte count prefix plus fragments).
pub fn built_event_body(fragments: &[FragmentSpec]) -> Vec<u8> {
    let mut writer = BuiltEventWriter::new();
    for spec in fragments {
        writer
            .push_item(&spec.item())
            .expect("Failed to push fragment");
    }
    writer.finish().expect("Failed to finish built event")
}

/// Builds a physics event whose body is a built event.
///
/// The body header carries `output_source_id` and the earliest fragment
/// timestamp, as an event builder would emit.
pub fn built_event(
    version: FormatVersion,
    output_source_id: u32,
    fragments: &[FragmentSpec],
) -> RingItem<'static> {
    let body = built_event_body(fragments);
    let header = version.has_body_headers().then(|| {
        let timestamp = fragments.iter().map(|f| f.timestamp).min().unwrap_or(0);
        body_header(timestamp, output_source_id)
    });
    physics_event(version, &body, header)
}

/// Builds a v12 state change item carrying `original_source_id` in its body.
pub fn state_change_v12(item_type: ItemType, run: u32, original_source_id: u32) -> RingItem<'static> {
    let mut body = Vec::with_capacity(20 + TITLE_FIELD_SIZE);
    body.extend_from_slice(&run.to_le_bytes());
    body.extend_from_slice(&0u32.to_le_bytes());
    body.extend_from_slice(&0u32.to_le_bytes());
    body.extend_from_slice(&1u32.to_le_bytes());
    body.extend_from_slice(&0u32.to_le_bytes());
    body.resize(20 + TITLE_FIELD_SIZE, 0);

    let mut item = item_with_body(FormatVersion::V12, item_type, &body, None);
    V12::set_original_source_id(&mut item, original_source_id)
        .expect("Failed to set original source id");
    item
}
