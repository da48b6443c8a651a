//! Zero-copy indexing of built event bodies.

use crate::error::{CoreError, CoreResult};
use crate::fragment::header::{FragmentHeader, BODY_PREFIX_SIZE};
use crate::item::{read_u32, ByteOrder, BODY_HEADER_SLOT_SIZE, ENVELOPE_SIZE};

/// One fragment of a built event.
///
/// Views borrow from the indexed buffer and are valid as long as it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentDescriptor<'a> {
    /// Fragment timestamp.
    pub timestamp: u64,
    /// Source that produced the fragment.
    pub source_id: u32,
    /// Bytes of payload.
    pub payload_size: u32,
    /// Barrier code.
    pub barrier: u32,
    /// The embedded item's envelope and body header.
    pub item_header: &'a [u8],
    /// The embedded item's body, up to the end of the payload.
    pub item_body: &'a [u8],
}

impl FragmentDescriptor<'_> {
    /// Returns `true` if the fragment marks a barrier.
    #[must_use]
    pub fn is_barrier(&self) -> bool {
        self.barrier != 0
    }
}

/// Reusable fragment indexer.
///
/// Each call clears the previous result. Indexing is all or nothing: a
/// fragment that runs past the end of the input fails the whole call with
/// [`CoreError::InsufficientData`] and leaves the index empty.
#[derive(Debug, Default)]
pub struct FragmentIndex<'a> {
    descriptors: Vec<FragmentDescriptor<'a>>,
}

impl<'a> FragmentIndex<'a> {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a built event body that starts with the 4-byte total byte
    /// count.
    ///
    /// Only the bytes covered by the count are indexed.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidArgument`] if the body cannot hold the count, or
    ///   the count is smaller than itself
    /// - [`CoreError::InsufficientData`] if the count exceeds the body or a
    ///   fragment is truncated
    pub fn index_body(&mut self, body: &'a [u8]) -> CoreResult<&[FragmentDescriptor<'a>]> {
        self.descriptors.clear();
        if body.len() < BODY_PREFIX_SIZE {
            return Err(CoreError::invalid_argument(format!(
                "built event body of {} bytes cannot hold its byte count",
                body.len()
            )));
        }
        let total = read_u32(body, 0) as usize;
        if total < BODY_PREFIX_SIZE {
            return Err(CoreError::invalid_argument(format!(
                "built event byte count {total} is smaller than the count itself"
            )));
        }
        if total > body.len() {
            return Err(CoreError::insufficient_data(total, body.len()));
        }
        self.index(&body[BODY_PREFIX_SIZE..total])
    }

    /// Indexes back-to-back fragments filling `fragments` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InsufficientData`] if the last fragment is
    /// truncated.
    pub fn index(&mut self, fragments: &'a [u8]) -> CoreResult<&[FragmentDescriptor<'a>]> {
        self.descriptors.clear();
        if let Err(e) = self.walk(fragments) {
            self.descriptors.clear();
            return Err(e);
        }
        Ok(&self.descriptors)
    }

    fn walk(&mut self, fragments: &'a [u8]) -> CoreResult<()> {
        let mut pos = 0;
        while pos < fragments.len() {
            let rest = &fragments[pos..];
            let header = FragmentHeader::decode(rest)?;
            let stride = header.stride();
            if stride > rest.len() {
                return Err(CoreError::insufficient_data(stride, rest.len()));
            }

            let payload = &rest[FragmentHeader::SIZE..stride];
            let split = embedded_body_offset(payload);
            let (item_header, item_body) = payload.split_at(split);
            self.descriptors.push(FragmentDescriptor {
                timestamp: header.timestamp,
                source_id: header.source_id,
                payload_size: header.payload_size,
                barrier: header.barrier,
                item_header,
                item_body,
            });
            pos += stride;
        }
        Ok(())
    }

    /// Descriptors from the last successful call.
    #[must_use]
    pub fn descriptors(&self) -> &[FragmentDescriptor<'a>] {
        &self.descriptors
    }

    /// Number of indexed fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterates over the indexed fragments in order.
    pub fn iter(&self) -> std::slice::Iter<'_, FragmentDescriptor<'a>> {
        self.descriptors.iter()
    }
}

impl<'i, 'a> IntoIterator for &'i FragmentIndex<'a> {
    type Item = &'i FragmentDescriptor<'a>;
    type IntoIter = std::slice::Iter<'i, FragmentDescriptor<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Indexes back-to-back fragments into a new list.
///
/// # Errors
///
/// See [`FragmentIndex::index`].
pub fn index_fragments(fragments: &[u8]) -> CoreResult<Vec<FragmentDescriptor<'_>>> {
    let mut index = FragmentIndex::new();
    index.index(fragments)?;
    Ok(index.descriptors)
}

/// Where the body of an embedded item starts within `payload`.
///
/// Follows the slotted convention: a zero first body word is the "no body
/// header" sentinel, anything else is the header size. Payloads too short to
/// describe an item have no body.
fn embedded_body_offset(payload: &[u8]) -> usize {
    let slot_end = ENVELOPE_SIZE + BODY_HEADER_SLOT_SIZE;
    if payload.len() < slot_end {
        return payload.len();
    }
    let order = ByteOrder::detect(read_u32(payload, 4));
    let header_size = order.u32(read_u32(payload, ENVELOPE_SIZE)) as usize;
    let offset = if header_size == 0 {
        slot_end
    } else {
        ENVELOPE_SIZE.saturating_add(header_size)
    };
    offset.min(payload.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::header::{write_fragment, BuiltEventWriter};
    use crate::item::BodyHeader;
    use crate::types::ItemType;
    use crate::version::{WireFormat, V11};

    /// A fragment whose payload is a v11 item with a body header and
    /// `body_len` body bytes.
    fn push_fragment(writer: &mut BuiltEventWriter, sid: u32, body_len: usize) {
        let mut item = V11::new_item_with_body_header(
            ItemType::PHYSICS_EVENT,
            body_len,
            &BodyHeader::new(u64::from(sid) * 10, sid, 0),
        )
        .unwrap();
        item.append(&vec![sid as u8; body_len]).unwrap();
        item.update_size();
        writer.push_item(&item).unwrap();
    }

    fn raw_fragments(payload_sizes: &[usize]) -> Vec<u8> {
        let mut out = Vec::new();
        for (i, &size) in payload_sizes.iter().enumerate() {
            let header = FragmentHeader::new(i as u64, i as u32, size as u32, 0);
            write_fragment(&mut out, &header, &vec![0xEE; size]).unwrap();
        }
        out
    }

    #[test]
    fn three_fragments_in_order() {
        let bytes = raw_fragments(&[0, 16, 32]);
        let fragments = index_fragments(&bytes).unwrap();

        let sizes: Vec<u32> = fragments.iter().map(|f| f.payload_size).collect();
        assert_eq!(sizes, vec![0, 16, 32]);
        let sids: Vec<u32> = fragments.iter().map(|f| f.source_id).collect();
        assert_eq!(sids, vec![0, 1, 2]);
    }

    #[test]
    fn truncated_fragment_is_insufficient_data() {
        let bytes = raw_fragments(&[0, 16, 32]);
        let truncated = &bytes[..bytes.len() - 4];

        let mut index = FragmentIndex::new();
        let err = index.index(truncated).unwrap_err();
        assert!(err.is_insufficient_data());
        assert!(index.is_empty(), "no partial list on failure");
    }

    #[test]
    fn truncated_fragment_header_is_insufficient_data() {
        let mut bytes = raw_fragments(&[8]);
        bytes.extend_from_slice(&[0u8; 10]);
        assert!(index_fragments(&bytes).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn empty_range_is_empty_list() {
        assert!(index_fragments(&[]).unwrap().is_empty());

        let body = BuiltEventWriter::new().finish().unwrap();
        let mut index = FragmentIndex::new();
        assert!(index.index_body(&body).unwrap().is_empty());
    }

    #[test]
    fn views_split_embedded_item() {
        let mut writer = BuiltEventWriter::new();
        push_fragment(&mut writer, 1, 6);
        push_fragment(&mut writer, 2, 0);
        let body = writer.finish().unwrap();

        let mut index = FragmentIndex::new();
        let fragments = index.index_body(&body).unwrap();
        assert_eq!(fragments.len(), 2);

        let first = &fragments[0];
        assert_eq!(first.timestamp, 10);
        assert_eq!(first.source_id, 1);
        assert_eq!(first.item_header.len(), 8 + 20);
        assert_eq!(first.item_body, &[1u8; 6]);

        let second = &fragments[1];
        assert_eq!(second.item_header.len(), 28);
        assert!(second.item_body.is_empty());
    }

    #[test]
    fn extended_body_header_is_skipped() {
        let mut item = V11::new_item(ItemType::PHYSICS_EVENT, 4).unwrap();
        item.replace_body_header(&BodyHeader::new(3, 4, 0).with_extension(vec![0; 8]))
            .unwrap();
        item.append(b"tail").unwrap();
        item.update_size();

        let mut writer = BuiltEventWriter::new();
        writer.push_item(&item).unwrap();
        let body = writer.finish().unwrap();

        let mut index = FragmentIndex::new();
        let fragments = index.index_body(&body).unwrap();
        assert_eq!(fragments[0].item_header.len(), 8 + 28);
        assert_eq!(fragments[0].item_body, b"tail");
    }

    #[test]
    fn embedded_item_without_body_header() {
        let item = {
            let mut item = V11::new_item(ItemType::PHYSICS_EVENT, 3).unwrap();
            item.append(b"abc").unwrap();
            item.update_size();
            item
        };
        let payload = item.as_bytes();
        let mut bytes = Vec::new();
        write_fragment(
            &mut bytes,
            &FragmentHeader::new(1, 1, payload.len() as u32, 0),
            payload,
        )
        .unwrap();

        let fragments = index_fragments(&bytes).unwrap();
        assert_eq!(fragments[0].item_header.len(), 12);
        assert_eq!(fragments[0].item_body, b"abc");
    }

    #[test]
    fn short_payload_has_empty_body() {
        let bytes = raw_fragments(&[5]);
        let fragments = index_fragments(&bytes).unwrap();
        assert_eq!(fragments[0].item_header.len(), 5);
        assert!(fragments[0].item_body.is_empty());
    }

    #[test]
    fn index_body_validates_prefix() {
        let mut index = FragmentIndex::new();
        assert!(matches!(
            index.index_body(&[1, 0]),
            Err(CoreError::InvalidArgument { .. })
        ));
        assert!(matches!(
            index.index_body(&[2, 0, 0, 0]),
            Err(CoreError::InvalidArgument { .. })
        ));
        assert!(index.index_body(&[40, 0, 0, 0]).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn index_body_ignores_bytes_past_count() {
        let mut writer = BuiltEventWriter::new();
        push_fragment(&mut writer, 3, 4);
        let mut body = writer.finish().unwrap();
        body.extend_from_slice(&[0xFF; 7]);

        let mut index = FragmentIndex::new();
        assert_eq!(index.index_body(&body).unwrap().len(), 1);
    }

    #[test]
    fn index_is_reusable() {
        let a = raw_fragments(&[1, 2, 3]);
        let b = raw_fragments(&[4]);

        let mut index = FragmentIndex::new();
        assert_eq!(index.index(&a).unwrap().len(), 3);
        assert_eq!(index.index(&b).unwrap().len(), 1);
        assert_eq!(index.descriptors()[0].payload_size, 4);
        assert_eq!((&index).into_iter().count(), 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn arbitrary_bytes_index_or_fail_cleanly(
                bytes in prop::collection::vec(any::<u8>(), 0..256)
            ) {
                let mut index = FragmentIndex::new();
                let covered = index.index(&bytes).map(|fragments| {
                    fragments
                        .iter()
                        .map(|f| FragmentHeader::SIZE + f.payload_size as usize)
                        .sum::<usize>()
                });
                match covered {
                    Ok(total) => prop_assert_eq!(total, bytes.len()),
                    Err(_) => prop_assert!(index.is_empty()),
                }
            }

            #[test]
            fn raw_fragments_index_in_order(
                sizes in prop::collection::vec(0usize..64, 0..12)
            ) {
                let bytes = raw_fragments(&sizes);
                let fragments = index_fragments(&bytes).unwrap();
                let got: Vec<usize> = fragments.iter().map(|f| f.payload_size as usize).collect();
                prop_assert_eq!(got, sizes);
            }
        }
    }
}
