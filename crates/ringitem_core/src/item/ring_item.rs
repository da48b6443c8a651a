//! The generic ring item engine.

use std::fmt;
use std::thread;
use std::time::Instant;

use ringitem_storage::{ByteSink, ByteSource};
use tracing::{debug, warn};

use crate::config::ReserveConfig;
use crate::error::{CoreError, CoreResult};
use crate::item::body_header::BodyHeader;
use crate::item::buffer::ItemBuffer;
use crate::item::envelope::{
    read_u32, read_u64, write_u32, write_u64, ByteOrder, BODY_HEADER_SLOT_SIZE,
    ENVELOPE_OVERHEAD, ENVELOPE_SIZE, MIN_BODY_HEADER_SIZE,
};
use crate::types::ItemType;

/// Largest item the 32-bit size word can describe.
pub const MAX_ITEM_SIZE: usize = u32::MAX as usize;

/// Whether a wire format reserves a body header slot after the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// The body starts right after the envelope.
    Bare,
    /// The first body word is either zero or the size of a body header.
    Slotted,
}

/// The current arrangement of the bytes between envelope and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// No slot at all.
    Bare,
    /// A slot holding the zero sentinel.
    NoHeader,
    /// A body header of `header_size` bytes, extension words included.
    WithHeader {
        /// Value of the header's size word.
        header_size: usize,
    },
}

impl BodyShape {
    /// Bytes between the envelope and the body.
    #[must_use]
    pub const fn header_region(self) -> usize {
        match self {
            Self::Bare => 0,
            Self::NoHeader => BODY_HEADER_SLOT_SIZE,
            Self::WithHeader { header_size } => header_size,
        }
    }

    /// Offset of the first body byte from the start of the item.
    #[must_use]
    pub const fn body_offset(self) -> usize {
        ENVELOPE_SIZE + self.header_region()
    }

    /// Returns `true` if a body header is present.
    #[must_use]
    pub const fn has_body_header(self) -> bool {
        matches!(self, Self::WithHeader { .. })
    }
}

/// A variable-length ring item: envelope, optional body header, body.
///
/// The body is written through a caller-managed cursor. The envelope size
/// word is only refreshed by [`update_size`](Self::update_size), so after
/// writing through [`spare_body_mut`](Self::spare_body_mut) and moving the
/// cursor the caller must call it (or commit, which calls it).
///
/// After `update_size`:
///
/// ```text
/// size() == ENVELOPE_SIZE + shape().header_region() + body_size()
/// ```
///
/// Items built with [`new_zero_copy`](Self::new_zero_copy) may live inside
/// the destination sink; the lifetime `'a` ties them to that sink so the
/// reserved region cannot outlive the commit.
pub struct RingItem<'a> {
    buffer: ItemBuffer<'a>,
    item_type: ItemType,
    shape: BodyShape,
    cursor: usize,
    order: ByteOrder,
    sink: Option<&'a mut dyn ByteSink>,
}

impl RingItem<'static> {
    /// Creates an item with an empty body.
    ///
    /// Capacity for `capacity_hint` body bytes plus the envelope and a minimal
    /// body header is set aside; small items are stored inline.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Allocation`] if heap storage cannot be reserved.
    pub fn new(item_type: ItemType, capacity_hint: usize, framing: Framing) -> CoreResult<Self> {
        let buffer = ItemBuffer::owned(capacity_hint.saturating_add(ENVELOPE_OVERHEAD))?;
        Ok(Self::init(buffer, item_type, framing, None))
    }

    /// Decodes an item from the front of `bytes`.
    ///
    /// Bytes past the item's declared size are ignored. An item written by a
    /// foreign-endian producer keeps its bytes exactly as written: envelope
    /// and body header fields are converted on every read and write, so
    /// [`as_bytes`](Self::as_bytes) reproduces the producer's image.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InsufficientData`] if `bytes` is shorter than the item
    /// - [`CoreError::InvalidFormat`] if the envelope or body header is malformed
    pub fn from_bytes(bytes: &[u8], framing: Framing) -> CoreResult<Self> {
        if bytes.len() < ENVELOPE_SIZE {
            return Err(CoreError::insufficient_data(ENVELOPE_SIZE, bytes.len()));
        }
        let order = ByteOrder::detect(read_u32(bytes, 4));
        let size = order.u32(read_u32(bytes, 0)) as usize;
        if size < ENVELOPE_SIZE {
            return Err(CoreError::invalid_format(format!(
                "item size {size} is smaller than the envelope"
            )));
        }
        if size > bytes.len() {
            return Err(CoreError::insufficient_data(size, bytes.len()));
        }

        let mut buffer = ItemBuffer::owned(size)?;
        let data = buffer.as_mut_slice();
        data[..size].copy_from_slice(&bytes[..size]);
        let item_type = ItemType::new(order.u32(read_u32(data, 4)));

        let shape = match framing {
            Framing::Bare => BodyShape::Bare,
            Framing::Slotted => {
                if size < ENVELOPE_SIZE + BODY_HEADER_SLOT_SIZE {
                    return Err(CoreError::invalid_format(format!(
                        "item size {size} leaves no room for the body header slot"
                    )));
                }
                let header_size = order.u32(read_u32(data, ENVELOPE_SIZE)) as usize;
                if header_size == 0 {
                    BodyShape::NoHeader
                } else {
                    if header_size < MIN_BODY_HEADER_SIZE {
                        return Err(CoreError::invalid_format(format!(
                            "body header size {header_size} is below the minimum of {MIN_BODY_HEADER_SIZE}"
                        )));
                    }
                    if ENVELOPE_SIZE + header_size > size {
                        return Err(CoreError::invalid_format(format!(
                            "body header size {header_size} overruns item of {size} bytes"
                        )));
                    }
                    BodyShape::WithHeader { header_size }
                }
            }
        };

        if order == ByteOrder::Swapped {
            warn!(
                item_type = item_type.as_u32(),
                size, "decoded item from a foreign-endian producer"
            );
        }

        Ok(Self {
            buffer,
            item_type,
            shape,
            cursor: size,
            order,
            sink: None,
        })
    }

    /// Reads exactly one item from `source`.
    ///
    /// # Errors
    ///
    /// Propagates source errors (including a clean end of stream) and any
    /// decoding error from [`from_bytes`](Self::from_bytes).
    pub fn read_from(source: &mut dyn ByteSource, framing: Framing) -> CoreResult<Self> {
        let mut envelope = [0u8; ENVELOPE_SIZE];
        source.get(&mut envelope)?;

        let order = ByteOrder::detect(read_u32(&envelope, 4));
        let size = order.u32(read_u32(&envelope, 0)) as usize;
        if size < ENVELOPE_SIZE {
            return Err(CoreError::invalid_format(format!(
                "item size {size} is smaller than the envelope"
            )));
        }

        let mut bytes = Vec::new();
        bytes.try_reserve_exact(size)?;
        bytes.extend_from_slice(&envelope);
        bytes.resize(size, 0);
        source.get(&mut bytes[ENVELOPE_SIZE..])?;

        Self::from_bytes(&bytes, framing)
    }
}

impl<'a> RingItem<'a> {
    /// Creates an item directly inside `sink` when possible.
    ///
    /// If the sink has room for `capacity_hint` body bytes plus the envelope,
    /// a minimal body header and `config.slack` contiguous bytes before its
    /// wrap point (waiting up to `config.wait_timeout` for them), the item
    /// is built in that region and [`commit`](Self::commit) only advances the
    /// sink's write cursor. Otherwise the item falls back to owned storage and
    /// `commit` copies it into the sink.
    ///
    /// Waiting only helps for sinks whose free space is changed by another
    /// party, such as a consumer draining shared memory. The sink is borrowed
    /// mutably for the whole wait, so an in-process sink like
    /// `RingBuffer` cannot gain space and simply times out.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Allocation`] if the fallback storage cannot be
    /// reserved.
    pub fn new_zero_copy(
        item_type: ItemType,
        capacity_hint: usize,
        framing: Framing,
        sink: &'a mut dyn ByteSink,
        config: &ReserveConfig,
    ) -> CoreResult<Self> {
        let needed = capacity_hint
            .saturating_add(ENVELOPE_OVERHEAD)
            .saturating_add(config.slack);

        if wait_for_space(&*sink, needed, config) {
            let reservation = sink.reserve(needed).ok_or_else(|| {
                CoreError::invalid_argument("sink refused a reservation it reported space for")
            })?;
            return Ok(Self::init(
                ItemBuffer::InPlace(reservation),
                item_type,
                framing,
                None,
            ));
        }

        debug!(
            needed,
            available = sink.contiguous_space(),
            "no contiguous sink space, building item in owned storage"
        );
        let buffer = ItemBuffer::owned(capacity_hint.saturating_add(ENVELOPE_OVERHEAD))?;
        Ok(Self::init(buffer, item_type, framing, Some(sink)))
    }

    fn init(
        mut buffer: ItemBuffer<'a>,
        item_type: ItemType,
        framing: Framing,
        sink: Option<&'a mut dyn ByteSink>,
    ) -> Self {
        let shape = match framing {
            Framing::Bare => BodyShape::Bare,
            Framing::Slotted => BodyShape::NoHeader,
        };
        let cursor = shape.body_offset();

        let bytes = buffer.as_mut_slice();
        write_u32(bytes, 0, cursor as u32);
        write_u32(bytes, 4, item_type.as_u32());
        if shape == BodyShape::NoHeader {
            write_u32(bytes, ENVELOPE_SIZE, 0);
        }

        Self {
            buffer,
            item_type,
            shape,
            cursor,
            order: ByteOrder::Native,
            sink,
        }
    }

    /// Type code of the item.
    #[must_use]
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Current arrangement of the body header region.
    #[must_use]
    pub fn shape(&self) -> BodyShape {
        self.shape
    }

    /// Framing the item was created or decoded with.
    #[must_use]
    pub fn framing(&self) -> Framing {
        match self.shape {
            BodyShape::Bare => Framing::Bare,
            BodyShape::NoHeader | BodyShape::WithHeader { .. } => Framing::Slotted,
        }
    }

    /// Returns `true` if the item lives inside a sink reservation.
    #[must_use]
    pub fn is_in_place(&self) -> bool {
        self.buffer.is_in_place()
    }

    /// Returns `true` if the item was decoded from a foreign-endian producer.
    #[must_use]
    pub fn is_foreign_order(&self) -> bool {
        self.order == ByteOrder::Swapped
    }

    /// Bytes the item can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Total size recorded in the envelope.
    ///
    /// Stale between a body write and the next [`update_size`](Self::update_size).
    #[must_use]
    pub fn size(&self) -> usize {
        self.word(0) as usize
    }

    /// Recomputes the envelope size from the header region and the cursor.
    pub fn update_size(&mut self) {
        let size = self.cursor as u32;
        self.set_word(0, size);
    }

    /// Offset of the write cursor from the start of the item.
    #[must_use]
    pub fn body_cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the write cursor.
    ///
    /// The bytes between the body start and `position` become the body.
    ///
    /// # Errors
    ///
    /// Returns an error if `position` precedes the body or exceeds the
    /// item's capacity.
    pub fn set_body_cursor(&mut self, position: usize) -> CoreResult<()> {
        let body_offset = self.shape.body_offset();
        if position < body_offset {
            return Err(CoreError::invalid_argument(format!(
                "body cursor {position} precedes body start {body_offset}"
            )));
        }
        if position > self.capacity() {
            return Err(CoreError::field_too_large(
                "body cursor",
                position,
                self.capacity(),
            ));
        }
        self.cursor = position;
        Ok(())
    }

    /// Offset of the first body byte.
    ///
    /// Computed from the actual body header size, so extension words are
    /// skipped correctly.
    #[must_use]
    pub fn body_offset(&self) -> usize {
        self.shape.body_offset()
    }

    /// Bytes between the body start and the cursor.
    #[must_use]
    pub fn body_size(&self) -> usize {
        self.cursor - self.shape.body_offset()
    }

    /// The body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.buffer.as_slice()[self.shape.body_offset()..self.cursor]
    }

    /// The body written so far, writable.
    pub fn body_mut(&mut self) -> &mut [u8] {
        let start = self.shape.body_offset();
        &mut self.buffer.as_mut_slice()[start..self.cursor]
    }

    /// Unwritten capacity after the cursor.
    pub fn spare_body_mut(&mut self) -> &mut [u8] {
        let cursor = self.cursor;
        &mut self.buffer.as_mut_slice()[cursor..]
    }

    /// Grows owned storage so `additional` more body bytes fit after the cursor.
    ///
    /// # Errors
    ///
    /// Fails for in-place items that would outgrow their reservation, for
    /// items that would exceed [`MAX_ITEM_SIZE`], and on allocation failure.
    pub fn reserve_body(&mut self, additional: usize) -> CoreResult<()> {
        let needed = self.cursor.saturating_add(additional);
        if needed > MAX_ITEM_SIZE {
            return Err(CoreError::field_too_large("item", needed, MAX_ITEM_SIZE));
        }
        self.buffer.ensure_capacity(needed, self.cursor)
    }

    /// Writes `data` at the cursor and advances it.
    ///
    /// Does not refresh the envelope size.
    ///
    /// # Errors
    ///
    /// See [`reserve_body`](Self::reserve_body).
    pub fn append(&mut self, data: &[u8]) -> CoreResult<()> {
        self.reserve_body(data.len())?;
        let start = self.cursor;
        self.buffer.as_mut_slice()[start..start + data.len()].copy_from_slice(data);
        self.cursor += data.len();
        Ok(())
    }

    /// Returns `true` if a body header is present.
    #[must_use]
    pub fn has_body_header(&self) -> bool {
        self.shape.has_body_header()
    }

    /// Size of the body header, extension words included; zero if absent.
    #[must_use]
    pub fn body_header_size(&self) -> usize {
        match self.shape {
            BodyShape::WithHeader { header_size } => header_size,
            BodyShape::Bare | BodyShape::NoHeader => 0,
        }
    }

    /// Decodes the body header.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoBodyHeader`] if the item has none.
    pub fn body_header(&self) -> CoreResult<BodyHeader> {
        self.require_body_header()?;
        BodyHeader::decode_ordered(&self.buffer.as_slice()[ENVELOPE_SIZE..], self.order)
    }

    /// Body header timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoBodyHeader`] if the item has none.
    pub fn timestamp(&self) -> CoreResult<u64> {
        self.require_body_header()?;
        Ok(self.order.u64(read_u64(self.buffer.as_slice(), ENVELOPE_SIZE + 4)))
    }

    /// Body header source id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoBodyHeader`] if the item has none.
    pub fn source_id(&self) -> CoreResult<u32> {
        self.require_body_header()?;
        Ok(self.word(ENVELOPE_SIZE + 12))
    }

    /// Body header barrier code.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoBodyHeader`] if the item has none.
    pub fn barrier(&self) -> CoreResult<u32> {
        self.require_body_header()?;
        Ok(self.word(ENVELOPE_SIZE + 16))
    }

    /// Reads the `u32` at `offset` in the item's byte order.
    fn word(&self, offset: usize) -> u32 {
        self.order.u32(read_u32(self.buffer.as_slice(), offset))
    }

    fn set_word(&mut self, offset: usize, value: u32) {
        let value = self.order.u32(value);
        write_u32(self.buffer.as_mut_slice(), offset, value);
    }

    fn require_body_header(&self) -> CoreResult<()> {
        if self.shape.has_body_header() {
            Ok(())
        } else {
            Err(CoreError::no_body_header(self.item_type.as_u32()))
        }
    }

    /// Sets the body header fields.
    ///
    /// An existing header is overwritten in place, keeping its size word and
    /// extension words. Otherwise a minimal header is inserted and the body
    /// written so far slides forward to make room; the body bytes and
    /// [`body_size`](Self::body_size) are unchanged.
    ///
    /// # Errors
    ///
    /// Fails for formats without a body header slot and when an in-place
    /// item has no room for the header.
    pub fn set_body_header(&mut self, timestamp: u64, source_id: u32, barrier: u32) -> CoreResult<()> {
        match self.shape {
            BodyShape::Bare => Err(CoreError::invalid_argument(
                "this wire format has no body header",
            )),
            BodyShape::WithHeader { .. } => {
                let order = self.order;
                write_u64(self.buffer.as_mut_slice(), ENVELOPE_SIZE + 4, order.u64(timestamp));
                self.set_word(ENVELOPE_SIZE + 12, source_id);
                self.set_word(ENVELOPE_SIZE + 16, barrier);
                Ok(())
            }
            BodyShape::NoHeader => {
                self.replace_body_header(&BodyHeader::new(timestamp, source_id, barrier))
            }
        }
    }

    /// Installs `header`, extension words included, replacing any existing one.
    ///
    /// The body slides by the difference between the old and new header
    /// region sizes.
    ///
    /// # Errors
    ///
    /// See [`set_body_header`](Self::set_body_header).
    pub fn replace_body_header(&mut self, header: &BodyHeader) -> CoreResult<()> {
        if self.shape == BodyShape::Bare {
            return Err(CoreError::invalid_argument(
                "this wire format has no body header",
            ));
        }
        let new_shape = BodyShape::WithHeader {
            header_size: header.size(),
        };
        self.reshape(new_shape)?;
        header.encode_ordered(&mut self.buffer.as_mut_slice()[ENVELOPE_SIZE..], self.order)?;
        self.update_size();
        Ok(())
    }

    /// Removes the body header, leaving the zero sentinel in its slot.
    ///
    /// # Errors
    ///
    /// Fails for formats without a body header slot.
    pub fn remove_body_header(&mut self) -> CoreResult<()> {
        match self.shape {
            BodyShape::Bare => Err(CoreError::invalid_argument(
                "this wire format has no body header",
            )),
            BodyShape::NoHeader => Ok(()),
            BodyShape::WithHeader { .. } => {
                self.reshape(BodyShape::NoHeader)?;
                write_u32(self.buffer.as_mut_slice(), ENVELOPE_SIZE, 0);
                self.update_size();
                Ok(())
            }
        }
    }

    /// Moves the body so it starts where `new_shape` puts it.
    fn reshape(&mut self, new_shape: BodyShape) -> CoreResult<()> {
        let old_start = self.shape.body_offset();
        let new_start = new_shape.body_offset();
        let body_len = self.cursor - old_start;
        let new_cursor = new_start + body_len;
        if new_cursor > MAX_ITEM_SIZE {
            return Err(CoreError::field_too_large("item", new_cursor, MAX_ITEM_SIZE));
        }

        self.buffer.ensure_capacity(new_cursor, self.cursor)?;
        self.buffer
            .as_mut_slice()
            .copy_within(old_start..self.cursor, new_start);
        self.cursor = new_cursor;
        self.shape = new_shape;
        Ok(())
    }

    /// The encoded item as recorded by the envelope size.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        let size = self.size().min(self.capacity());
        &self.buffer.as_slice()[..size]
    }

    /// Copies the encoded item into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Copies the item into owned storage, detached from any sink.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Allocation`] if storage cannot be reserved.
    pub fn detach(&self) -> CoreResult<RingItem<'static>> {
        let mut buffer = ItemBuffer::owned(self.cursor.max(ENVELOPE_OVERHEAD))?;
        buffer.as_mut_slice()[..self.cursor].copy_from_slice(&self.buffer.as_slice()[..self.cursor]);
        Ok(RingItem {
            buffer,
            item_type: self.item_type,
            shape: self.shape,
            cursor: self.cursor,
            order: self.order,
            sink: None,
        })
    }

    /// Refreshes the size and publishes the item to the sink it was built for.
    ///
    /// In-place items are published by advancing the sink's write cursor;
    /// items that fell back to owned storage are copied in.
    ///
    /// Returns the number of bytes published.
    ///
    /// # Errors
    ///
    /// Fails if the item was not created with
    /// [`new_zero_copy`](Self::new_zero_copy), or if the sink rejects the bytes.
    pub fn commit(mut self) -> CoreResult<usize> {
        self.update_size();
        let size = self.cursor;

        if let Some(sink) = self.sink.take() {
            sink.put(&self.buffer.as_slice()[..size])?;
            return Ok(size);
        }
        match self.buffer.into_reservation() {
            Some(reservation) => {
                reservation.commit(size)?;
                Ok(size)
            }
            None => Err(CoreError::invalid_argument(
                "item is not attached to a sink, use commit_to",
            )),
        }
    }

    /// Refreshes the size and copies the item into `sink`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Propagates the sink's error if it cannot hold the item.
    pub fn commit_to(&mut self, sink: &mut dyn ByteSink) -> CoreResult<usize> {
        self.update_size();
        let size = self.cursor;
        sink.put(&self.buffer.as_slice()[..size])?;
        Ok(size)
    }
}

impl fmt::Debug for RingItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingItem")
            .field("item_type", &self.item_type)
            .field("shape", &self.shape)
            .field("size", &self.size())
            .field("cursor", &self.cursor)
            .field("in_place", &self.is_in_place())
            .field("foreign_order", &self.is_foreign_order())
            .field("attached", &self.sink.is_some())
            .finish()
    }
}

/// Polls `sink` until `needed` contiguous bytes are free or the wait expires.
///
/// Only sinks with interior or shared-memory mutability can report more
/// space between polls. A timeout too large to represent waits forever.
fn wait_for_space(sink: &dyn ByteSink, needed: usize, config: &ReserveConfig) -> bool {
    let deadline = Instant::now().checked_add(config.wait_timeout);
    loop {
        if sink.contiguous_space() >= needed {
            return true;
        }
        if config.wait_timeout.is_zero() || deadline.is_some_and(|d| Instant::now() >= d) {
            return false;
        }
        thread::sleep(config.poll_interval);
    }
}
