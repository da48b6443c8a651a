//! Ring item layout and the generic item engine.
//!
//! Every ring item starts with an 8-byte envelope. Formats with body headers
//! follow it with a slot whose first word is either zero (no header) or the
//! size of the header:
//!
//! ```text
//! ┌──────────┬──────────┬───────────────────────────────┬─────────────┐
//! │ size u32 │ type u32 │ body header (optional)        │ body        │
//! │          │          │ size u32 | ts u64 | sid u32   │             │
//! │          │          │ barrier u32 | extension words │             │
//! └──────────┴──────────┴───────────────────────────────┴─────────────┘
//!                       └ or a single zero word when absent
//! ```
//!
//! All multi-byte fields are little-endian.

mod body_header;
mod buffer;
mod envelope;
mod ring_item;

pub use body_header::BodyHeader;
pub use buffer::INLINE_CAPACITY;
pub use envelope::{
    ByteOrder, BODY_HEADER_SLOT_SIZE, ENVELOPE_OVERHEAD, ENVELOPE_SIZE, MIN_BODY_HEADER_SIZE,
};
pub use ring_item::{BodyShape, Framing, RingItem, MAX_ITEM_SIZE};

pub(crate) use envelope::{read_u16, read_u32, read_u64, write_u32, write_u64};
