//! Event-builder fragments: layout, indexing, and pooled allocation.
//!
//! A built event's body is a 4-byte byte count followed by fragments, each a
//! fixed header and a payload that is itself a complete ring item:
//!
//! ```text
//! | total u32 | fragment header (20) | payload | fragment header (20) | payload | ...
//! ```

mod header;
mod index;
mod pool;

pub use header::{write_fragment, BuiltEventWriter, FragmentHeader, BODY_PREFIX_SIZE};
pub use index::{index_fragments, FragmentDescriptor, FragmentIndex};
pub use pool::{size_class, Fragment, FragmentPool, FreeLists, LockMode, Locked, PoolStats, Unlocked};
