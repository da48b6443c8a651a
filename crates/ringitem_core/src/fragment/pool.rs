//! Reusable block pool for event-builder fragments.
//!
//! Building events allocates and frees a header and a payload block for
//! every fragment. The pool keeps released blocks on free lists instead of
//! returning them to the allocator:
//!
//! - one free list of header blocks
//! - one free list of payload blocks per size class, where a block of class
//!   `c` holds `1 << c` bytes
//!
//! Free lists are never shrunk by `release`; only [`FragmentPool::reset`]
//! gives memory back.
//!
//! ## Locking
//!
//! Whether the free lists are guarded is chosen when the pool is built, by
//! its type parameter:
//!
//! - [`FragmentPool<Locked>`]: one mutex around all free lists, shareable
//!   between threads
//! - [`FragmentPool<Unlocked>`]: no synchronization, single thread only

use std::cell::RefCell;
use std::fmt;
use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::PoolConfig;
use crate::error::{CoreError, CoreResult};
use crate::fragment::header::{write_fragment, FragmentHeader};

/// Size class for a payload of `len` bytes: the index of its highest set bit
/// plus one.
///
/// A block of the returned class always has room for `len` bytes.
#[must_use]
pub const fn size_class(len: usize) -> usize {
    (usize::BITS - len.leading_zeros()) as usize
}

/// Capacity of a block in `class`.
fn class_capacity(class: usize) -> CoreResult<usize> {
    u32::try_from(class)
        .ok()
        .and_then(|shift| 1usize.checked_shl(shift))
        .ok_or_else(|| CoreError::field_too_large("fragment payload", class, usize::BITS as usize))
}

/// A fragment checked out of a pool.
///
/// Hand it back with [`FragmentPool::release`] to make its blocks reusable;
/// dropping it frees them instead.
#[derive(Debug)]
pub struct Fragment {
    header: Box<FragmentHeader>,
    block: Vec<u8>,
}

impl Fragment {
    /// The fragment header.
    #[must_use]
    pub fn header(&self) -> &FragmentHeader {
        &self.header
    }

    /// The payload, `header().payload_size` bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.block[..self.header.payload_size as usize]
    }

    /// The payload, writable.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let len = self.header.payload_size as usize;
        &mut self.block[..len]
    }

    /// Capacity of the underlying payload block.
    #[must_use]
    pub fn block_capacity(&self) -> usize {
        self.block.len()
    }

    /// Appends the encoded fragment to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Allocation`] if `out` cannot grow.
    pub fn write_to(&self, out: &mut Vec<u8>) -> CoreResult<()> {
        write_fragment(out, &self.header, self.payload())
    }
}

/// Snapshot of a pool's free lists and counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Header blocks waiting on the free list.
    pub free_headers: usize,
    /// Payload blocks waiting on each size class free list.
    pub free_blocks_per_class: Vec<usize>,
    /// Blocks obtained from the allocator.
    pub fresh_allocations: u64,
    /// Blocks served from a free list.
    pub reuses: u64,
}

/// Free lists and counters shared by both locking modes.
#[derive(Debug, Default)]
pub struct FreeLists {
    headers: Vec<Box<FragmentHeader>>,
    blocks: Vec<Vec<Vec<u8>>>,
    fresh_allocations: u64,
    reuses: u64,
}

impl FreeLists {
    fn take_header(&mut self, template: &FragmentHeader) -> Box<FragmentHeader> {
        match self.headers.pop() {
            Some(mut header) => {
                self.reuses += 1;
                *header = *template;
                header
            }
            None => {
                trace!("allocating fresh fragment header block");
                self.fresh_allocations += 1;
                Box::new(*template)
            }
        }
    }

    fn take_block(&mut self, class: usize) -> CoreResult<Vec<u8>> {
        if self.blocks.len() <= class {
            self.blocks.resize_with(class + 1, Vec::new);
        }
        if let Some(block) = self.blocks[class].pop() {
            self.reuses += 1;
            return Ok(block);
        }

        let capacity = class_capacity(class)?;
        trace!(class, capacity, "allocating fresh payload block");
        let mut block = Vec::new();
        block.try_reserve_exact(capacity)?;
        block.resize(capacity, 0);
        self.fresh_allocations += 1;
        Ok(block)
    }

    fn put_back(&mut self, fragment: Fragment) {
        let Fragment { header, block } = fragment;
        let class = block.len().trailing_zeros() as usize;
        if self.blocks.len() <= class {
            self.blocks.resize_with(class + 1, Vec::new);
        }
        self.blocks[class].push(block);
        self.headers.push(header);
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            free_headers: self.headers.len(),
            free_blocks_per_class: self.blocks.iter().map(Vec::len).collect(),
            fresh_allocations: self.fresh_allocations,
            reuses: self.reuses,
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// How a pool guards its free lists.
///
/// Implemented by [`Locked`] and [`Unlocked`] only.
pub trait LockMode: sealed::Sealed {
    /// Storage wrapping the free lists.
    type Guard: Default;

    /// Runs `f` with exclusive access to the free lists.
    fn with<R>(guard: &Self::Guard, f: impl FnOnce(&mut FreeLists) -> R) -> R;
}

/// All free lists behind one mutex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Locked;

/// No synchronization; the pool stays on one thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlocked;

impl sealed::Sealed for Locked {}
impl sealed::Sealed for Unlocked {}

impl LockMode for Locked {
    type Guard = Mutex<FreeLists>;

    fn with<R>(guard: &Self::Guard, f: impl FnOnce(&mut FreeLists) -> R) -> R {
        f(&mut guard.lock())
    }
}

impl LockMode for Unlocked {
    type Guard = RefCell<FreeLists>;

    fn with<R>(guard: &Self::Guard, f: impl FnOnce(&mut FreeLists) -> R) -> R {
        f(&mut guard.borrow_mut())
    }
}

/// Pool of fragment header and payload blocks.
///
/// # Example
///
/// ```rust
/// use ringitem_core::{FragmentHeader, FragmentPool, Unlocked};
///
/// let pool = FragmentPool::<Unlocked>::new();
/// let first = pool.allocate(&FragmentHeader::new(1, 2, 100, 0)).unwrap();
/// let block = first.payload().as_ptr();
/// pool.release(first);
///
/// let second = pool.allocate(&FragmentHeader::new(3, 4, 100, 0)).unwrap();
/// assert_eq!(second.payload().as_ptr(), block);
/// ```
pub struct FragmentPool<L: LockMode = Locked> {
    lists: L::Guard,
}

impl<L: LockMode> fmt::Debug for FragmentPool<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentPool")
            .field("stats", &self.stats())
            .finish()
    }
}

impl<L: LockMode> Default for FragmentPool<L> {
    fn default() -> Self {
        Self {
            lists: L::Guard::default(),
        }
    }
}

impl<L: LockMode> FragmentPool<L> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool, warming the header free list as configured.
    #[must_use]
    pub fn with_config(config: PoolConfig) -> Self {
        let pool = Self::new();
        L::with(&pool.lists, |lists| {
            lists.headers.reserve(config.preallocate_headers);
            for _ in 0..config.preallocate_headers {
                lists.headers.push(Box::default());
            }
        });
        pool
    }

    /// Checks out a fragment described by `header`.
    ///
    /// The payload block comes from the size class of `header.payload_size`.
    /// Its contents are whatever the previous owner left there.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Allocation`] if a fresh block cannot be allocated.
    pub fn allocate(&self, header: &FragmentHeader) -> CoreResult<Fragment> {
        let class = size_class(header.payload_size as usize);
        L::with(&self.lists, |lists| {
            let block = lists.take_block(class)?;
            let header = lists.take_header(header);
            Ok(Fragment { header, block })
        })
    }

    /// Checks out a fragment and copies `payload` into it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `payload` does not match the
    /// header's payload size, or [`CoreError::Allocation`].
    pub fn allocate_with_payload(&self, header: &FragmentHeader, payload: &[u8]) -> CoreResult<Fragment> {
        if header.payload_size as usize != payload.len() {
            return Err(CoreError::invalid_argument(format!(
                "fragment header declares {} payload bytes but {} were given",
                header.payload_size,
                payload.len()
            )));
        }
        let mut fragment = self.allocate(header)?;
        fragment.payload_mut().copy_from_slice(payload);
        Ok(fragment)
    }

    /// Returns a fragment's blocks to the free lists.
    pub fn release(&self, fragment: Fragment) {
        L::with(&self.lists, |lists| lists.put_back(fragment));
    }

    /// Frees every pooled block and clears the counters.
    pub fn reset(&self) {
        L::with(&self.lists, |lists| {
            debug!(
                headers = lists.headers.len(),
                blocks = lists.blocks.iter().map(Vec::len).sum::<usize>(),
                "resetting fragment pool"
            );
            *lists = FreeLists::default();
        });
    }

    /// Snapshot of the free lists and counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        L::with(&self.lists, |lists| lists.stats())
    }
}

impl FragmentPool<Locked> {
    /// The process-wide pool, created on first use.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<FragmentPool<Locked>> = OnceLock::new();
        GLOBAL.get_or_init(FragmentPool::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(payload_size: u32) -> FragmentHeader {
        FragmentHeader::new(1, 2, payload_size, 0)
    }

    #[test]
    fn size_class_is_highest_bit_plus_one() {
        assert_eq!(size_class(0), 0);
        assert_eq!(size_class(1), 1);
        assert_eq!(size_class(2), 2);
        assert_eq!(size_class(3), 2);
        assert_eq!(size_class(64), 7);
        assert_eq!(size_class(100), 7);
        assert_eq!(size_class(128), 8);
    }

    #[test]
    fn block_fits_payload() {
        for len in [0usize, 1, 7, 8, 100, 4096, 5000] {
            let capacity = class_capacity(size_class(len)).unwrap();
            assert!(capacity > len, "{len} does not fit {capacity}");
        }
    }

    #[test]
    fn release_then_allocate_reuses_block() {
        let pool = FragmentPool::<Unlocked>::new();
        let first = pool.allocate(&header(100)).unwrap();
        let block = first.payload().as_ptr();
        assert_eq!(first.block_capacity(), 128);
        pool.release(first);

        let second = pool.allocate(&header(100)).unwrap();
        assert_eq!(second.payload().as_ptr(), block);
        assert_eq!(second.payload().len(), 100);

        let stats = pool.stats();
        assert_eq!(stats.fresh_allocations, 2);
        assert_eq!(stats.reuses, 2);
    }

    #[test]
    fn same_class_different_size_reuses_block() {
        let pool = FragmentPool::<Unlocked>::new();
        let first = pool.allocate(&header(70)).unwrap();
        let block = first.payload().as_ptr();
        pool.release(first);

        let second = pool.allocate(&header(120)).unwrap();
        assert_eq!(second.payload().as_ptr(), block);
    }

    #[test]
    fn other_class_gets_fresh_block() {
        let pool = FragmentPool::<Unlocked>::new();
        let first = pool.allocate(&header(100)).unwrap();
        pool.release(first);

        let second = pool.allocate(&header(300)).unwrap();
        assert_eq!(second.block_capacity(), 512);
        let stats = pool.stats();
        assert_eq!(stats.free_blocks_per_class[7], 1);
        assert_eq!(stats.free_headers, 0);
    }

    #[test]
    fn header_fields_are_copied() {
        let pool = FragmentPool::<Unlocked>::new();
        let fragment = pool.allocate(&FragmentHeader::new(9, 8, 7, 6)).unwrap();
        assert_eq!(*fragment.header(), FragmentHeader::new(9, 8, 7, 6));
        pool.release(fragment);

        let fragment = pool.allocate(&FragmentHeader::new(1, 1, 1, 0)).unwrap();
        assert_eq!(*fragment.header(), FragmentHeader::new(1, 1, 1, 0));
    }

    #[test]
    fn allocate_with_payload_writes_fragment() {
        let pool = FragmentPool::<Unlocked>::new();
        let fragment = pool
            .allocate_with_payload(&FragmentHeader::new(5, 6, 3, 0), b"abc")
            .unwrap();
        assert_eq!(fragment.payload(), b"abc");

        let mut out = Vec::new();
        fragment.write_to(&mut out).unwrap();
        assert_eq!(out.len(), FragmentHeader::SIZE + 3);
        assert_eq!(&out[FragmentHeader::SIZE..], b"abc");

        assert!(matches!(
            pool.allocate_with_payload(&FragmentHeader::new(5, 6, 4, 0), b"abc"),
            Err(CoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn reset_empties_free_lists() {
        let pool = FragmentPool::<Unlocked>::new();
        let fragment = pool.allocate(&header(10)).unwrap();
        pool.release(fragment);
        assert_eq!(pool.stats().free_headers, 1);

        pool.reset();
        assert_eq!(pool.stats(), PoolStats::default());
    }

    #[test]
    fn preallocated_headers_are_used_first() {
        let pool = FragmentPool::<Unlocked>::with_config(PoolConfig::new().preallocate_headers(4));
        assert_eq!(pool.stats().free_headers, 4);

        let fragment = pool.allocate(&header(0)).unwrap();
        assert_eq!(pool.stats().free_headers, 3);
        assert_eq!(fragment.payload().len(), 0);
    }

    #[test]
    fn locked_pool_is_shared_between_threads() {
        let pool = FragmentPool::<Locked>::new();
        std::thread::scope(|scope| {
            for t in 0..4u32 {
                let pool = &pool;
                scope.spawn(move || {
                    for i in 0..100u32 {
                        let fragment = pool.allocate(&FragmentHeader::new(0, t, i, 0)).unwrap();
                        assert_eq!(fragment.header().source_id, t);
                        pool.release(fragment);
                    }
                });
            }
        });

        let stats = pool.stats();
        assert_eq!(stats.fresh_allocations + stats.reuses, 800);
    }

    #[test]
    fn global_pool_is_a_singleton() {
        let a: *const FragmentPool<Locked> = FragmentPool::global();
        let b: *const FragmentPool<Locked> = FragmentPool::global();
        assert_eq!(a, b);
    }
}
