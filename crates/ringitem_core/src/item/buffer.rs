//! Backing storage for a ring item.

use crate::error::{CoreError, CoreResult};
use ringitem_storage::Reservation;

/// Items whose capacity fits here are stored inline without allocating.
pub const INLINE_CAPACITY: usize = 8192;

/// Where an item's bytes live.
#[allow(clippy::large_enum_variant)]
pub(crate) enum ItemBuffer<'a> {
    /// Fixed inline array.
    Inline([u8; INLINE_CAPACITY]),
    /// Heap allocation, `len()` is the usable capacity.
    Heap(Vec<u8>),
    /// Region reserved inside a destination sink.
    InPlace(Reservation<'a>),
}

impl<'a> ItemBuffer<'a> {
    /// Allocates owned storage of at least `capacity` bytes.
    pub(crate) fn owned(capacity: usize) -> CoreResult<Self> {
        if capacity <= INLINE_CAPACITY {
            return Ok(Self::Inline([0u8; INLINE_CAPACITY]));
        }
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)?;
        data.resize(capacity, 0);
        Ok(Self::Heap(data))
    }

    /// Usable bytes.
    pub(crate) fn capacity(&self) -> usize {
        match self {
            Self::Inline(buf) => buf.len(),
            Self::Heap(data) => data.len(),
            Self::InPlace(reservation) => reservation.len(),
        }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Self::Inline(buf) => buf,
            Self::Heap(data) => data,
            Self::InPlace(reservation) => reservation.as_slice(),
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Self::Inline(buf) => buf,
            Self::Heap(data) => data,
            Self::InPlace(reservation) => reservation.as_mut_slice(),
        }
    }

    pub(crate) fn is_in_place(&self) -> bool {
        matches!(self, Self::InPlace(_))
    }

    /// Makes room for at least `needed` bytes, keeping the first `used`.
    ///
    /// Inline storage moves to the heap when it overflows. Reserved regions
    /// cannot grow.
    pub(crate) fn ensure_capacity(&mut self, needed: usize, used: usize) -> CoreResult<()> {
        if needed <= self.capacity() {
            return Ok(());
        }
        match self {
            Self::Inline(buf) => {
                let mut data = Vec::new();
                data.try_reserve_exact(grown(needed))?;
                data.extend_from_slice(&buf[..used]);
                data.resize(grown(needed), 0);
                *self = Self::Heap(data);
                Ok(())
            }
            Self::Heap(data) => {
                let target = grown(needed);
                data.try_reserve_exact(target - data.len())?;
                data.resize(target, 0);
                Ok(())
            }
            Self::InPlace(reservation) => Err(CoreError::field_too_large(
                "in-place item",
                needed,
                reservation.len(),
            )),
        }
    }

    /// Gives up the reservation, if any, so it can be committed.
    pub(crate) fn into_reservation(self) -> Option<Reservation<'a>> {
        match self {
            Self::InPlace(reservation) => Some(reservation),
            Self::Inline(_) | Self::Heap(_) => None,
        }
    }
}

/// Next heap capacity for `needed` bytes.
fn grown(needed: usize) -> usize {
    needed.max(INLINE_CAPACITY).next_power_of_two()
}
