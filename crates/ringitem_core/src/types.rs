//! Core type definitions for ring items.

use std::fmt;

/// Timestamp value meaning "no timestamp was assigned".
pub const NULL_TIMESTAMP: u64 = u64::MAX;

/// Type code stored in the envelope of every ring item.
///
/// Only the low 16 bits are significant. The code is widened to 32 bits on
/// the wire so a reader can tell a foreign-endian producer from the
/// always-zero high half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemType(pub u32);

impl ItemType {
    /// Start of a run.
    pub const BEGIN_RUN: Self = Self(1);
    /// End of a run.
    pub const END_RUN: Self = Self(2);
    /// Run paused.
    pub const PAUSE_RUN: Self = Self(3);
    /// Run resumed.
    pub const RESUME_RUN: Self = Self(4);
    /// Run ended without a clean end-run.
    pub const ABNORMAL_ENDRUN: Self = Self(5);
    /// Documentation of packet types.
    pub const PACKET_TYPES: Self = Self(10);
    /// Monitored variable values.
    pub const MONITORED_VARIABLES: Self = Self(11);
    /// Announces the wire format version of the stream.
    pub const RING_FORMAT: Self = Self(12);
    /// Periodic scaler readout.
    pub const PERIODIC_SCALERS: Self = Self(20);
    /// Physics event data.
    pub const PHYSICS_EVENT: Self = Self(30);
    /// Running count of physics events.
    pub const PHYSICS_EVENT_COUNT: Self = Self(31);
    /// A single event-builder fragment.
    pub const EVB_FRAGMENT: Self = Self(40);
    /// Event-builder fragment whose payload is not a ring item.
    pub const EVB_UNKNOWN_PAYLOAD: Self = Self(41);
    /// Event-builder glom parameters.
    pub const EVB_GLOM_INFO: Self = Self(42);
    /// First code available to user-defined items.
    pub const FIRST_USER_ITEM_CODE: Self = Self(32768);

    /// Creates an item type from its raw code.
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Returns the raw code.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns `true` for user-defined codes.
    #[must_use]
    pub const fn is_user(self) -> bool {
        self.0 >= Self::FIRST_USER_ITEM_CODE.0
    }

    /// Returns `true` for begin/end/pause/resume items.
    #[must_use]
    pub const fn is_state_change(self) -> bool {
        matches!(self.0, 1..=5)
    }

    /// Returns a human-readable name for the type.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::BEGIN_RUN => "Begin Run",
            Self::END_RUN => "End Run",
            Self::PAUSE_RUN => "Pause Run",
            Self::RESUME_RUN => "Resume Run",
            Self::ABNORMAL_ENDRUN => "Abnormal End Run",
            Self::PACKET_TYPES => "Packet Types",
            Self::MONITORED_VARIABLES => "Monitored Variables",
            Self::RING_FORMAT => "Ring Format",
            Self::PERIODIC_SCALERS => "Scalers",
            Self::PHYSICS_EVENT => "Physics Event",
            Self::PHYSICS_EVENT_COUNT => "Physics Event Count",
            Self::EVB_FRAGMENT => "Event Builder Fragment",
            Self::EVB_UNKNOWN_PAYLOAD => "Event Builder Unknown Payload",
            Self::EVB_GLOM_INFO => "Glom Parameters",
            t if t.is_user() => "User Item",
            _ => "Unknown",
        }
    }
}

impl From<u32> for ItemType {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// Wire format generation of a ring item stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatVersion {
    /// No body headers.
    V10,
    /// Optional body headers.
    V11,
    /// Optional body headers plus a body-stored original source id.
    V12,
}

impl FormatVersion {
    /// Major version number announced in ring format items.
    #[must_use]
    pub const fn major(self) -> u16 {
        match self {
            Self::V10 => 10,
            Self::V11 => 11,
            Self::V12 => 12,
        }
    }

    /// Looks up a version from its major number.
    #[must_use]
    pub const fn from_major(major: u16) -> Option<Self> {
        match major {
            10 => Some(Self::V10),
            11 => Some(Self::V11),
            12 => Some(Self::V12),
            _ => None,
        }
    }

    /// Returns `true` if items of this version can carry a body header.
    #[must_use]
    pub const fn has_body_headers(self) -> bool {
        !matches!(self, Self::V10)
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.major())
    }
}
