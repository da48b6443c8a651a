//! Property-based test generators using proptest.
//!
//! Provides strategies for generating items, body headers, and fragments
//! that satisfy the format's invariants.

use proptest::prelude::*;
use ringitem_core::{BodyHeader, FormatVersion, ItemType};

use crate::fixtures::FragmentSpec;

/// Strategy for generating wire format versions.
pub fn format_version_strategy() -> impl Strategy<Value = FormatVersion> {
    prop_oneof![
        Just(FormatVersion::V10),
        Just(FormatVersion::V11),
        Just(FormatVersion::V12),
    ]
}

/// Strategy for generating versions that carry body headers.
pub fn slotted_version_strategy() -> impl Strategy<Value = FormatVersion> {
    prop_oneof![Just(FormatVersion::V11), Just(FormatVersion::V12)]
}

/// Strategy for generating item types, standard and user-defined.
pub fn item_type_strategy() -> impl Strategy<Value = ItemType> {
    prop_oneof![
        3 => Just(ItemType::PHYSICS_EVENT),
        1 => (1u32..=5).prop_map(ItemType::new),
        1 => prop_oneof![
            Just(ItemType::PACKET_TYPES),
            Just(ItemType::MONITORED_VARIABLES),
            Just(ItemType::PERIODIC_SCALERS),
            Just(ItemType::PHYSICS_EVENT_COUNT),
        ],
        1 => (ItemType::FIRST_USER_ITEM_CODE.as_u32()..=0xFFFF).prop_map(ItemType::new),
    ]
}

/// Strategy for generating item bodies.
pub fn body_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..max_len)
}

/// Strategy for generating body headers, some with extension words.
pub fn body_header_strategy() -> impl Strategy<Value = BodyHeader> {
    (
        any::<u64>(),
        any::<u32>(),
        0u32..4,
        prop::collection::vec(any::<u8>(), 0..3),
    )
        .prop_map(|(timestamp, source_id, barrier, words)| {
            let extension = words.into_iter().flat_map(|w| [w; 4]).collect();
            BodyHeader::new(timestamp, source_id, barrier).with_extension(extension)
        })
}

/// Strategy for generating a single fragment.
pub fn fragment_spec_strategy(max_body: usize) -> impl Strategy<Value = FragmentSpec> {
    (any::<u64>(), any::<u32>(), 0u32..2, body_strategy(max_body)).prop_map(
        |(timestamp, source_id, barrier, body)| FragmentSpec {
            timestamp,
            source_id,
            barrier,
            body,
        },
    )
}

/// Strategy for generating the fragments of a built event.
pub fn fragments_strategy(max_fragments: usize) -> impl Strategy<Value = Vec<FragmentSpec>> {
    prop::collection::vec(fragment_spec_strategy(64), 0..max_fragments)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
