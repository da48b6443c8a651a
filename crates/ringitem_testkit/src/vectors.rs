//! Test vectors for the ring item wire formats.
//!
//! These vectors pin the byte layout so other implementations of the format
//! can check themselves against this one. Hex strings are grouped by field.

use ringitem_core::{FormatVersion, FragmentIndex};
use serde::{Deserialize, Serialize};

use crate::golden::{hex_decode, hex_encode};

/// A test vector that can be shared across implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Major wire format version used to decode the input.
    pub version: u16,
    /// Input data (hex-encoded).
    pub input_hex: String,
    /// Expected output data (hex-encoded).
    pub expected_hex: String,
    /// Expected error message (if this should fail).
    pub expected_error: Option<String>,
}

impl TestVector {
    fn ok(id: &str, description: &str, version: u16, input_hex: &str, expected_hex: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            version,
            input_hex: input_hex.into(),
            expected_hex: expected_hex.into(),
            expected_error: None,
        }
    }

    fn err(id: &str, description: &str, version: u16, input_hex: &str, error: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            version,
            input_hex: input_hex.into(),
            expected_hex: String::new(),
            expected_error: Some(error.into()),
        }
    }
}

/// Item decoding vectors: input is an encoded item, expected output is its
/// body.
pub fn item_vectors() -> Vec<TestVector> {
    vec![
        TestVector::ok(
            "v11_physics_no_header",
            "v11 physics event, no body header, 10 body bytes",
            11,
            "16000000 1e000000 00000000 00010203040506070809",
            "00010203040506070809",
        ),
        TestVector::ok(
            "v11_physics_with_header",
            "v11 physics event with body header ts=0x1234567890 sid=2 barrier=1",
            11,
            "26000000 1e000000 14000000 9078563412000000 02000000 01000000 00010203040506070809",
            "00010203040506070809",
        ),
        TestVector::ok(
            "v11_extended_header",
            "v11 body header with one extension word",
            11,
            "22000000 1e000000 18000000 0500000000000000 01000000 00000000 deadbeef 0102",
            "0102",
        ),
        TestVector::ok(
            "v10_physics",
            "v10 physics event, body follows the envelope",
            10,
            "0c000000 1e000000 01020304",
            "01020304",
        ),
        TestVector::ok(
            "v12_ring_format",
            "v12 ring format item announcing 12.0",
            12,
            "10000000 0c000000 00000000 0c000000",
            "0c000000",
        ),
        TestVector::ok(
            "v11_foreign_endian",
            "big-endian producer; body bytes kept verbatim",
            11,
            "00000010 0000001e 00000000 aabbccdd",
            "aabbccdd",
        ),
        TestVector::err(
            "truncated_item",
            "declared size exceeds the input",
            11,
            "16000000 1e000000 00000000 0001",
            "insufficient data",
        ),
        TestVector::err(
            "undersized_body_header",
            "body header size word below the minimum",
            11,
            "10000000 1e000000 08000000 00000000",
            "invalid item format",
        ),
        TestVector::err(
            "size_below_envelope",
            "declared size smaller than the envelope",
            11,
            "04000000 1e000000",
            "invalid item format",
        ),
    ]
}

/// Built event vectors: input is a built event body, expected output is the
/// concatenated bodies of the embedded items.
pub fn fragment_vectors() -> Vec<TestVector> {
    vec![
        TestVector::ok(
            "built_event_empty",
            "built event with no fragments",
            11,
            "04000000",
            "",
        ),
        TestVector::ok(
            "built_event_one_fragment",
            "one fragment holding a v11 physics event with body 'abcd'",
            11,
            "38000000 \
             0a00000000000000 01000000 20000000 00000000 \
             20000000 1e000000 14000000 0a00000000000000 01000000 00000000 61626364",
            "61626364",
        ),
        TestVector::ok(
            "built_event_two_fragments",
            "second fragment's item has no body header",
            11,
            "5a000000 \
             0a00000000000000 01000000 20000000 00000000 \
             20000000 1e000000 14000000 0a00000000000000 01000000 00000000 61626364 \
             0b00000000000000 02000000 0e000000 00000000 \
             0e000000 1e000000 00000000 6566",
            "61626364 6566",
        ),
        TestVector::err(
            "built_event_truncated",
            "last fragment's payload cut short",
            11,
            "37000000 \
             0a00000000000000 01000000 20000000 00000000 \
             20000000 1e000000 14000000 0a00000000000000 01000000 00000000 616263",
            "insufficient data",
        ),
    ]
}

/// Checks an item decoding vector against this implementation.
///
/// # Errors
///
/// Returns a description of the mismatch.
pub fn verify_item_vector(vector: &TestVector) -> Result<(), String> {
    let version = FormatVersion::from_major(vector.version)
        .ok_or_else(|| format!("{}: unknown version {}", vector.id, vector.version))?;
    let input = hex_decode(&vector.input_hex);
    let outcome = version.decode(&input).map(|item| item.body().to_vec());
    check_outcome(vector, outcome.map_err(|e| e.to_string()))
}

/// Checks a built event vector against this implementation.
///
/// # Errors
///
/// Returns a description of the mismatch.
pub fn verify_fragment_vector(vector: &TestVector) -> Result<(), String> {
    let input = hex_decode(&vector.input_hex);
    let mut index = FragmentIndex::new();
    let outcome = index.index_body(&input).map(|fragments| {
        fragments
            .iter()
            .flat_map(|f| f.item_body.iter().copied())
            .collect::<Vec<u8>>()
    });
    check_outcome(vector, outcome.map_err(|e| e.to_string()))
}

fn check_outcome(vector: &TestVector, outcome: Result<Vec<u8>, String>) -> Result<(), String> {
    match (&vector.expected_error, outcome) {
        (None, Ok(actual)) => {
            let expected = hex_decode(&vector.expected_hex);
            if actual == expected {
                Ok(())
            } else {
                Err(format!(
                    "{}: expected {}, got {}",
                    vector.id,
                    hex_encode(&expected),
                    hex_encode(&actual)
                ))
            }
        }
        (None, Err(e)) => Err(format!("{}: unexpected error: {e}", vector.id)),
        (Some(expected), Ok(_)) => Err(format!("{}: expected error '{expected}'", vector.id)),
        (Some(expected), Err(e)) if e.contains(expected.as_str()) => Ok(()),
        (Some(expected), Err(e)) => Err(format!(
            "{}: expected error '{expected}', got '{e}'",
            vector.id
        )),
    }
}

/// Generate all test vectors as JSON for cross-implementation use.
pub fn all_vectors_json() -> String {
    let vectors = AllTestVectors {
        items: item_vectors(),
        fragments: fragment_vectors(),
    };

    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[derive(Debug, Serialize, Deserialize)]
struct AllTestVectors {
    items: Vec<TestVector>,
    fragments: Vec<TestVector>,
}
