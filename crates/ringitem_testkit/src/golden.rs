//! Hex helpers for byte-exact assertions.

/// Encodes bytes as hexadecimal string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes hexadecimal string to bytes.
///
/// Whitespace is ignored so vectors can be grouped by field.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}

/// Asserts that `actual` equals the bytes spelled by `expected_hex`.
///
/// On mismatch both sides are printed in hex.
#[track_caller]
pub fn assert_hex_eq(actual: &[u8], expected_hex: &str) {
    let expected = hex_decode(expected_hex);
    if actual != expected.as_slice() {
        panic!(
            "Byte mismatch:\n\
             Expected ({} bytes): {}\n\
             Actual ({} bytes): {}",
            expected.len(),
            hex_encode(&expected),
            actual.len(),
            hex_encode(actual)
        );
    }
}
