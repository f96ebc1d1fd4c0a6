//! Integer literals embedded in profile strings
//!
//! Profiles may spell numbers as strings, either decimal (`"300"`) or
//! `0x`-prefixed hex (`"0x01470c00"`). Any stray character makes the whole
//! literal read as 0; there is no partial result and no overflow check.

/// Parse a decimal or `0x`/`0X` hexadecimal literal, skipping leading spaces
pub fn parse_integer(text: &str) -> u32 {
    let text = text.trim_start_matches(' ');
    let bytes = text.as_bytes();

    if bytes.len() >= 2 && bytes[0] == b'0' && (bytes[1] == b'x' || bytes[1] == b'X') {
        let mut result: u32 = 0;
        for &c in &bytes[2..] {
            let digit = match c {
                b'0'..=b'9' => c - b'0',
                b'a'..=b'f' => c - b'a' + 10,
                b'A'..=b'F' => c - b'A' + 10,
                _ => return 0,
            };
            result = result.wrapping_mul(16).wrapping_add(digit as u32);
        }
        result
    } else {
        let mut result: u32 = 0;
        for &c in bytes {
            if !c.is_ascii_digit() {
                return 0;
            }
            result = result.wrapping_mul(10).wrapping_add((c - b'0') as u32);
        }
        result
    }
}
