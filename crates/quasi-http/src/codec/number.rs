//! Fixed-width integer helpers used by the TLV framing and header decoding.

use crate::protocol::IntegerParseError;

const INT48_MIN: i64 = -140_737_488_355_328;
const INT48_MAX: i64 = 140_737_488_355_327;

/// Writes `v` as 4 big-endian bytes.
pub fn serialize_int32_be(v: i32) -> [u8; 4] {
    v.to_be_bytes()
}

/// Reads a signed big-endian 32-bit integer from `src[offset..offset + 4]`.
///
/// Returns `None` if fewer than 4 bytes are available at `offset`.
pub fn deserialize_int32_be(src: &[u8], offset: usize) -> Option<i32> {
    let bytes = src.get(offset..offset.checked_add(4)?)?;
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    Some(i32::from_be_bytes(buf))
}

/// Accepts surrounding whitespace, an optional sign and 1 to 20 digits.
fn parse_digits(input: &str) -> Result<(i128, &str), IntegerParseError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || digits.len() > 20 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IntegerParseError::InvalidInput(trimmed.to_owned()));
    }
    // at most 20 digits always fits
    let n = trimmed
        .parse::<i128>()
        .map_err(|_| IntegerParseError::InvalidInput(trimmed.to_owned()))?;
    Ok((n, trimmed))
}

/// Parses a decimal integer restricted to the signed 32-bit range.
pub fn parse_int32(input: &str) -> Result<i32, IntegerParseError> {
    let (n, trimmed) = parse_digits(input)?;
    i32::try_from(n).map_err(|_| IntegerParseError::OutOfRange32(trimmed.to_owned()))
}

/// Parses a decimal integer restricted to the signed 48-bit range.
pub fn parse_int48(input: &str) -> Result<i64, IntegerParseError> {
    let (n, trimmed) = parse_digits(input)?;
    i64::try_from(n)
        .ok()
        .filter(|n| (INT48_MIN..=INT48_MAX).contains(n))
        .ok_or_else(|| IntegerParseError::OutOfRange48(trimmed.to_owned()))
}
