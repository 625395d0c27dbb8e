//! Tag-length-value framing primitives.
//!
//! Every frame starts with an 8 byte header: a big-endian 32-bit tag, which
//! must be positive, followed by a big-endian 32-bit length, which must not
//! be negative. The length counts the payload bytes that follow the header.

use crate::codec::number::{deserialize_int32_be, serialize_int32_be};
use crate::protocol::StreamError;
use crate::ensure;

/// Tag of the frame carrying an encoded header section (`hdrs`).
pub const TAG_FOR_QUASI_HTTP_HEADERS: i32 = 0x6864_7273;

/// Tag of the frames carrying body data (`bdta`).
pub const TAG_FOR_QUASI_HTTP_BODY_CHUNK: i32 = 0x6264_7461;

/// Tag of frames a body decoder skips over (`bext`).
pub const TAG_FOR_QUASI_HTTP_BODY_CHUNK_EXT: i32 = 0x6265_7874;

/// Size of an encoded tag and length pair.
pub const TAG_AND_LENGTH_SIZE: usize = 8;

/// Encodes a frame header.
pub fn encode_tag_and_length(tag: i32, length: i32) -> Result<[u8; TAG_AND_LENGTH_SIZE], StreamError> {
    ensure!(tag > 0, StreamError::InvalidTag(tag));
    ensure!(length >= 0, StreamError::InvalidLength(i64::from(length)));

    let mut header = [0u8; TAG_AND_LENGTH_SIZE];
    header[..4].copy_from_slice(&serialize_int32_be(tag));
    header[4..].copy_from_slice(&serialize_int32_be(length));
    Ok(header)
}

/// Encodes the `(tag, 0)` frame that terminates a chunk stream.
pub fn end_of_tlv_stream(tag: i32) -> Result<[u8; TAG_AND_LENGTH_SIZE], StreamError> {
    encode_tag_and_length(tag, 0)
}

/// Decodes the tag of a frame header found at `offset`.
pub fn decode_tag(data: &[u8], offset: usize) -> Result<i32, StreamError> {
    let tag = deserialize_int32_be(data, offset).ok_or(StreamError::UnexpectedEndOfRead)?;
    ensure!(tag > 0, StreamError::InvalidTag(tag));
    Ok(tag)
}

/// Decodes the length of a frame header whose length field is at `offset`.
pub fn decode_length(data: &[u8], offset: usize) -> Result<usize, StreamError> {
    let length = deserialize_int32_be(data, offset).ok_or(StreamError::UnexpectedEndOfRead)?;
    usize::try_from(length).map_err(|_| StreamError::InvalidLength(i64::from(length)))
}
