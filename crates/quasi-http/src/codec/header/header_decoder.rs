//! Decoding of quasi http header sections and their TLV frame.
//!
//! On the wire a header section is a single `hdrs` TLV frame holding the CSV
//! bytes. [`HeadersFrameDecoder`] waits for the whole frame, enforcing the
//! configured size limit as soon as the frame length is known, and leaves
//! anything after the frame in the buffer for the body decoders.

use crate::codec::tlv::{TAG_AND_LENGTH_SIZE, TAG_FOR_QUASI_HTTP_HEADERS, decode_length, decode_tag};
use crate::csv;
use crate::ensure;
use crate::protocol::{BoxError, Headers, QuasiHttpError, ReasonCode};
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

/// Parses a header section, merging its headers into `headers` and
/// returning the 4 fields of the request or status line.
///
/// Header names are lowercased. Rows with fewer than 2 values are skipped.
pub fn decode_quasi_http_headers(
    is_response: bool,
    buffer: &[u8],
    headers: &mut Headers,
) -> Result<Vec<String>, QuasiHttpError> {
    let invalid = |source: BoxError| {
        QuasiHttpError::protocol_with_source("invalid quasi http headers", ReasonCode::PROTOCOL_VIOLATION, source)
    };
    let text = std::str::from_utf8(buffer).map_err(|e| invalid(e.into()))?;
    let mut rows = csv::deserialize(text).map_err(|e| invalid(e.into()))?.into_iter();

    let Some(special_line) = rows.next() else {
        return Err(QuasiHttpError::protocol_violation("invalid quasi http headers"));
    };
    if special_line.len() < 4 {
        let kind = if is_response { "status" } else { "request" };
        return Err(QuasiHttpError::protocol_violation(format!("invalid quasi http {kind} line")));
    }

    for row in rows {
        let mut values = row.into_iter();
        let Some(name) = values.next() else { continue };
        let values: Vec<String> = values.collect();
        if values.is_empty() {
            continue;
        }
        let name = name.to_ascii_lowercase();
        for value in values {
            headers.append(name.as_str(), value);
        }
    }

    Ok(special_line)
}

/// A [`Decoder`] for the `hdrs` frame that precedes every entity.
///
/// Yields the CSV bytes of the header section once the whole frame has
/// arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadersFrameDecoder {
    max_headers_size: Option<u64>,
    frame_length: Option<usize>,
}

impl HeadersFrameDecoder {
    /// `None` leaves the header section unbounded.
    pub fn new(max_headers_size: Option<u64>) -> Self {
        Self { max_headers_size, frame_length: None }
    }
}

impl Decoder for HeadersFrameDecoder {
    type Item = Bytes;
    type Error = QuasiHttpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let length = match self.frame_length {
            Some(length) => length,
            None => {
                if src.len() < TAG_AND_LENGTH_SIZE {
                    return Ok(None);
                }
                let tag = decode_tag(src, 0)?;
                ensure!(
                    tag == TAG_FOR_QUASI_HTTP_HEADERS,
                    QuasiHttpError::protocol_violation(format!("unexpected quasi http headers tag: {tag}"))
                );
                let length = decode_length(src, 4)?;
                if let Some(max) = self.max_headers_size {
                    ensure!(
                        length as u64 <= max,
                        QuasiHttpError::message_length_limit_exceeded(format!(
                            "quasi http headers exceed max size ({length} > {max})"
                        ))
                    );
                }
                src.advance(TAG_AND_LENGTH_SIZE);
                trace!(length, "decoded headers frame header");
                self.frame_length = Some(length);
                length
            }
        };

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }
        self.frame_length = None;
        Ok(Some(src.split_to(length).freeze()))
    }
}
