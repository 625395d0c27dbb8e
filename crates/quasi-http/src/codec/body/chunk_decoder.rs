//! Decoding of TLV chunked bodies.
//!
//! A chunked body is a run of `(tag, length, payload)` frames. Frames with
//! the expected tag carry body data; the stream ends at the first frame with
//! the expected tag and a zero length. A frame with the ignorable tag may
//! precede each run of expected frames, and its payload is skipped.
//!
//! Frame headers and payloads may straddle read boundaries arbitrarily.

use crate::codec::tlv::{TAG_AND_LENGTH_SIZE, decode_length, decode_tag};
use crate::io::{ChunkRead, Unread};
use crate::protocol::{PayloadItem, StreamError};
use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use std::io;
use tokio_util::codec::Decoder;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Waiting for a complete 8 byte frame header.
    AwaitingHeader,
    /// Inside the payload of a frame; `discard` is set for ignorable frames.
    StreamingPayload { remaining: usize, discard: bool },
    /// The terminating frame was seen.
    Done,
}

/// A [`Decoder`] turning TLV frames back into body chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyChunkDecoder {
    expected_tag: i32,
    ignorable_tag: Option<i32>,
    state: DecodeState,
    last_tag_seen_is_expected: bool,
}

impl BodyChunkDecoder {
    pub fn new(expected_tag: i32, ignorable_tag: Option<i32>) -> Self {
        Self { expected_tag, ignorable_tag, state: DecodeState::AwaitingHeader, last_tag_seen_is_expected: true }
    }

    pub fn is_done(&self) -> bool {
        self.state == DecodeState::Done
    }

    fn decode_header(&mut self, src: &mut BytesMut) -> Result<Option<DecodeState>, StreamError> {
        if src.len() < TAG_AND_LENGTH_SIZE {
            return Ok(None);
        }
        let tag = decode_tag(src, 0)?;
        let length = decode_length(src, 4)?;

        let ignorable = self.last_tag_seen_is_expected && Some(tag) == self.ignorable_tag;
        if !ignorable && tag != self.expected_tag {
            return Err(StreamError::UnexpectedTag { expected: self.expected_tag, found: tag });
        }
        self.last_tag_seen_is_expected = tag == self.expected_tag;
        src.advance(TAG_AND_LENGTH_SIZE);
        trace!(tag, length, "decoded chunk header");

        if self.last_tag_seen_is_expected && length == 0 {
            return Ok(Some(DecodeState::Done));
        }
        Ok(Some(DecodeState::StreamingPayload { remaining: length, discard: !self.last_tag_seen_is_expected }))
    }
}

impl Decoder for BodyChunkDecoder {
    type Item = PayloadItem;
    type Error = io::Error;

    /// Returns `Chunk` for each piece of body data, `Eof` once the terminating
    /// frame is consumed, or `None` when more input is needed. Input past the
    /// terminating frame is left in `src`.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                DecodeState::Done => return Ok(Some(PayloadItem::Eof)),
                DecodeState::AwaitingHeader => match self.decode_header(src)? {
                    Some(next) => self.state = next,
                    None => return Ok(None),
                },
                DecodeState::StreamingPayload { remaining: 0, .. } => {
                    self.state = DecodeState::AwaitingHeader;
                }
                DecodeState::StreamingPayload { remaining, discard } => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    let len = remaining.min(src.len());
                    let bytes = src.split_to(len).freeze();
                    self.state = DecodeState::StreamingPayload { remaining: remaining - len, discard };
                    if !discard {
                        return Ok(Some(PayloadItem::Chunk(bytes)));
                    }
                    trace!(len, "skipped ignorable chunk bytes");
                }
            }
        }
    }
}

/// Reads a chunked body off a backing stream.
///
/// Bytes read past the terminating frame are pushed back onto the backing
/// stream. Reaching the end of the backing stream before the terminating
/// frame is an error.
#[derive(Debug)]
pub struct BodyChunkDecodingReader<R> {
    backing: R,
    decoder: BodyChunkDecoder,
    buffer: BytesMut,
    done: bool,
}

impl<R: Unread> BodyChunkDecodingReader<R> {
    pub fn new(backing: R, expected_tag: i32, ignorable_tag: Option<i32>) -> Self {
        Self::with_prefix(backing, expected_tag, ignorable_tag, Bytes::new())
    }

    /// `prefix` holds bytes already taken off `backing`; they are decoded
    /// first.
    pub fn with_prefix(backing: R, expected_tag: i32, ignorable_tag: Option<i32>, prefix: Bytes) -> Self {
        Self {
            backing,
            decoder: BodyChunkDecoder::new(expected_tag, ignorable_tag),
            buffer: BytesMut::from(&prefix[..]),
            done: false,
        }
    }
}

#[async_trait]
impl<R: Unread> ChunkRead for BodyChunkDecodingReader<R> {
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        loop {
            if self.done {
                return Ok(None);
            }
            match self.decoder.decode(&mut self.buffer)? {
                Some(PayloadItem::Chunk(bytes)) => return Ok(Some(bytes)),
                Some(PayloadItem::Eof) => {
                    self.done = true;
                    if !self.buffer.is_empty() {
                        let leftover = self.buffer.split().freeze();
                        trace!(len = leftover.len(), "pushing back bytes past chunked body");
                        self.backing.unread(leftover).await;
                    }
                }
                None => match self.backing.read_chunk().await? {
                    Some(chunk) => self.buffer.extend_from_slice(&chunk),
                    None => return Err(StreamError::UnexpectedEndOfRead.into()),
                },
            }
        }
    }
}
