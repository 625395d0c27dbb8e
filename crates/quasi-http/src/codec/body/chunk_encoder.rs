//! Encoding of bodies of unknown length into TLV chunks.
//!
//! Each non-empty chunk of data becomes a `(tag, length)` header followed by
//! the data itself. The stream ends with `(tag, 0)`.

use crate::codec::tlv::{encode_tag_and_length, end_of_tlv_stream};
use crate::io::ChunkRead;
use crate::protocol::{PayloadItem, StreamError};
use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use tokio_util::codec::Encoder;

fn chunk_length(len: usize) -> Result<i32, StreamError> {
    i32::try_from(len).map_err(|_| StreamError::InvalidLength(i64::try_from(len).unwrap_or(i64::MAX)))
}

/// Frames payload items for a [`tokio_util::codec::FramedWrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyChunkEncoder {
    tag: i32,
    eof: bool,
}

impl BodyChunkEncoder {
    pub fn new(tag: i32) -> Self {
        Self { tag, eof: false }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for BodyChunkEncoder {
    type Error = io::Error;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(bytes) => {
                let len = bytes.remaining();
                if len == 0 {
                    return Ok(());
                }
                let header = encode_tag_and_length(self.tag, chunk_length(len)?)?;
                dst.reserve(header.len() + len);
                dst.extend_from_slice(&header);
                dst.put(bytes);
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(&end_of_tlv_stream(self.tag)?);
                Ok(())
            }
        }
    }
}

/// Pull-based chunk encoding over a backing chunk source.
///
/// Each read returns either a frame header or the data chunk it announces,
/// so data is never copied.
#[derive(Debug)]
pub struct BodyChunkEncodingReader<R> {
    backing: R,
    tag: i32,
    outstanding: Option<Bytes>,
    done: bool,
}

impl<R: ChunkRead> BodyChunkEncodingReader<R> {
    pub fn new(backing: R, tag: i32) -> Self {
        Self { backing, tag, outstanding: None, done: false }
    }
}

#[async_trait]
impl<R: ChunkRead> ChunkRead for BodyChunkEncodingReader<R> {
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        if let Some(chunk) = self.outstanding.take() {
            return Ok(Some(chunk));
        }
        if self.done {
            return Ok(None);
        }

        loop {
            match self.backing.read_chunk().await? {
                Some(chunk) if chunk.is_empty() => continue,
                Some(chunk) => {
                    let header = encode_tag_and_length(self.tag, chunk_length(chunk.len())?)?;
                    self.outstanding = Some(chunk);
                    return Ok(Some(Bytes::copy_from_slice(&header)));
                }
                None => {
                    self.done = true;
                    return Ok(Some(Bytes::copy_from_slice(&end_of_tlv_stream(self.tag)?)));
                }
            }
        }
    }
}
