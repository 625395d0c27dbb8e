//! A body reader that yields exactly `content_length` bytes.
//!
//! Bytes read from the backing stream beyond the content length belong to
//! whoever reads the connection next, so they are pushed back rather than
//! dropped.

use crate::io::{ChunkRead, Unread};
use crate::protocol::StreamError;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use tracing::trace;

#[derive(Debug)]
pub struct ContentLengthReader<R> {
    backing: R,
    content_length: u64,
    bytes_left: u64,
    prefix: Option<Bytes>,
    done: bool,
}

impl<R: Unread> ContentLengthReader<R> {
    pub fn new(backing: R, content_length: u64) -> Self {
        Self::with_prefix(backing, content_length, Bytes::new())
    }

    /// `prefix` holds bytes already taken off `backing`; they are counted
    /// first.
    pub fn with_prefix(backing: R, content_length: u64, prefix: Bytes) -> Self {
        let prefix = if prefix.is_empty() { None } else { Some(prefix) };
        Self { backing, content_length, bytes_left: content_length, prefix, done: false }
    }

    pub fn into_inner(self) -> R {
        self.backing
    }
}

#[async_trait]
impl<R: Unread> ChunkRead for ContentLengthReader<R> {
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        if self.done {
            return Ok(None);
        }

        // a zero content length still touches the backing stream once
        let chunk = match self.prefix.take() {
            Some(prefix) => Some(prefix),
            None => self.backing.read_chunk().await?,
        };

        let Some(mut chunk) = chunk else {
            if self.bytes_left > 0 {
                return Err(StreamError::UnexpectedEndOfRead.into());
            }
            self.done = true;
            return Ok(None);
        };

        let len = chunk.len() as u64;
        if len <= self.bytes_left {
            self.bytes_left -= len;
        } else {
            if self.content_length == 0 {
                self.backing.unread(chunk).await;
                self.done = true;
                return Ok(None);
            }
            // bytes_left < len, so it fits in usize
            let excess = chunk.split_off(usize::try_from(self.bytes_left).unwrap_or(chunk.len()));
            trace!(excess = excess.len(), "pushing back bytes past content length");
            self.backing.unread(excess).await;
            self.bytes_left = 0;
        }

        if self.bytes_left == 0 {
            self.done = true;
        }
        Ok(Some(chunk))
    }
}
