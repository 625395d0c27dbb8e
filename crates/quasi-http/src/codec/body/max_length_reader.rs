use crate::io::ChunkRead;
use crate::protocol::StreamError;
use crate::protocol::constants::DEFAULT_MAX_BODY_SIZE;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;

/// Passes chunks through until their running total exceeds a maximum.
#[derive(Debug)]
pub struct MaxLengthReader<R> {
    backing: R,
    max_length: u64,
    bytes_left: u64,
}

impl<R: ChunkRead> MaxLengthReader<R> {
    /// A `max_length` of 0 selects the default of 128 MiB.
    pub fn new(backing: R, max_length: u64) -> Self {
        let max_length = if max_length == 0 { DEFAULT_MAX_BODY_SIZE } else { max_length };
        Self { backing, max_length, bytes_left: max_length }
    }

    pub fn max_length(&self) -> u64 {
        self.max_length
    }
}

#[async_trait]
impl<R: ChunkRead> ChunkRead for MaxLengthReader<R> {
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        let Some(chunk) = self.backing.read_chunk().await? else {
            return Ok(None);
        };
        let len = chunk.len() as u64;
        if len > self.bytes_left {
            return Err(StreamError::LimitExceeded { limit: self.max_length }.into());
        }
        self.bytes_left -= len;
        Ok(Some(chunk))
    }
}
