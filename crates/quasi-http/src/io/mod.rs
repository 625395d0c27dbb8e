//! Chunk-oriented byte sources and sinks.
//!
//! Bodies and connection streams are read one [`Bytes`] chunk at a time
//! through [`ChunkRead`]. Decoding filters that read ahead of what they are
//! entitled to consume hand the surplus back through [`Unread`], so the next
//! consumer of the same connection sees those bytes first.
//!
//! Writing goes through plain [`tokio::io::AsyncWrite`].

mod pushback;
mod writer;

pub use pushback::PushbackReader;
pub use writer::SharedWriter;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A source of byte chunks.
///
/// `Ok(None)` marks the end of the stream. Implementations should not yield
/// empty chunks, but consumers tolerate them.
#[async_trait]
pub trait ChunkRead: Send + Sync {
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>>;
}

/// A chunk source that accepts bytes pushed back in front of its remaining
/// content. The most recently unread chunk is returned first.
#[async_trait]
pub trait Unread: ChunkRead {
    async fn unread(&mut self, chunk: Bytes);
}

#[async_trait]
impl<T: ChunkRead + ?Sized> ChunkRead for Box<T> {
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        (**self).read_chunk().await
    }
}

#[async_trait]
impl<T: ChunkRead + ?Sized> ChunkRead for &mut T {
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        (**self).read_chunk().await
    }
}

#[async_trait]
impl<T: Unread + ?Sized> Unread for &mut T {
    async fn unread(&mut self, chunk: Bytes) {
        (**self).unread(chunk).await;
    }
}

/// Adapts a stream of byte results, such as a
/// [`tokio_util::io::ReaderStream`], into a [`ChunkRead`].
#[derive(Debug)]
pub struct ChunkStream<S> {
    inner: S,
}

impl<S> ChunkStream<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S> ChunkRead for ChunkStream<S>
where
    S: Stream<Item = io::Result<Bytes>> + Send + Sync + Unpin,
{
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        self.inner.next().await.transpose()
    }
}

/// Yields a fixed list of chunks, then end of stream.
#[derive(Debug, Default, Clone)]
pub struct ChunkList {
    chunks: std::collections::VecDeque<Bytes>,
}

impl ChunkList {
    pub fn new<I: IntoIterator<Item = Bytes>>(chunks: I) -> Self {
        Self { chunks: chunks.into_iter().collect() }
    }
}

#[async_trait]
impl ChunkRead for ChunkList {
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        Ok(self.chunks.pop_front())
    }
}

/// Copies every chunk of `reader` into `writer`, returning the number of
/// bytes copied. The writer is flushed at the end.
pub async fn copy_to<R, W>(reader: &mut R, writer: &mut W) -> io::Result<u64>
where
    R: ChunkRead + ?Sized,
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    let mut total = 0u64;
    while let Some(chunk) = reader.read_chunk().await? {
        writer.write_all(&chunk).await?;
        total += chunk.len() as u64;
    }
    writer.flush().await?;
    Ok(total)
}

/// Reads `reader` to its end, collecting everything into one buffer.
pub async fn read_to_end<R: ChunkRead + ?Sized>(reader: &mut R) -> io::Result<Bytes> {
    let mut chunks = Vec::new();
    while let Some(chunk) = reader.read_chunk().await? {
        chunks.push(chunk);
    }
    Ok(match chunks.len() {
        0 => Bytes::new(),
        1 => chunks.swap_remove(0),
        _ => Bytes::from(chunks.concat()),
    })
}
