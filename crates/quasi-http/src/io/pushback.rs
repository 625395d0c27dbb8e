use crate::io::{ChunkList, ChunkRead, ChunkStream, Unread};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::Mutex;
use tokio_util::io::ReaderStream;

const READ_CAPACITY: usize = 8 * 1024;

struct Inner {
    source: Box<dyn ChunkRead>,
    pushed_back: Vec<Bytes>,
}

/// A cloneable handle to a chunk source with a LIFO push-back buffer.
///
/// A connection and every body decoded from it share one `PushbackReader`,
/// so bytes a decoder reads past its frame boundary stay visible to whoever
/// reads next.
#[derive(Clone)]
pub struct PushbackReader {
    inner: Arc<Mutex<Inner>>,
}

impl PushbackReader {
    pub fn new<R: ChunkRead + 'static>(source: R) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner { source: Box::new(source), pushed_back: Vec::new() })) }
    }

    /// Reads from `reader` in chunks of up to 8 KiB.
    pub fn from_async_read<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        Self::new(ChunkStream::new(ReaderStream::with_capacity(reader, READ_CAPACITY)))
    }

    /// A reader over in-memory chunks.
    pub fn from_chunks<I: IntoIterator<Item = Bytes>>(chunks: I) -> Self {
        Self::new(ChunkList::new(chunks))
    }

    /// Number of bytes currently held in the push-back buffer.
    pub async fn pushed_back_len(&self) -> usize {
        self.inner.lock().await.pushed_back.iter().map(Bytes::len).sum()
    }
}

impl fmt::Debug for PushbackReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushbackReader").finish_non_exhaustive()
    }
}

#[async_trait]
impl ChunkRead for PushbackReader {
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        let mut inner = self.inner.lock().await;
        if let Some(chunk) = inner.pushed_back.pop() {
            return Ok(Some(chunk));
        }
        inner.source.read_chunk().await
    }
}

#[async_trait]
impl Unread for PushbackReader {
    async fn unread(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        self.inner.lock().await.pushed_back.push(chunk);
    }
}
