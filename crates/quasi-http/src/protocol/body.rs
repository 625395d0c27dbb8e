use crate::io::{self as chunk_io, ChunkList, ChunkRead, ChunkStream};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// The body of a request or response: a boxed chunk source.
///
/// A body is consumed by reading it. Whether its length is known is carried
/// separately by the `content_length` of the owning request or response.
pub struct Body {
    inner: Box<dyn ChunkRead>,
}

impl Body {
    pub fn new<R: ChunkRead + 'static>(reader: R) -> Self {
        Self { inner: Box::new(reader) }
    }

    /// A body over in-memory bytes.
    pub fn from_bytes<B: Into<Bytes>>(data: B) -> Self {
        let data = data.into();
        if data.is_empty() {
            return Self::new(ChunkList::default());
        }
        Self::new(ChunkList::new([data]))
    }

    /// A body over an async reader, read in chunks of up to 8 KiB.
    pub fn from_async_read<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        Self::new(ChunkStream::new(ReaderStream::with_capacity(reader, 8 * 1024)))
    }

    pub async fn read_to_end(&mut self) -> io::Result<Bytes> {
        chunk_io::read_to_end(&mut self.inner).await
    }
}

#[async_trait]
impl ChunkRead for Body {
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        self.inner.read_chunk().await
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").finish_non_exhaustive()
    }
}

impl From<Bytes> for Body {
    fn from(data: Bytes) -> Self {
        Self::from_bytes(data)
    }
}

impl From<Vec<u8>> for Body {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl From<&'static [u8]> for Body {
    fn from(data: &'static [u8]) -> Self {
        Self::from_bytes(data)
    }
}

impl From<String> for Body {
    fn from(data: String) -> Self {
        Self::from_bytes(data)
    }
}

impl From<&'static str> for Body {
    fn from(data: &'static str) -> Self {
        Self::from_bytes(data)
    }
}
