use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, MutexGuard};

type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A cloneable handle to the write half of a connection.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<BoxWriter>>,
}

impl SharedWriter {
    pub fn new<W: AsyncWrite + Send + Unpin + 'static>(writer: W) -> Self {
        Self { inner: Arc::new(Mutex::new(Box::new(writer))) }
    }

    /// Locks the writer for a sequence of writes.
    pub async fn lock(&self) -> MutexGuard<'_, BoxWriter> {
        self.inner.lock().await
    }

    /// Writes all of `data` and flushes.
    pub async fn write_all(&self, data: &[u8]) -> io::Result<()> {
        let mut writer = self.lock().await;
        writer.write_all(data).await?;
        writer.flush().await
    }

    pub async fn shutdown(&self) -> io::Result<()> {
        self.lock().await.shutdown().await
    }
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWriter").finish_non_exhaustive()
    }
}
