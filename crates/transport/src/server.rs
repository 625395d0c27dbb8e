use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use quasi_http::StandardServer;
use quasi_http::connection::{ServerTransport, Transport};
use quasi_http::handler::Application;
use quasi_http::io::{PushbackReader, SharedWriter};
use quasi_http::protocol::{ProcessingOptions, QuasiHttpError};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::SocketConnection;

/// Server side of socket connections produced by [`serve_tcp`] and
/// [`serve_unix`].
#[derive(Debug, Clone, Default)]
pub struct SocketServerTransport {
    default_processing_options: Option<ProcessingOptions>,
}

impl SocketServerTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_processing_options(mut self, options: ProcessingOptions) -> Self {
        self.default_processing_options = Some(options);
        self
    }

    pub fn default_processing_options(&self) -> Option<&ProcessingOptions> {
        self.default_processing_options.as_ref()
    }
}

impl Transport for SocketServerTransport {
    type Connection = SocketConnection;

    fn readable_stream(&self, connection: &SocketConnection) -> Option<PushbackReader> {
        Some(connection.reader())
    }

    fn writable_stream(&self, connection: &SocketConnection) -> Option<SharedWriter> {
        Some(connection.writer())
    }
}

#[async_trait]
impl ServerTransport for SocketServerTransport {
    async fn release_connection(&self, connection: &SocketConnection) -> Result<(), QuasiHttpError> {
        connection.release(None).await
    }
}

type SocketServer<A> = StandardServer<SocketServerTransport, A>;

fn default_options<A>(server: &SocketServer<A>) -> Option<&ProcessingOptions> {
    server.transport().and_then(|t| t.default_processing_options())
}

/// Accepts TCP connections forever, serving each on its own task.
pub async fn serve_tcp<A: Application + 'static>(listener: TcpListener, server: Arc<SocketServer<A>>) {
    info!(address = ?listener.local_addr(), "start listening");
    loop {
        let stream = match listener.accept().await {
            Ok((stream, _remote_addr)) => stream,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!(cause = %e, "failed to disable nagle");
        }
        match SocketConnection::from_tcp(stream, default_options(&server), None) {
            Ok(connection) => spawn_exchange(Arc::clone(&server), connection),
            Err(e) => warn!(cause = %e, "failed to set up connection"),
        }
    }
}

/// Binds a Unix domain listener at `path`, removing any stale socket file
/// first.
#[cfg(unix)]
pub fn bind_unix<P: AsRef<std::path::Path>>(path: P) -> io::Result<tokio::net::UnixListener> {
    let path = path.as_ref();
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != io::ErrorKind::NotFound
    {
        return Err(e);
    }
    tokio::net::UnixListener::bind(path)
}

/// Accepts Unix domain connections forever, serving each on its own task.
#[cfg(unix)]
pub async fn serve_unix<A: Application + 'static>(listener: tokio::net::UnixListener, server: Arc<SocketServer<A>>) {
    info!(address = ?listener.local_addr(), "start listening");
    loop {
        let stream = match listener.accept().await {
            Ok((stream, _remote_addr)) => stream,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };
        match SocketConnection::from_unix(stream, default_options(&server), None) {
            Ok(connection) => spawn_exchange(Arc::clone(&server), connection),
            Err(e) => warn!(cause = %e, "failed to set up connection"),
        }
    }
}

fn spawn_exchange<A: Application + 'static>(server: Arc<SocketServer<A>>, connection: SocketConnection) {
    tokio::spawn(async move {
        match server.accept_connection(&connection).await {
            Ok(()) => debug!("finished exchange, connection shutdown"),
            Err(e) => warn!(cause = %e, "connection processing error"),
        }
    });
}
