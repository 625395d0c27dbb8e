use std::fmt;
use std::io;

use quasi_http::connection::{Connection, TimeoutScheduler, TokioTimeoutScheduler};
use quasi_http::io::{PushbackReader, SharedWriter};
use quasi_http::protocol::constants::{ENV_KEY_LOCAL_PEER_ENDPOINT, ENV_KEY_REMOTE_PEER_ENDPOINT};
use quasi_http::protocol::{Attributes, ProcessingOptions, QuasiHttpError, Response};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

/// A quasi http connection over one socket.
///
/// Processing options are merged once at construction. A positive
/// `timeout_millis` gives the connection a [`TokioTimeoutScheduler`].
pub struct SocketConnection {
    reader: PushbackReader,
    writer: SharedWriter,
    options: ProcessingOptions,
    scheduler: Option<TokioTimeoutScheduler>,
    environment: Attributes,
}

impl SocketConnection {
    pub fn new<R, W>(
        reader: R,
        writer: W,
        options: Option<&ProcessingOptions>,
        fallback_options: Option<&ProcessingOptions>,
        environment: Attributes,
    ) -> Self
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let options = ProcessingOptions::merge(options, fallback_options).unwrap_or_default();
        let scheduler = TokioTimeoutScheduler::from_millis(options.timeout_millis);
        Self {
            reader: PushbackReader::from_async_read(reader),
            writer: SharedWriter::new(writer),
            options,
            scheduler,
            environment,
        }
    }

    /// Wraps a TCP stream, recording both peer addresses in the environment.
    pub fn from_tcp(
        stream: TcpStream,
        options: Option<&ProcessingOptions>,
        fallback_options: Option<&ProcessingOptions>,
    ) -> io::Result<Self> {
        let environment = Attributes::new()
            .with(ENV_KEY_LOCAL_PEER_ENDPOINT, stream.local_addr()?)
            .with(ENV_KEY_REMOTE_PEER_ENDPOINT, stream.peer_addr()?);
        let (reader, writer) = stream.into_split();
        Ok(Self::new(reader, writer, options, fallback_options, environment))
    }

    /// Wraps a Unix domain stream. Unnamed endpoints are left out of the
    /// environment.
    #[cfg(unix)]
    pub fn from_unix(
        stream: tokio::net::UnixStream,
        options: Option<&ProcessingOptions>,
        fallback_options: Option<&ProcessingOptions>,
    ) -> io::Result<Self> {
        let mut environment = Attributes::new();
        if let Some(path) = stream.local_addr()?.as_pathname() {
            environment.insert(ENV_KEY_LOCAL_PEER_ENDPOINT, path.to_path_buf());
        }
        if let Some(path) = stream.peer_addr()?.as_pathname() {
            environment.insert(ENV_KEY_REMOTE_PEER_ENDPOINT, path.to_path_buf());
        }
        let (reader, writer) = stream.into_split();
        Ok(Self::new(reader, writer, options, fallback_options, environment))
    }

    pub fn reader(&self) -> PushbackReader {
        self.reader.clone()
    }

    pub fn writer(&self) -> SharedWriter {
        self.writer.clone()
    }

    /// Shuts down the write side, unless `response` still has a body to be
    /// read off this connection.
    pub async fn release(&self, response: Option<&Response>) -> Result<(), QuasiHttpError> {
        if response.is_some_and(|r| r.body.is_some()) {
            debug!("keeping connection open for response body");
            return Ok(());
        }
        match self.writer.shutdown().await {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            result => Ok(result?),
        }
    }
}

impl Connection for SocketConnection {
    fn processing_options(&self) -> Option<&ProcessingOptions> {
        Some(&self.options)
    }

    fn timeout_scheduler(&self) -> Option<&dyn TimeoutScheduler> {
        self.scheduler.as_ref().map(|s| s as &dyn TimeoutScheduler)
    }

    fn environment(&self) -> &Attributes {
        &self.environment
    }
}

impl fmt::Debug for SocketConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketConnection")
            .field("options", &self.options)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn duplex_connection(
        options: Option<&ProcessingOptions>,
        fallback_options: Option<&ProcessingOptions>,
    ) -> (SocketConnection, tokio::io::DuplexStream) {
        let (local, peer) = tokio::io::duplex(1024);
        let (reader, writer) = tokio::io::split(local);
        (SocketConnection::new(reader, writer, options, fallback_options, Attributes::new()), peer)
    }

    #[test]
    fn test_options_are_merged() {
        let options = ProcessingOptions::new().with_max_headers_size(100);
        let fallback = ProcessingOptions::new().with_timeout_millis(250).with_max_headers_size(50);
        let (connection, _peer) = duplex_connection(Some(&options), Some(&fallback));

        let merged = connection.processing_options().unwrap();
        assert_eq!(merged.max_headers_size, 100);
        assert_eq!(merged.timeout_millis, 250);
        assert_eq!(connection.scheduler.map(|s| s.timeout()), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_no_scheduler_without_positive_timeout() {
        let (connection, _peer) = duplex_connection(None, None);
        assert!(connection.timeout_scheduler().is_none());

        let options = ProcessingOptions::new().with_timeout_millis(-1);
        let (connection, _peer) = duplex_connection(Some(&options), None);
        assert!(connection.timeout_scheduler().is_none());
    }

    #[tokio::test]
    async fn test_release_keeps_connection_open_for_response_body() {
        let (connection, mut peer) = duplex_connection(None, None);

        let response = Response::new().with_body("pending");
        connection.release(Some(&response)).await.unwrap();
        connection.writer().write_all(b"still open").await.unwrap();

        connection.release(None).await.unwrap();
        let mut received = Vec::new();
        peer.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"still open");
    }

    #[tokio::test]
    async fn test_tcp_connection_environment() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (client, accepted) = tokio::join!(TcpStream::connect(address), listener.accept());
        let (server_stream, client_address) = accepted.unwrap();

        let connection = SocketConnection::from_tcp(server_stream, None, None).unwrap();
        let environment = connection.environment();
        assert_eq!(environment.get::<std::net::SocketAddr>(ENV_KEY_LOCAL_PEER_ENDPOINT), Some(&address));
        assert_eq!(environment.get::<std::net::SocketAddr>(ENV_KEY_REMOTE_PEER_ENDPOINT), Some(&client_address));
        drop(client);
    }
}
