use std::net::SocketAddr;

use async_trait::async_trait;
use quasi_http::connection::{ClientTransport, Transport};
use quasi_http::io::{PushbackReader, SharedWriter};
use quasi_http::protocol::{ProcessingOptions, QuasiHttpError, Response};
use tokio::net::TcpStream;
use tracing::debug;

use crate::SocketConnection;

/// Connects to TCP endpoints, one connection per request.
///
/// Per-call send options take precedence over the transport defaults.
#[derive(Debug, Clone, Default)]
pub struct TcpClientTransport {
    default_send_options: Option<ProcessingOptions>,
}

impl TcpClientTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_send_options(mut self, options: ProcessingOptions) -> Self {
        self.default_send_options = Some(options);
        self
    }

    pub fn default_send_options(&self) -> Option<&ProcessingOptions> {
        self.default_send_options.as_ref()
    }
}

impl Transport for TcpClientTransport {
    type Connection = SocketConnection;

    fn readable_stream(&self, connection: &SocketConnection) -> Option<PushbackReader> {
        Some(connection.reader())
    }

    fn writable_stream(&self, connection: &SocketConnection) -> Option<SharedWriter> {
        Some(connection.writer())
    }
}

#[async_trait]
impl ClientTransport for TcpClientTransport {
    type Endpoint = SocketAddr;

    async fn allocate_connection(
        &self,
        endpoint: &SocketAddr,
        options: Option<&ProcessingOptions>,
    ) -> Result<Option<SocketConnection>, QuasiHttpError> {
        let stream = TcpStream::connect(endpoint).await?;
        stream.set_nodelay(true)?;
        debug!(%endpoint, "connected");
        Ok(Some(SocketConnection::from_tcp(stream, options, self.default_send_options.as_ref())?))
    }

    async fn establish_connection(&self, _connection: &SocketConnection) -> Result<(), QuasiHttpError> {
        Ok(())
    }

    async fn release_connection(
        &self,
        connection: &SocketConnection,
        response: Option<&Response>,
    ) -> Result<(), QuasiHttpError> {
        connection.release(response).await
    }
}

/// Connects to Unix domain socket paths, one connection per request.
#[cfg(unix)]
#[derive(Debug, Clone, Default)]
pub struct UnixClientTransport {
    default_send_options: Option<ProcessingOptions>,
}

#[cfg(unix)]
impl UnixClientTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_send_options(mut self, options: ProcessingOptions) -> Self {
        self.default_send_options = Some(options);
        self
    }

    pub fn default_send_options(&self) -> Option<&ProcessingOptions> {
        self.default_send_options.as_ref()
    }
}

#[cfg(unix)]
impl Transport for UnixClientTransport {
    type Connection = SocketConnection;

    fn readable_stream(&self, connection: &SocketConnection) -> Option<PushbackReader> {
        Some(connection.reader())
    }

    fn writable_stream(&self, connection: &SocketConnection) -> Option<SharedWriter> {
        Some(connection.writer())
    }
}

#[cfg(unix)]
#[async_trait]
impl ClientTransport for UnixClientTransport {
    type Endpoint = std::path::PathBuf;

    async fn allocate_connection(
        &self,
        endpoint: &std::path::PathBuf,
        options: Option<&ProcessingOptions>,
    ) -> Result<Option<SocketConnection>, QuasiHttpError> {
        let stream = tokio::net::UnixStream::connect(endpoint).await?;
        debug!(endpoint = %endpoint.display(), "connected");
        Ok(Some(SocketConnection::from_unix(stream, options, self.default_send_options.as_ref())?))
    }

    async fn establish_connection(&self, _connection: &SocketConnection) -> Result<(), QuasiHttpError> {
        Ok(())
    }

    async fn release_connection(
        &self,
        connection: &SocketConnection,
        response: Option<&Response>,
    ) -> Result<(), QuasiHttpError> {
        connection.release(response).await
    }
}
