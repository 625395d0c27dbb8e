//! HTTP-shaped request/response exchanges over any byte stream.
//!
//! Quasi http keeps the shape of HTTP (method, target, status code, headers,
//! streamed bodies) but none of its wire format. A request or response is a
//! TLV frame holding a CSV header section, followed by a body that is either
//! sent raw (known content length) or as TLV chunks (unknown length). One
//! connection carries exactly one request and its response.
//!
//! # Features
//!
//! - Restricted-dialect CSV codec for header sections
//! - TLV framing with an ignorable extension tag for chunked bodies
//! - Streaming request and response bodies with push-back of read-ahead bytes
//! - Header and response body size limits
//! - Timeout scheduling of whole exchanges
//! - Alternative transport hooks replacing the default serialization
//!
//! # Example
//!
//! ```no_run
//! use quasi_http::StandardServer;
//! use quasi_http::connection::{Connection, ServerTransport, Transport};
//! use quasi_http::handler::make_application;
//! use quasi_http::io::{PushbackReader, SharedWriter};
//! use quasi_http::protocol::{Attributes, ProcessingOptions, QuasiHttpError, Request, Response};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! struct TcpConnection {
//!     reader: PushbackReader,
//!     writer: SharedWriter,
//!     environment: Attributes,
//! }
//!
//! impl Connection for TcpConnection {
//!     fn processing_options(&self) -> Option<&ProcessingOptions> {
//!         None
//!     }
//!
//!     fn environment(&self) -> &Attributes {
//!         &self.environment
//!     }
//! }
//!
//! struct TcpTransport;
//!
//! impl Transport for TcpTransport {
//!     type Connection = TcpConnection;
//!
//!     fn readable_stream(&self, connection: &TcpConnection) -> Option<PushbackReader> {
//!         Some(connection.reader.clone())
//!     }
//!
//!     fn writable_stream(&self, connection: &TcpConnection) -> Option<SharedWriter> {
//!         Some(connection.writer.clone())
//!     }
//! }
//!
//! #[async_trait::async_trait]
//! impl ServerTransport for TcpTransport {
//!     async fn release_connection(&self, connection: &TcpConnection) -> Result<(), QuasiHttpError> {
//!         Ok(connection.writer.shutdown().await?)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let application = make_application(|request: Request| async move {
//!         let body = format!("you asked for {}", request.target);
//!         Ok::<_, QuasiHttpError>(Some(
//!             Response::new().with_status_code(200).with_content_length(body.len() as i64).with_body(body),
//!         ))
//!     });
//!     let server = Arc::new(StandardServer::new(Arc::new(TcpTransport), Arc::new(application)));
//!
//!     let listener = TcpListener::bind("127.0.0.1:5001").await?;
//!     loop {
//!         let (stream, _) = listener.accept().await?;
//!         let server = Arc::clone(&server);
//!         tokio::spawn(async move {
//!             let (reader, writer) = stream.into_split();
//!             let connection = TcpConnection {
//!                 reader: PushbackReader::from_async_read(reader),
//!                 writer: SharedWriter::new(writer),
//!                 environment: Attributes::new(),
//!             };
//!             if let Err(e) = server.accept_connection(&connection).await {
//!                 eprintln!("exchange failed: {e}");
//!             }
//!         });
//!     }
//! }
//! ```

pub mod codec;
pub mod connection;
pub mod csv;
pub mod handler;
pub mod io;
pub mod protocol;

mod client;
mod server;
mod utils;

pub use client::StandardClient;
pub use server::StandardServer;

pub(crate) use utils::ensure;
