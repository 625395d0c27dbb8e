//! Socket transports for quasi http.
//!
//! Every exchange gets a fresh socket: the client connects, writes one
//! request and reads one response; the server reads one request and answers
//! it. Closing the write side marks the end of the exchange.
//!
//! # Components
//!
//! - [`SocketConnection`]: one TCP or Unix domain socket with its merged
//!   processing options, optional timeout scheduler and peer endpoints
//! - [`TcpClientTransport`] and [`UnixClientTransport`]: connect per request
//! - [`SocketServerTransport`] with the [`serve_tcp`] and [`serve_unix`]
//!   accept loops

mod client;
mod connection;
mod server;

pub use client::TcpClientTransport;
#[cfg(unix)]
pub use client::UnixClientTransport;
pub use connection::SocketConnection;
pub use server::{SocketServerTransport, serve_tcp};
#[cfg(unix)]
pub use server::{bind_unix, serve_unix};
