//! Connections, transports and the entity plumbing between them.
//!
//! # Components
//!
//! - [`Connection`]: what the runtime needs to know about one connection
//!   - merged [`ProcessingOptions`]
//!   - an optional [`TimeoutScheduler`]
//!   - an environment handed to requests read from it
//! - [`ClientTransport`] and [`ServerTransport`]: allocate, establish and
//!   release connections, and expose their byte streams
//! - [`AltTransport`]: optional hooks replacing the default serialization of
//!   requests and responses
//! - entity functions ([`write_request`], [`read_response`], ...): put whole
//!   requests and responses on the wire and take them off it
//!
//! One connection carries exactly one request and its response.

mod entity;
mod timeout;

pub use entity::{
    read_quasi_http_headers, read_request, read_response, write_quasi_http_headers, write_request, write_response,
};
pub use timeout::{Procedure, TimeoutResult, TimeoutScheduler, TokioTimeoutScheduler, run_timeout_scheduler};

use crate::io::{PushbackReader, SharedWriter};
use crate::protocol::{Attributes, ProcessingOptions, QuasiHttpError, Request, Response};
use async_trait::async_trait;

pub trait Connection: Send + Sync {
    fn processing_options(&self) -> Option<&ProcessingOptions>;

    fn timeout_scheduler(&self) -> Option<&dyn TimeoutScheduler> {
        None
    }

    fn environment(&self) -> &Attributes;
}

/// Stream access shared by client and server transports.
pub trait Transport: Send + Sync {
    type Connection: Connection + 'static;

    /// Bodies read from the connection keep a clone of this reader, so bytes
    /// pushed back by one reader are seen by the next.
    fn readable_stream(&self, connection: &Self::Connection) -> Option<PushbackReader>;

    fn writable_stream(&self, connection: &Self::Connection) -> Option<SharedWriter>;

    /// Alternative serialization hooks, if this transport has any.
    fn alt_transport(&self) -> Option<&dyn AltTransport<Self::Connection>> {
        None
    }
}

#[async_trait]
pub trait ClientTransport: Transport {
    type Endpoint: Send + Sync;

    async fn allocate_connection(
        &self,
        endpoint: &Self::Endpoint,
        options: Option<&ProcessingOptions>,
    ) -> Result<Option<Self::Connection>, QuasiHttpError>;

    /// Waits until the connection is ready for writing.
    async fn establish_connection(&self, connection: &Self::Connection) -> Result<(), QuasiHttpError>;

    /// Called once the exchange ends. `response` is `None` on failure and
    /// when a response body is released; a response still carrying a body
    /// needs the connection kept open.
    async fn release_connection(
        &self,
        connection: &Self::Connection,
        response: Option<&Response>,
    ) -> Result<(), QuasiHttpError>;
}

#[async_trait]
pub trait ServerTransport: Transport {
    async fn release_connection(&self, connection: &Self::Connection) -> Result<(), QuasiHttpError>;
}

/// Hooks for transports that move requests and responses without the
/// default wire format.
///
/// Serializers return `true` once they have written the entity; deserializers
/// return `Some` once they have read one. Otherwise the default format is
/// used.
#[async_trait]
pub trait AltTransport<C: Sync>: Send + Sync {
    async fn serialize_request(&self, _connection: &C, _request: &mut Request) -> Result<bool, QuasiHttpError> {
        Ok(false)
    }

    async fn serialize_response(&self, _connection: &C, _response: &mut Response) -> Result<bool, QuasiHttpError> {
        Ok(false)
    }

    async fn deserialize_request(&self, _connection: &C) -> Result<Option<Request>, QuasiHttpError> {
        Ok(None)
    }

    async fn deserialize_response(&self, _connection: &C) -> Result<Option<Response>, QuasiHttpError> {
        Ok(None)
    }
}
