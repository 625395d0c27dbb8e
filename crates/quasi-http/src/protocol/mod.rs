//! Core quasi http abstractions: messages, bodies, options and errors.
//!
//! - [`Request`] and [`Response`] carry the request or status line, the
//!   headers, an optional [`Body`], an environment and an optional
//!   [`Disposer`].
//! - [`ProcessingOptions`] configures timeouts and size limits and can be
//!   merged from several sources.
//! - [`QuasiHttpError`] is returned by every client and server operation,
//!   classified by a [`ReasonCode`] for protocol failures.

mod attributes;
pub use attributes::Attributes;

mod body;
pub use body::Body;

pub mod constants;

mod error;
pub use error::BoxError;
pub use error::CsvError;
pub use error::CsvValueError;
pub use error::IntegerParseError;
pub use error::QuasiHttpError;
pub use error::ReasonCode;
pub use error::ReservedReasonCode;
pub use error::StreamError;

mod headers;
pub use headers::Headers;

mod message;
pub use message::Disposer;
pub use message::PayloadItem;
pub use message::Request;
pub use message::Response;

mod options;
pub use options::ProcessingOptions;
pub use options::effective_attributes;
pub use options::effective_non_zero;
pub use options::effective_positive;
