//! Quasi http header sections.
//!
//! # Components
//!
//! - [`encode_quasi_http_headers`]: builds the CSV header section of a
//!   request or response
//!   - rejects empty header names and values
//!   - skips headers without values
//! - [`validate_http_header_section`]: character checks on the request or
//!   status line and on every header row
//! - [`decode_quasi_http_headers`]: parses a header section, lowercasing and
//!   merging header names
//! - [`HeadersFrameDecoder`]: extracts the `hdrs` TLV frame from a byte
//!   stream while enforcing the header size limit

mod header_decoder;
mod header_encoder;

pub use header_decoder::{HeadersFrameDecoder, decode_quasi_http_headers};
pub use header_encoder::{encode_quasi_http_headers, validate_http_header_section};
