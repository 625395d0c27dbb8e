//! Wire codecs for quasi http.
//!
//! - [`number`]: big-endian integers and bounded integer parsing
//! - [`tlv`]: the 8 byte tag and length frame header
//! - [`header`]: the CSV header section and its TLV framing
//! - body filters: content length, max length and chunked encodings

pub mod header;
pub mod number;
pub mod tlv;

mod body;
pub use body::*;
