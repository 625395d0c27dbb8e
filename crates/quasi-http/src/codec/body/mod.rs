//! Body streaming filters.
//!
//! # Components
//!
//! ## Decoding
//! - [`ContentLengthReader`]: yields exactly a known number of bytes
//! - [`BodyChunkDecoder`] and [`BodyChunkDecodingReader`]: decode TLV chunked
//!   bodies of unknown length
//! - [`MaxLengthReader`]: fails once a body grows past a limit
//!
//! ## Encoding
//! - [`BodyChunkEncoder`] and [`BodyChunkEncodingReader`]: frame bodies of
//!   unknown length as TLV chunks
//!
//! Decoding filters read ahead in whole chunks. Whatever they read past the
//! end of their body is pushed back onto the connection stream.

mod chunk_decoder;
mod chunk_encoder;
mod content_length_reader;
mod max_length_reader;

pub use chunk_decoder::{BodyChunkDecoder, BodyChunkDecodingReader};
pub use chunk_encoder::{BodyChunkEncoder, BodyChunkEncodingReader};
pub use content_length_reader::ContentLengthReader;
pub use max_length_reader::MaxLengthReader;
