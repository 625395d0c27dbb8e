//! Writing and reading whole requests and responses.
//!
//! An entity goes on the wire as its `hdrs` frame followed by its body. A
//! positive content length sends the body raw; any other content length sends
//! it as `bdta` chunks. The content length is written as given even when there
//! is no body, so a response to a `HEAD`-like request can announce a length
//! without sending bytes.

use crate::codec::header::{HeadersFrameDecoder, decode_quasi_http_headers, encode_quasi_http_headers};
use crate::codec::number::{parse_int32, parse_int48};
use crate::codec::tlv::{
    TAG_FOR_QUASI_HTTP_BODY_CHUNK, TAG_FOR_QUASI_HTTP_BODY_CHUNK_EXT, TAG_FOR_QUASI_HTTP_HEADERS,
    encode_tag_and_length,
};
use crate::codec::{BodyChunkDecodingReader, BodyChunkEncoder, ContentLengthReader, MaxLengthReader};
use crate::connection::Connection;
use crate::io::{ChunkRead, PushbackReader, SharedWriter, Unread, copy_to};
use crate::protocol::{
    Attributes, Body, Headers, PayloadItem, ProcessingOptions, QuasiHttpError, ReasonCode, Request, Response, StreamError,
};
use bytes::{Bytes, BytesMut};
use futures::SinkExt;
use std::cmp::Ordering;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, FramedWrite};
use tracing::{debug, trace};

/// Encodes and writes the `hdrs` frame of an entity.
///
/// Fails with [`ReasonCode::MESSAGE_LENGTH_LIMIT_EXCEEDED`] when the encoded
/// header section is larger than `max_headers_size`.
pub async fn write_quasi_http_headers<W, S>(
    is_response: bool,
    writer: &mut W,
    special_line: &[S],
    headers: &Headers,
    max_headers_size: Option<u64>,
) -> Result<(), QuasiHttpError>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
    S: AsRef<str>,
{
    let encoded = encode_quasi_http_headers(is_response, special_line, headers)?;
    if let Some(max) = max_headers_size
        && encoded.len() as u64 > max
    {
        return Err(QuasiHttpError::message_length_limit_exceeded(format!(
            "quasi http headers exceed max size ({} > {max})",
            encoded.len()
        )));
    }
    let Ok(length) = i32::try_from(encoded.len()) else {
        return Err(StreamError::InvalidLength(i64::try_from(encoded.len()).unwrap_or(i64::MAX)).into());
    };
    writer.write_all(&encode_tag_and_length(TAG_FOR_QUASI_HTTP_HEADERS, length)?).await?;
    writer.write_all(&encoded).await?;
    Ok(())
}

/// Reads and decodes the `hdrs` frame of an entity, merging its headers into
/// `headers`.
///
/// Returns the request or status line together with whatever was read past
/// the frame, which belongs to the body.
pub async fn read_quasi_http_headers<R>(
    is_response: bool,
    reader: &mut R,
    headers: &mut Headers,
    max_headers_size: Option<u64>,
) -> Result<(Vec<String>, Bytes), QuasiHttpError>
where
    R: ChunkRead + ?Sized,
{
    let mut decoder = HeadersFrameDecoder::new(max_headers_size);
    let mut buffer = BytesMut::new();
    let encoded = loop {
        if let Some(frame) = decoder.decode(&mut buffer)? {
            break frame;
        }
        match reader.read_chunk().await? {
            Some(chunk) => buffer.extend_from_slice(&chunk),
            None => return Err(StreamError::UnexpectedEndOfRead.into()),
        }
    };
    let special_line = decode_quasi_http_headers(is_response, &encoded, headers)?;
    Ok((special_line, buffer.freeze()))
}

pub async fn write_request<C>(
    request: &mut Request,
    writer: Option<SharedWriter>,
    connection: &C,
) -> Result<(), QuasiHttpError>
where
    C: Connection + ?Sized,
{
    let content_length = request.content_length.to_string();
    let special_line =
        [request.method.as_str(), request.target.as_str(), request.http_version.as_str(), content_length.as_str()];
    let body = request.body.as_mut();
    write_entity(false, &special_line, &request.headers, request.content_length, body, writer, connection).await
}

pub async fn write_response<C>(
    response: &mut Response,
    writer: Option<SharedWriter>,
    connection: &C,
) -> Result<(), QuasiHttpError>
where
    C: Connection + ?Sized,
{
    let status_code = response.status_code.to_string();
    let content_length = response.content_length.to_string();
    let special_line = [
        response.http_version.as_str(),
        status_code.as_str(),
        response.http_status_message.as_str(),
        content_length.as_str(),
    ];
    let body = response.body.as_mut();
    write_entity(true, &special_line, &response.headers, response.content_length, body, writer, connection).await
}

async fn write_entity<C>(
    is_response: bool,
    special_line: &[&str],
    headers: &Headers,
    content_length: i64,
    body: Option<&mut Body>,
    writer: Option<SharedWriter>,
    connection: &C,
) -> Result<(), QuasiHttpError>
where
    C: Connection + ?Sized,
{
    let writer = writer.ok_or_else(|| QuasiHttpError::missing_dependency("no writable stream found for transport"))?;
    let max_headers_size = ProcessingOptions::headers_size_limit(connection.processing_options());

    let mut guard = writer.lock().await;
    write_quasi_http_headers(is_response, &mut *guard, special_line, headers, max_headers_size).await?;

    let Some(body) = body else {
        // nothing else to send, whatever the content length says
        guard.flush().await?;
        return Ok(());
    };

    if content_length > 0 {
        let copied = copy_to(body, &mut *guard).await?;
        trace!(copied, content_length, "wrote raw body");
        return Ok(());
    }

    let mut framed = FramedWrite::new(&mut *guard, BodyChunkEncoder::new(TAG_FOR_QUASI_HTTP_BODY_CHUNK));
    while let Some(chunk) = body.read_chunk().await? {
        framed.feed(PayloadItem::Chunk(chunk)).await?;
    }
    framed.send(PayloadItem::<Bytes>::Eof).await?;
    trace!("wrote chunked body");
    Ok(())
}

/// Reads a request off `reader`. The request takes the connection's
/// environment.
pub async fn read_request<C>(reader: Option<PushbackReader>, connection: &C) -> Result<Request, QuasiHttpError>
where
    C: Connection + ?Sized,
{
    let mut reader = reader.ok_or_else(|| QuasiHttpError::missing_dependency("no readable stream found for transport"))?;
    let max_headers_size = ProcessingOptions::headers_size_limit(connection.processing_options());

    let mut headers = Headers::new();
    let (special_line, prefix) = read_quasi_http_headers(false, &mut reader, &mut headers, max_headers_size).await?;
    let content_length = parse_content_length(false, &special_line[3])?;
    let body = read_body(&mut reader, content_length, prefix).await;

    let [method, target, http_version, _] = first_four(special_line);
    debug!(content_length, "read request headers");
    Ok(Request {
        method,
        target,
        http_version,
        content_length,
        headers,
        body,
        environment: connection.environment().clone(),
        disposer: None,
    })
}

/// Reads a response off `reader`. Its body is capped at the connection's
/// response body size limit.
pub async fn read_response<C>(reader: Option<PushbackReader>, connection: &C) -> Result<Response, QuasiHttpError>
where
    C: Connection + ?Sized,
{
    let mut reader = reader.ok_or_else(|| QuasiHttpError::missing_dependency("no readable stream found for transport"))?;
    let options = connection.processing_options();
    let max_headers_size = ProcessingOptions::headers_size_limit(options);

    let mut headers = Headers::new();
    let (special_line, prefix) = read_quasi_http_headers(true, &mut reader, &mut headers, max_headers_size).await?;
    let content_length = parse_content_length(true, &special_line[3])?;
    let status_code = parse_int32(&special_line[1]).map_err(|e| {
        QuasiHttpError::protocol_with_source(
            "invalid quasi http response status code",
            ReasonCode::PROTOCOL_VIOLATION,
            e,
        )
    })?;

    let mut body = read_body(&mut reader, content_length, prefix).await;
    if let Some(limit) = ProcessingOptions::response_body_size_limit(options) {
        body = body.map(|body| Body::new(MaxLengthReader::new(body, limit)));
    }

    let [http_version, _, http_status_message, _] = first_four(special_line);
    debug!(status_code, content_length, "read response headers");
    Ok(Response {
        status_code,
        http_status_message,
        http_version,
        content_length,
        headers,
        body,
        environment: Attributes::new(),
        disposer: None,
    })
}

fn first_four(fields: Vec<String>) -> [String; 4] {
    let mut fields = fields.into_iter();
    std::array::from_fn(|_| fields.next().unwrap_or_default())
}

fn parse_content_length(is_response: bool, value: &str) -> Result<i64, QuasiHttpError> {
    parse_int48(value).map_err(|e| {
        let kind = if is_response { "response" } else { "request" };
        QuasiHttpError::protocol_with_source(
            format!("invalid quasi http {kind} content length"),
            ReasonCode::PROTOCOL_VIOLATION,
            e,
        )
    })
}

/// Picks the body decoder for a content length. Without a body the bytes
/// read ahead go back onto the connection.
async fn read_body(reader: &mut PushbackReader, content_length: i64, prefix: Bytes) -> Option<Body> {
    match content_length.cmp(&0) {
        Ordering::Greater => Some(Body::new(ContentLengthReader::with_prefix(
            reader.clone(),
            content_length.unsigned_abs(),
            prefix,
        ))),
        Ordering::Less => Some(Body::new(BodyChunkDecodingReader::with_prefix(
            reader.clone(),
            TAG_FOR_QUASI_HTTP_BODY_CHUNK,
            Some(TAG_FOR_QUASI_HTTP_BODY_CHUNK_EXT),
            prefix,
        ))),
        Ordering::Equal => {
            reader.unread(prefix).await;
            None
        }
    }
}
