use crate::protocol::{Attributes, Body, Headers, QuasiHttpError};
use bytes::{Buf, Bytes};
use futures::future::BoxFuture;
use std::fmt;

/// An item produced by a body decoder: a chunk of payload or the end marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    Chunk(Data),
    Eof,
}

impl<D: Buf> PayloadItem<D> {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }
}

impl PayloadItem {
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

type DisposeFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), QuasiHttpError>> + Send + Sync>;

/// Cleanup attached to a request or response, run at most once.
pub struct Disposer {
    f: DisposeFn,
}

impl Disposer {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, Result<(), QuasiHttpError>> + Send + Sync + 'static,
    {
        Self { f: Box::new(f) }
    }

    pub async fn dispose(self) -> Result<(), QuasiHttpError> {
        (self.f)().await
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Disposer")
    }
}

/// A quasi http request.
///
/// `content_length` is independent of `body`: 0 means no body, a positive
/// value is the exact body length, and a negative value means the length is
/// not known in advance.
#[derive(Debug, Default)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub http_version: String,
    pub content_length: i64,
    pub headers: Headers,
    pub body: Option<Body>,
    pub environment: Attributes,
    pub disposer: Option<Disposer>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_method<S: Into<String>>(mut self, method: S) -> Self {
        self.method = method.into();
        self
    }

    #[must_use]
    pub fn with_target<S: Into<String>>(mut self, target: S) -> Self {
        self.target = target.into();
        self
    }

    #[must_use]
    pub fn with_http_version<S: Into<String>>(mut self, http_version: S) -> Self {
        self.http_version = http_version.into();
        self
    }

    #[must_use]
    pub fn with_content_length(mut self, content_length: i64) -> Self {
        self.content_length = content_length;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body<B: Into<Body>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Attributes) -> Self {
        self.environment = environment;
        self
    }

    /// Runs the disposer, if any. Later calls do nothing.
    pub async fn release(&mut self) -> Result<(), QuasiHttpError> {
        match self.disposer.take() {
            Some(disposer) => disposer.dispose().await,
            None => Ok(()),
        }
    }
}

/// A quasi http response. Same content length rules as [`Request`].
#[derive(Debug, Default)]
pub struct Response {
    pub status_code: i32,
    pub http_status_message: String,
    pub http_version: String,
    pub content_length: i64,
    pub headers: Headers,
    pub body: Option<Body>,
    pub environment: Attributes,
    pub disposer: Option<Disposer>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_status_code(mut self, status_code: i32) -> Self {
        self.status_code = status_code;
        self
    }

    #[must_use]
    pub fn with_http_status_message<S: Into<String>>(mut self, message: S) -> Self {
        self.http_status_message = message.into();
        self
    }

    #[must_use]
    pub fn with_http_version<S: Into<String>>(mut self, http_version: S) -> Self {
        self.http_version = http_version.into();
        self
    }

    #[must_use]
    pub fn with_content_length(mut self, content_length: i64) -> Self {
        self.content_length = content_length;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body<B: Into<Body>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Attributes) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_disposer(mut self, disposer: Disposer) -> Self {
        self.disposer = Some(disposer);
        self
    }

    /// Runs the disposer, if any. Later calls do nothing.
    pub async fn release(&mut self) -> Result<(), QuasiHttpError> {
        match self.disposer.take() {
            Some(disposer) => disposer.dispose().await,
            None => Ok(()),
        }
    }
}
