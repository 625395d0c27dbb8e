use std::error::Error;
use std::fmt;
use std::io;
use thiserror::Error;

/// Boxed error type accepted from applications and transports.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Classifies a [`QuasiHttpError::Protocol`] failure.
///
/// Codes 0 and 5 to 9 are reserved and cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReasonCode(i32);

impl ReasonCode {
    /// Catch-all for unexpected failures during send or accept.
    pub const GENERAL: Self = Self(1);
    /// A timeout scheduler reported a timeout.
    pub const TIMEOUT: Self = Self(2);
    /// Malformed wire data.
    pub const PROTOCOL_VIOLATION: Self = Self(3);
    /// Encoded headers or a body exceeded a configured or default cap.
    pub const MESSAGE_LENGTH_LIMIT_EXCEEDED: Self = Self(4);

    pub fn new(code: i32) -> Result<Self, ReservedReasonCode> {
        if code == 0 || (5..=9).contains(&code) {
            return Err(ReservedReasonCode(code));
        }
        Ok(Self(code))
    }

    pub fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot use reserved reason code: {0}")]
pub struct ReservedReasonCode(pub i32);

/// The error returned by every client and server operation.
#[derive(Debug, Error)]
pub enum QuasiHttpError {
    #[error("{message}")]
    Protocol {
        message: String,
        reason: ReasonCode,
        #[source]
        source: Option<BoxError>,
    },

    #[error("missing dependency: {0}")]
    MissingDependency(String),

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error(transparent)]
    Other(BoxError),
}

impl QuasiHttpError {
    pub fn protocol<S: ToString>(message: S, reason: ReasonCode) -> Self {
        Self::Protocol { message: message.to_string(), reason, source: None }
    }

    pub fn protocol_with_source<S, E>(message: S, reason: ReasonCode, source: E) -> Self
    where
        S: ToString,
        E: Into<BoxError>,
    {
        Self::Protocol { message: message.to_string(), reason, source: Some(source.into()) }
    }

    pub fn general<S: ToString>(message: S) -> Self {
        Self::protocol(message, ReasonCode::GENERAL)
    }

    pub fn protocol_violation<S: ToString>(message: S) -> Self {
        Self::protocol(message, ReasonCode::PROTOCOL_VIOLATION)
    }

    pub fn message_length_limit_exceeded<S: ToString>(message: S) -> Self {
        Self::protocol(message, ReasonCode::MESSAGE_LENGTH_LIMIT_EXCEEDED)
    }

    pub fn missing_dependency<S: ToString>(name: S) -> Self {
        Self::MissingDependency(name.to_string())
    }

    /// Recovers a `QuasiHttpError` from a boxed error, keeping anything else
    /// as [`QuasiHttpError::Other`].
    pub fn from_boxed(error: BoxError) -> Self {
        match error.downcast::<QuasiHttpError>() {
            Ok(e) => *e,
            Err(other) => match other.downcast::<io::Error>() {
                Ok(e) => Self::Io { source: *e },
                Err(other) => Self::Other(other),
            },
        }
    }

    /// Reason code of a protocol error, `None` for every other kind.
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Self::Protocol { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Passes protocol errors through and wraps everything else as a
    /// [`ReasonCode::GENERAL`] error carrying `message`.
    pub(crate) fn wrap_unless_protocol(self, message: &str) -> Self {
        if self.is_protocol() {
            return self;
        }
        Self::protocol_with_source(message, ReasonCode::GENERAL, self)
    }
}

/// Failure to parse CSV, with 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("CSV parse error at row {row} column {column}: {message}")]
pub struct CsvError {
    pub row: usize,
    pub column: usize,
    pub message: String,
}

impl CsvError {
    /// Builds an error from 0-based row and column indices.
    pub(crate) fn at<S: ToString>(row_index: usize, column_index: usize, message: S) -> Self {
        Self { row: row_index + 1, column: column_index + 1, message: message.to_string() }
    }
}

/// Failure to escape or unescape a single CSV value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsvValueError {
    #[error("missing enclosing double quotes around csv value: {0}")]
    MissingEnclosingQuotes(String),

    #[error("unescaped double quote found in csv value: {0}")]
    UnescapedQuote(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegerParseError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid 32-bit integer: {0}")]
    OutOfRange32(String),

    #[error("invalid 48-bit integer: {0}")]
    OutOfRange48(String),
}

/// Failures raised by the body streaming filters and TLV primitives.
///
/// These surface to callers as [`io::Error`]s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("unexpected end of read")]
    UnexpectedEndOfRead,

    #[error("stream size exceeds limit of {limit} bytes")]
    LimitExceeded { limit: u64 },

    #[error("unexpected tag: expected {expected} but found {found}")]
    UnexpectedTag { expected: i32, found: i32 },

    #[error("invalid tag: {0}")]
    InvalidTag(i32),

    #[error("invalid tag value length: {0}")]
    InvalidLength(i64),
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        let kind = match e {
            StreamError::UnexpectedEndOfRead => io::ErrorKind::UnexpectedEof,
            StreamError::InvalidTag(_) | StreamError::InvalidLength(_) => io::ErrorKind::InvalidInput,
            StreamError::LimitExceeded { .. } | StreamError::UnexpectedTag { .. } => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, e)
    }
}

impl From<StreamError> for QuasiHttpError {
    fn from(e: StreamError) -> Self {
        Self::Io { source: e.into() }
    }
}
