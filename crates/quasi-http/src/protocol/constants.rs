//! Well-known method names, status codes and environment keys.

/// Environment key for the local endpoint of a connection.
pub const ENV_KEY_LOCAL_PEER_ENDPOINT: &str = "kabomu.local_peer_endpoint";
/// Environment key for the remote endpoint of a connection.
pub const ENV_KEY_REMOTE_PEER_ENDPOINT: &str = "kabomu.remote_peer_endpoint";

pub const METHOD_CONNECT: &str = "CONNECT";
pub const METHOD_DELETE: &str = "DELETE";
pub const METHOD_GET: &str = "GET";
pub const METHOD_HEAD: &str = "HEAD";
pub const METHOD_OPTIONS: &str = "OPTIONS";
pub const METHOD_PATCH: &str = "PATCH";
pub const METHOD_POST: &str = "POST";
pub const METHOD_PUT: &str = "PUT";
pub const METHOD_TRACE: &str = "TRACE";

pub const STATUS_CODE_OK: i32 = 200;
pub const STATUS_CODE_CLIENT_ERROR_BAD_REQUEST: i32 = 400;
pub const STATUS_CODE_CLIENT_ERROR_UNAUTHORIZED: i32 = 401;
pub const STATUS_CODE_CLIENT_ERROR_FORBIDDEN: i32 = 403;
pub const STATUS_CODE_CLIENT_ERROR_NOT_FOUND: i32 = 404;
pub const STATUS_CODE_CLIENT_ERROR_METHOD_NOT_ALLOWED: i32 = 405;
pub const STATUS_CODE_CLIENT_ERROR_PAYLOAD_TOO_LARGE: i32 = 413;
pub const STATUS_CODE_CLIENT_ERROR_URI_TOO_LONG: i32 = 414;
pub const STATUS_CODE_CLIENT_ERROR_UNSUPPORTED_MEDIA_TYPE: i32 = 415;
pub const STATUS_CODE_CLIENT_ERROR_UNPROCESSABLE_ENTITY: i32 = 422;
pub const STATUS_CODE_CLIENT_ERROR_TOO_MANY_REQUESTS: i32 = 429;
pub const STATUS_CODE_SERVER_ERROR: i32 = 500;

/// Default cap on the encoded size of a header section.
pub const DEFAULT_MAX_HEADERS_SIZE: u64 = 8_192;

/// Default cap on the size of a response body and on
/// [`MaxLengthReader`](crate::codec::MaxLengthReader).
pub const DEFAULT_MAX_BODY_SIZE: u64 = 134_217_728;
