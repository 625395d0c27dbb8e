use crate::protocol::Attributes;
use crate::protocol::constants::{DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_HEADERS_SIZE};

/// Parameters which affect the processing of quasi http requests and
/// responses.
///
/// Zero means "not set" for every numeric field, so that merging can fall
/// through to a fallback value.
#[derive(Debug, Clone, Default)]
pub struct ProcessingOptions {
    /// Extra information which can help a transport locate an endpoint.
    pub extra_connectivity_params: Attributes,
    /// Wait time for a send or receive to complete. Negative values mean
    /// wait forever.
    pub timeout_millis: i64,
    /// Cap on the encoded size of header sections. Non-positive values
    /// select the default of 8192 bytes, except -1 which disables the cap.
    pub max_headers_size: i64,
    /// Cap on the size of response bodies received by a client. 0 selects the
    /// default of 128 MiB; -1 disables the cap.
    pub max_response_body_size: i64,
}

impl ProcessingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timeout_millis(mut self, timeout_millis: i64) -> Self {
        self.timeout_millis = timeout_millis;
        self
    }

    #[must_use]
    pub fn with_max_headers_size(mut self, max_headers_size: i64) -> Self {
        self.max_headers_size = max_headers_size;
        self
    }

    #[must_use]
    pub fn with_max_response_body_size(mut self, max_response_body_size: i64) -> Self {
        self.max_response_body_size = max_response_body_size;
        self
    }

    #[must_use]
    pub fn with_extra_connectivity_params(mut self, params: Attributes) -> Self {
        self.extra_connectivity_params = params;
        self
    }

    /// Merges two sources of options.
    ///
    /// If either side is absent the other is returned as is. Otherwise values
    /// of `preferred` win wherever they are set, and extra connectivity
    /// parameters are combined with `preferred` entries overwriting those of
    /// `fallback`.
    pub fn merge(preferred: Option<&Self>, fallback: Option<&Self>) -> Option<Self> {
        match (preferred, fallback) {
            (None, None) => None,
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (Some(preferred), Some(fallback)) => Some(Self {
                timeout_millis: effective_non_zero(Some(preferred.timeout_millis), Some(fallback.timeout_millis), 0),
                extra_connectivity_params: effective_attributes(
                    Some(&preferred.extra_connectivity_params),
                    Some(&fallback.extra_connectivity_params),
                ),
                max_headers_size: effective_positive(
                    Some(preferred.max_headers_size),
                    Some(fallback.max_headers_size),
                    0,
                ),
                max_response_body_size: effective_non_zero(
                    Some(preferred.max_response_body_size),
                    Some(fallback.max_response_body_size),
                    0,
                ),
            }),
        }
    }

    /// The header size cap to enforce, or `None` for no cap.
    pub fn headers_size_limit(options: Option<&Self>) -> Option<u64> {
        match options.map_or(0, |o| o.max_headers_size) {
            -1 => None,
            n if n <= 0 => Some(DEFAULT_MAX_HEADERS_SIZE),
            n => Some(n.unsigned_abs()),
        }
    }

    /// The response body size cap to enforce, or `None` for no cap.
    pub fn response_body_size_limit(options: Option<&Self>) -> Option<u64> {
        match options.map_or(0, |o| o.max_response_body_size) {
            -1 => None,
            n if n <= 0 => Some(DEFAULT_MAX_BODY_SIZE),
            n => Some(n.unsigned_abs()),
        }
    }
}

/// Returns the first of `preferred` and `fallback` that is present and
/// non-zero, else `default`.
pub fn effective_non_zero(preferred: Option<i64>, fallback: Option<i64>, default: i64) -> i64 {
    [preferred, fallback].into_iter().flatten().find(|v| *v != 0).unwrap_or(default)
}

/// Returns the first of `preferred` and `fallback` that is present and
/// positive, else `default`.
pub fn effective_positive(preferred: Option<i64>, fallback: Option<i64>, default: i64) -> i64 {
    [preferred, fallback].into_iter().flatten().find(|v| *v > 0).unwrap_or(default)
}

/// Combines two attribute bags, letting `preferred` entries overwrite
/// `fallback` ones.
pub fn effective_attributes(preferred: Option<&Attributes>, fallback: Option<&Attributes>) -> Attributes {
    let mut dest = Attributes::new();
    if let Some(fallback) = fallback {
        dest.extend_from(fallback);
    }
    if let Some(preferred) = preferred {
        dest.extend_from(preferred);
    }
    dest
}
