use thiserror::Error;

/// Transient failure classes that warrant a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryKind {
    /// The service rejected the request with HTTP 429.
    TooManyRequests,
    /// The service's gateway timed out (HTTP 504).
    GatewayTimeout,
}

/// Errors from [`crate::remote::QueryService::query`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The service is rate limiting this client.
    #[error("too many requests sent to {url}")]
    TooManyRequests {
        /// Endpoint that rejected the request.
        url: String,
    },
    /// The service is overloaded and its gateway timed out.
    #[error("gateway timeout from {url}")]
    GatewayTimeout {
        /// Endpoint that timed out.
        url: String,
    },
    /// The service answered with another non-success status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Endpoint that was contacted.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Short error description.
        message: String,
    },
    /// The request exceeded the client-side timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Endpoint that was contacted.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The request failed before a response arrived.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Endpoint that was contacted.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse query response: {message}")]
    Parse {
        /// Decoder error description.
        message: String,
    },
    /// The service accepted the query but aborted while running it.
    #[error("query failed on the server: {remark}")]
    Runtime {
        /// Remark returned by the service.
        remark: String,
    },
}

impl RemoteError {
    /// Classify the error as retryable, or `None` when it is fatal.
    #[must_use]
    pub const fn retry_kind(&self) -> Option<RetryKind> {
        match self {
            Self::TooManyRequests { .. } => Some(RetryKind::TooManyRequests),
            Self::GatewayTimeout { .. } => Some(RetryKind::GatewayTimeout),
            _ => None,
        }
    }
}
