//! Error types for the client library.

use partyline_common::PathError;
use thiserror::Error;

/// Errors that can occur while resolving or dispatching a call.
///
/// Per-call errors are never retried and are always surfaced to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The call references an endpoint id absent from the registry.
    ///
    /// Raised before any network I/O.
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// A path template placeholder has no value.
    ///
    /// Raised before any network I/O.
    #[error("Missing path parameter '{name}'")]
    MissingPathParam {
        /// Name of the unresolved placeholder.
        name: String,
    },

    /// The call cannot be turned into a valid HTTP request.
    ///
    /// Invalid method, header name/value, or URL.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP request failure.
    ///
    /// Indicates issues like DNS resolution, connection failures, or socket errors.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Middleware layer error.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    /// Request timeout.
    #[error("Timeout error")]
    TimeoutError,

    /// The upstream answered with a non-2xx status.
    ///
    /// Only produced by the `fetch` helpers; `dispatch` passes every status through.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Upstream status code.
        status: u16,
        /// Upstream body, decoded lossily as UTF-8.
        body: String,
    },

    /// JSON serialization or deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The secret boundary rejected the call before reaching the upstream.
    #[error("Boundary error ({status}): {message}")]
    Boundary {
        /// Status returned by the boundary.
        status: u16,
        /// Message returned by the boundary.
        message: String,
        /// Machine-readable kind returned by the boundary.
        kind: String,
    },
}

impl ClientError {
    /// Check if this error happened before any network I/O.
    pub const fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            Self::UnknownEndpoint(_) | Self::MissingPathParam { .. } | Self::InvalidRequest(_)
        )
    }

    /// The HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Boundary { status, .. } => Some(*status),
            Self::NetworkError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Classifies a reqwest failure, separating timeouts.
    ///
    /// The request URL is dropped: it carries the endpoint's base URL and
    /// default query values, which must not reach an untrusted caller.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError
        } else {
            Self::NetworkError(err.without_url())
        }
    }

    /// Classifies a middleware failure, separating timeouts.
    pub(crate) fn from_middleware(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => Self::from_reqwest(e),
            other => Self::MiddlewareError(other),
        }
    }
}

impl From<PathError> for ClientError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::MissingPathParam { name } => Self::MissingPathParam { name },
        }
    }
}
