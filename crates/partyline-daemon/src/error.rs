//! Error types for the partyline daemon.

use axum::Json;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use partyline_client::ClientError;
use partyline_common::{BOUNDARY_ERROR_HEADER, BoundaryErrorBody, ConfigError};

/// Errors that can occur in the daemon.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DaemonError {
    /// I/O error (socket binding, signal registration).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be loaded or the registry could not be built.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The boundary request body is not a valid call.
    #[error("Invalid boundary request: {0}")]
    InvalidBody(String),

    /// Dispatching the call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Result type alias using `DaemonError`.
pub type Result<T> = std::result::Result<T, DaemonError>;

impl DaemonError {
    /// HTTP status and machine-readable kind for a boundary response.
    pub const fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidBody(_) => (StatusCode::BAD_REQUEST, "invalid_body"),
            Self::Client(ClientError::UnknownEndpoint(_)) => {
                (StatusCode::NOT_FOUND, "unknown_endpoint")
            }
            Self::Client(ClientError::MissingPathParam { .. }) => {
                (StatusCode::BAD_REQUEST, "missing_path_param")
            }
            Self::Client(ClientError::InvalidRequest(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_request")
            }
            Self::Client(ClientError::TimeoutError) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            Self::Client(
                ClientError::NetworkError(_)
                | ClientError::MiddlewareError(_)
                | ClientError::Boundary { .. },
            ) => (StatusCode::BAD_GATEWAY, "network"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }

    /// Message sent to the caller.
    ///
    /// Upstream transport failures get a fixed message; their detail stays in
    /// the boundary's log.
    pub fn public_message(&self) -> String {
        match self {
            Self::Client(ClientError::NetworkError(_) | ClientError::MiddlewareError(_)) => {
                "Upstream request failed".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for DaemonError {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();
        let body = BoundaryErrorBody {
            error: self.public_message(),
            kind: kind.to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        response.headers_mut().insert(
            HeaderName::from_static(BOUNDARY_ERROR_HEADER),
            HeaderValue::from_static(kind),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                DaemonError::Client(ClientError::UnknownEndpoint("x".to_string())),
                StatusCode::NOT_FOUND,
                "unknown_endpoint",
            ),
            (
                DaemonError::Client(ClientError::MissingPathParam {
                    name: "id".to_string(),
                }),
                StatusCode::BAD_REQUEST,
                "missing_path_param",
            ),
            (
                DaemonError::Client(ClientError::InvalidRequest("bad".to_string())),
                StatusCode::BAD_REQUEST,
                "invalid_request",
            ),
            (
                DaemonError::Client(ClientError::TimeoutError),
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
            ),
            (
                DaemonError::InvalidBody("eof".to_string()),
                StatusCode::BAD_REQUEST,
                "invalid_body",
            ),
        ];

        for (err, status, kind) in cases {
            assert_eq!(err.classify(), (status, kind), "{err}");
        }
    }

    #[test]
    fn test_pre_flight_messages_keep_detail() {
        let err = DaemonError::Client(ClientError::MissingPathParam {
            name: "id".to_string(),
        });
        assert_eq!(err.public_message(), "Missing path parameter 'id'");
    }

    #[test]
    fn test_response_carries_marker_header() {
        let response =
            DaemonError::Client(ClientError::UnknownEndpoint("nope".to_string())).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(BOUNDARY_ERROR_HEADER).unwrap(),
            "unknown_endpoint"
        );
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
