//! Wire contract of the secret boundary.
//!
//! Untrusted callers `POST` a [`BoundaryRequest`] to [`BOUNDARY_ROUTE`]. The
//! boundary dispatches it with the full registry and returns the upstream
//! status and body unchanged. Failures that happen before the upstream call
//! are reported as a [`BoundaryErrorBody`].

use serde::{Deserialize, Serialize};

use crate::options::{CallOptions, null_as_default};

/// The reserved route of the secret boundary.
pub const BOUNDARY_ROUTE: &str = "/api/__partyline__";

/// Response header set on errors the boundary produced itself.
///
/// Its value is the error kind. Upstream responses never carry it, so a
/// client can tell a boundary failure from an upstream non-2xx body.
pub const BOUNDARY_ERROR_HEADER: &str = "x-partyline-error";

/// Body of a boundary call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryRequest {
    /// Target endpoint id.
    pub endpoint_id: String,
    /// Path template relative to the endpoint's base URL.
    pub path: String,
    /// Call options.
    #[serde(default, deserialize_with = "null_as_default")]
    pub opts: CallOptions,
}

impl BoundaryRequest {
    /// Creates a boundary request.
    pub fn new(endpoint_id: impl Into<String>, path: impl Into<String>, opts: CallOptions) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            path: path.into(),
            opts,
        }
    }
}

/// Error body returned by the boundary for failures it produced itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryErrorBody {
    /// Human-readable message. Never contains secrets.
    pub error: String,
    /// Machine-readable kind, e.g. `unknown_endpoint`.
    pub kind: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_request_wire_keys() {
        let request = BoundaryRequest::new(
            "cms",
            "/posts/:id",
            CallOptions::default().with_path_param("id", 1),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["endpointId"], "cms");
        assert_eq!(json["path"], "/posts/:id");
        assert_eq!(json["opts"]["pathParams"]["id"], 1);
    }

    #[test]
    fn test_opts_are_optional() {
        let request: BoundaryRequest =
            serde_json::from_str(r#"{"endpointId": "cms", "path": "/health"}"#).unwrap();
        assert_eq!(request.endpoint_id, "cms");
        assert!(request.opts.body.is_none());
    }

    #[test]
    fn test_null_opts_are_default() {
        let request: BoundaryRequest = serde_json::from_str(
            r#"{"endpointId": "cms", "path": "/health", "opts": null}"#,
        )
        .unwrap();
        assert!(request.opts.headers.is_empty());

        let request: BoundaryRequest = serde_json::from_str(
            r#"{"endpointId": "cms", "path": "/health",
                "opts": {"headers": null, "query": null, "pathParams": null}}"#,
        )
        .unwrap();
        assert!(request.opts.query.is_empty());
        assert!(request.opts.path_params.is_empty());
    }
}
