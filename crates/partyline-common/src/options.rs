//! Per-call options.

use serde::{Deserialize, Deserializer, Serialize};
use typed_builder::TypedBuilder;

use crate::headers::HeaderInput;
use crate::path::PathParams;
use crate::settings::Query;
use crate::value::{ParamValue, QueryValue};

/// HTTP method used when a call does not specify one.
pub const DEFAULT_METHOD: &str = "GET";

/// Options for a single call.
///
/// Transient: created by the caller and consumed by one dispatch.
///
/// # Examples
///
/// ```
/// use partyline_common::CallOptions;
///
/// let opts = CallOptions::builder()
///     .method("POST")
///     .body(serde_json::json!({"title": "hello"}))
///     .build()
///     .with_path_param("id", 42)
///     .with_header("X-Request-Id", "abc");
///
/// assert_eq!(opts.method(), "POST");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct CallOptions {
    /// Values for path template placeholders.
    #[builder(default)]
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "PathParams::is_empty"
    )]
    pub path_params: PathParams,

    /// Call-site query parameters; these win over endpoint defaults.
    #[builder(default)]
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Query::is_empty"
    )]
    pub query: Query,

    /// Call-site headers; these win over endpoint headers and the bearer token.
    #[builder(default, setter(into))]
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HeaderInput::is_empty"
    )]
    pub headers: HeaderInput,

    /// HTTP method. Defaults to `GET`.
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Request body, passed through unchanged.
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// Reads an explicit `null` as the field's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CallOptions {
    /// The effective method, uppercased.
    #[must_use]
    pub fn method(&self) -> String {
        self.method
            .as_deref()
            .map_or_else(|| DEFAULT_METHOD.to_string(), str::to_ascii_uppercase)
    }

    /// Adds a path param.
    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Adds a call-site query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Adds a call-site header.
    ///
    /// Non-map header input is normalized into a map first.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut map = match self.headers {
            HeaderInput::Map(map) => map,
            other => other.normalize(),
        };
        map.insert(name.into(), value.into());
        self.headers = HeaderInput::Map(map);
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_method_defaults_to_get() {
        assert_eq!(CallOptions::default().method(), "GET");
        assert_eq!(CallOptions::builder().method("patch").build().method(), "PATCH");
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let opts = CallOptions::default()
            .with_path_param("id", 42)
            .with_query("page", 2)
            .with_header("X-Trace", "t");
        let json = serde_json::to_value(&opts).unwrap();

        assert_eq!(json["pathParams"]["id"], 42);
        assert_eq!(json["query"]["page"], 2);
        assert_eq!(json["headers"]["X-Trace"], "t");
        assert!(json.get("method").is_none());
        assert!(json.get("body").is_none());
    }

    #[test]
    fn test_deserialize_from_wire() {
        let opts: CallOptions = serde_json::from_str(
            r#"{
                "pathParams": {"id": "abc"},
                "query": {"tags": ["x", "y"]},
                "headers": [["A", "1"], ["A", "2"]],
                "method": "post",
                "body": {"k": "v"}
            }"#,
        )
        .unwrap();

        assert_eq!(opts.path_params["id"].to_string(), "abc");
        assert_eq!(opts.query["tags"].to_strings(), vec!["x", "y"]);
        assert_eq!(opts.headers.normalize()["A"], "2");
        assert_eq!(opts.method(), "POST");
        assert_eq!(opts.body.unwrap()["k"], "v");
    }

    #[test]
    fn test_empty_object_is_default() {
        let opts: CallOptions = serde_json::from_str("{}").unwrap();
        assert!(opts.path_params.is_empty());
        assert!(opts.headers.is_empty());
        assert!(opts.body.is_none());
    }

    #[test]
    fn test_null_fields_are_default() {
        let opts: CallOptions = serde_json::from_str(
            r#"{"pathParams": null, "query": null, "headers": null, "method": null, "body": null}"#,
        )
        .unwrap();

        assert!(opts.path_params.is_empty());
        assert!(opts.query.is_empty());
        assert!(opts.headers.normalize().is_empty());
        assert_eq!(opts.method(), "GET");
        assert!(opts.body.is_none());
    }

    #[test]
    fn test_with_header_on_pairs_input() {
        let opts = CallOptions::builder()
            .headers(vec![("A", "1")])
            .build()
            .with_header("B", "2");
        let headers = opts.headers.normalize();
        assert_eq!(headers["A"], "1");
        assert_eq!(headers["B"], "2");
    }
}
