//! The outbound HTTP transport.
//!
//! [`Transport`] is the seam between request resolution and the network:
//! it receives a fully merged [`ResolvedRequest`] and performs exactly one
//! HTTP exchange. [`HttpTransport`] is the reqwest-backed implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;

use partyline_common::ResolvedRequest;

use crate::error::ClientError;

/// A raw upstream response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers. Repeated names keep the last value.
    pub headers: BTreeMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// The `Content-Type` header, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// The body decoded lossily as UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SerializationError`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Converts a non-2xx response into [`ClientError::Status`].
    ///
    /// # Errors
    ///
    /// Returns the status error when the response is not successful.
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Status {
                status: self.status,
                body: self.text(),
            })
        }
    }
}

/// Performs one HTTP exchange for a resolved request.
///
/// Implementations must not retry and must surface failures unchanged.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the exchange fails.
    async fn send(&self, request: &ResolvedRequest) -> Result<TransportResponse, ClientError>;
}

/// reqwest-backed [`Transport`].
///
/// String bodies are sent as raw text; any other JSON value is serialized as
/// JSON with `Content-Type: application/json` unless the request already
/// sets a content type.
#[derive(Clone)]
pub struct HttpTransport {
    client: ClientWithMiddleware,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Creates a transport with an optional total request timeout.
    ///
    /// `None` means no timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Option<Duration>) -> Result<Self, ClientError> {
        let builder = reqwest::Client::builder();
        let client = match timeout {
            Some(timeout) => builder.timeout(timeout).build()?,
            None => builder.build()?,
        };
        Ok(Self::from_client(
            reqwest_middleware::ClientBuilder::new(client).build(),
        ))
    }

    /// Wraps an existing middleware client, e.g. one with tracing middleware.
    #[must_use]
    pub const fn from_client(client: ClientWithMiddleware) -> Self {
        Self { client }
    }

    fn build_request(&self, request: &ResolvedRequest) -> Result<reqwest::Request, ClientError> {
        let url = request
            .url()
            .map_err(|e| ClientError::InvalidRequest(format!("invalid URL: {e}")))?;

        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| ClientError::InvalidRequest(format!("invalid method '{}'", request.method)))?;

        let headers = to_header_map(&request.headers)?;
        let has_content_type = headers.contains_key(CONTENT_TYPE);

        let mut builder = self.client.request(method, url).headers(headers);

        builder = match &request.body {
            None => builder,
            Some(serde_json::Value::String(text)) => builder.body(text.clone()),
            Some(value) => {
                let bytes = serde_json::to_vec(value)?;
                if has_content_type {
                    builder.body(bytes)
                } else {
                    builder.header(CONTENT_TYPE, "application/json").body(bytes)
                }
            }
        };

        builder.build().map_err(ClientError::from_reqwest)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ResolvedRequest) -> Result<TransportResponse, ClientError> {
        let outbound = self.build_request(request)?;
        debug!(
            "Sending {} {} for endpoint '{}'",
            outbound.method(),
            outbound.url().path(),
            request.endpoint_id
        );

        let response = self
            .client
            .execute(outbound)
            .await
            .map_err(ClientError::from_middleware)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(ClientError::from_reqwest)?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

fn to_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ClientError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ClientError::InvalidRequest(format!("invalid header name '{name}'")))?;
        let mut value = HeaderValue::from_str(value).map_err(|_| {
            ClientError::InvalidRequest(format!("invalid value for header '{name}'"))
        })?;
        if name == reqwest::header::AUTHORIZATION {
            value.set_sensitive(true);
        }
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use partyline_common::Headers;
    use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolved(base_url: &str) -> ResolvedRequest {
        ResolvedRequest {
            endpoint_id: "e1".to_string(),
            base_url: base_url.to_string(),
            path: "/items/7".to_string(),
            method: "GET".to_string(),
            query: vec![("page".to_string(), "2".to_string())],
            headers: Headers::from([("Authorization".to_string(), "Bearer T".to_string())]),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_sends_method_path_query_and_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items/7"))
            .and(query_param("page", "2"))
            .and(header("authorization", "Bearer T"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 7})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(None).unwrap();
        let response = transport.send(&resolved(&mock_server.uri())).await.unwrap();

        assert!(response.is_success());
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["id"], 7);
    }

    #[tokio::test]
    async fn test_json_body_sets_content_type() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"title": "hi"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut request = resolved(&mock_server.uri());
        request.method = "POST".to_string();
        request.body = Some(serde_json::json!({"title": "hi"}));

        let response = HttpTransport::new(None).unwrap().send(&request).await.unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_string_body_is_sent_raw() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(body_string("plain text"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut request = resolved(&mock_server.uri());
        request.method = "PUT".to_string();
        request.body = Some(serde_json::Value::String("plain text".to_string()));

        let response = HttpTransport::new(None).unwrap().send(&request).await.unwrap();
        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn test_non_2xx_is_returned_not_raised() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&mock_server)
            .await;

        let response = HttpTransport::new(None)
            .unwrap()
            .send(&resolved(&mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.text(), "nope");

        let err = response.error_for_status().unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 404, ref body } if body == "nope"));
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(Some(Duration::from_millis(50))).unwrap();
        let err = transport
            .send(&resolved(&mock_server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::TimeoutError));
    }

    #[tokio::test]
    async fn test_invalid_method_fails_before_io() {
        let mut request = resolved("http://127.0.0.1:9");
        request.method = "GE T".to_string();

        let err = HttpTransport::new(None).unwrap().send(&request).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_invalid_header_fails_before_io() {
        let mut request = resolved("http://127.0.0.1:9");
        request
            .headers
            .insert("Bad Header".to_string(), "x".to_string());

        let err = HttpTransport::new(None).unwrap().send(&request).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }
}
