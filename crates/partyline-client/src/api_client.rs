//! Untrusted-side call interface.
//!
//! An [`ApiClient`] either forwards every call to the secret boundary or,
//! when the registry has been proven free of secrets, dispatches directly.
//! The boundary variant never holds an [`EndpointRegistry`], so there is no
//! path from it to a token.

use std::time::Duration;

use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use url::Url;

use partyline_common::{
    BOUNDARY_ERROR_HEADER, BOUNDARY_ROUTE, BoundaryErrorBody, BoundaryRequest, CallOptions,
    EndpointRegistry, PublicRegistry, Shortcuts,
};

use crate::dispatch::Dispatcher;
use crate::error::ClientError;
use crate::transport::{HttpTransport, Transport, TransportResponse};

/// Forwards calls to a secret boundary over HTTP.
#[derive(Clone)]
pub struct BoundaryClient {
    client: ClientWithMiddleware,
    route: Url,
}

impl std::fmt::Debug for BoundaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryClient")
            .field("route", &self.route.as_str())
            .finish_non_exhaustive()
    }
}

impl BoundaryClient {
    /// Creates a client for the boundary served at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if `base_url` is not a valid
    /// URL, or an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let route = Url::parse(base_url)
            .and_then(|base| base.join(BOUNDARY_ROUTE))
            .map_err(|e| ClientError::InvalidRequest(format!("invalid boundary URL: {e}")))?;

        let builder = reqwest::Client::builder();
        let client = match timeout {
            Some(timeout) => builder.timeout(timeout).build()?,
            None => builder.build()?,
        };

        Ok(Self {
            client: reqwest_middleware::ClientBuilder::new(client).build(),
            route,
        })
    }

    /// The full URL of the boundary route.
    #[must_use]
    pub const fn route(&self) -> &Url {
        &self.route
    }

    /// Forwards one call to the boundary.
    ///
    /// Upstream responses come back unchanged, non-2xx included. Failures
    /// the boundary produced itself become [`ClientError::Boundary`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Boundary`] for boundary-side failures, or a
    /// network error if the boundary cannot be reached.
    pub async fn call(
        &self,
        endpoint_id: &str,
        path: &str,
        opts: &CallOptions,
    ) -> Result<TransportResponse, ClientError> {
        let payload = serde_json::to_vec(&BoundaryRequest::new(endpoint_id, path, opts.clone()))?;
        debug!("Forwarding call for endpoint '{endpoint_id}' to {}", self.route);

        let response = self
            .client
            .post(self.route.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(ClientError::from_middleware)?;

        let status = response.status().as_u16();
        let boundary_kind = response
            .headers()
            .get(BOUNDARY_ERROR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
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

        if let Some(kind) = boundary_kind {
            let message = serde_json::from_slice::<BoundaryErrorBody>(&body)
                .map_or_else(|_| String::from_utf8_lossy(&body).into_owned(), |b| b.error);
            return Err(ClientError::Boundary {
                status,
                message,
                kind,
            });
        }

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

enum Route<T: Transport> {
    Boundary(BoundaryClient),
    Direct(Dispatcher<T>),
}

/// Call interface for code that must not see endpoint secrets.
///
/// # Examples
///
/// ```no_run
/// use partyline_client::ApiClient;
/// use partyline_common::CallOptions;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = ApiClient::boundary("http://127.0.0.1:3939")?;
/// let posts = client.endpoint("cms");
///
/// let post: serde_json::Value = posts
///     .fetch("/posts/:id", &CallOptions::default().with_path_param("id", 1))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ApiClient<T: Transport = HttpTransport> {
    route: Route<T>,
}

impl<T: Transport> std::fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.route {
            Route::Boundary(client) => f.debug_tuple("ApiClient::Boundary").field(client).finish(),
            Route::Direct(dispatcher) => f
                .debug_tuple("ApiClient::Direct")
                .field(dispatcher)
                .finish(),
        }
    }
}

impl ApiClient<HttpTransport> {
    /// Forwards every call to the boundary at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is invalid or the HTTP client cannot be built.
    pub fn boundary(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self::from_boundary(BoundaryClient::new(base_url, None)?))
    }

    /// Chooses the call path for `registry`.
    ///
    /// Dispatches directly only when [`EndpointRegistry::public_view`] is
    /// available; otherwise forwards to the boundary at `boundary_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected HTTP client cannot be built.
    pub fn for_registry(
        registry: &EndpointRegistry,
        boundary_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        match registry.public_view() {
            Some(public) => Ok(Self::direct(public, HttpTransport::new(timeout)?)),
            None => Ok(Self::from_boundary(BoundaryClient::new(
                boundary_url,
                timeout,
            )?)),
        }
    }
}

impl<T: Transport> ApiClient<T> {
    /// Wraps an existing boundary client.
    #[must_use]
    pub const fn from_boundary(client: BoundaryClient) -> Self {
        Self {
            route: Route::Boundary(client),
        }
    }

    /// Dispatches directly against a registry proven to hold no secrets.
    pub fn direct(registry: PublicRegistry, transport: T) -> Self {
        Self {
            route: Route::Direct(Dispatcher::public(registry, transport)),
        }
    }

    /// Returns `true` when calls bypass the boundary.
    #[must_use]
    pub const fn is_direct(&self) -> bool {
        matches!(self.route, Route::Direct(_))
    }

    /// Returns a handle bound to one endpoint id.
    ///
    /// The id is not checked here; unknown ids fail on the first call.
    pub fn endpoint(&self, id: impl Into<String>) -> EndpointHandle<'_, T> {
        EndpointHandle {
            client: self,
            id: id.into(),
        }
    }

    /// Calls an endpoint and returns the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns resolution, boundary or transport errors.
    pub async fn call(
        &self,
        endpoint_id: &str,
        path: &str,
        opts: &CallOptions,
    ) -> Result<TransportResponse, ClientError> {
        match &self.route {
            Route::Boundary(client) => client.call(endpoint_id, path, opts).await,
            Route::Direct(dispatcher) => dispatcher.dispatch(endpoint_id, path, opts).await,
        }
    }

    /// Calls an endpoint and decodes a successful JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] for non-2xx responses, plus everything
    /// [`Self::call`] can return.
    pub async fn fetch<R: DeserializeOwned>(
        &self,
        endpoint_id: &str,
        path: &str,
        opts: &CallOptions,
    ) -> Result<R, ClientError> {
        self.call(endpoint_id, path, opts)
            .await?
            .error_for_status()?
            .json()
    }
}

/// A call handle bound to one endpoint, the runtime form of a shortcut.
#[derive(Debug)]
pub struct EndpointHandle<'a, T: Transport = HttpTransport> {
    client: &'a ApiClient<T>,
    id: String,
}

impl<T: Transport> EndpointHandle<'_, T> {
    /// The endpoint id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The call-site names generated for this endpoint.
    #[must_use]
    pub fn shortcuts(&self) -> Shortcuts {
        Shortcuts::for_id(self.id.clone())
    }

    /// See [`ApiClient::call`].
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn call(&self, path: &str, opts: &CallOptions) -> Result<TransportResponse, ClientError> {
        self.client.call(&self.id, path, opts).await
    }

    /// See [`ApiClient::fetch`].
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn fetch<R: DeserializeOwned>(
        &self,
        path: &str,
        opts: &CallOptions,
    ) -> Result<R, ClientError> {
        self.client.fetch(&self.id, path, opts).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use partyline_common::{EndpointSettings, Settings};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_boundary_forwards_call() {
        let boundary = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BOUNDARY_ROUTE))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "endpointId": "cms",
                "path": "/posts/:id",
                "opts": {"pathParams": {"id": 1}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
            .expect(1)
            .mount(&boundary)
            .await;

        let client = ApiClient::boundary(&boundary.uri()).unwrap();
        assert!(!client.is_direct());

        let post: serde_json::Value = client
            .endpoint("cms")
            .fetch("/posts/:id", &CallOptions::default().with_path_param("id", 1))
            .await
            .unwrap();
        assert_eq!(post["id"], 1);
    }

    #[tokio::test]
    async fn test_boundary_error_is_classified() {
        let boundary = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BOUNDARY_ROUTE))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header(BOUNDARY_ERROR_HEADER, "unknown_endpoint")
                    .set_body_json(serde_json::json!({
                        "error": "Unknown endpoint: nope",
                        "kind": "unknown_endpoint"
                    })),
            )
            .mount(&boundary)
            .await;

        let client = ApiClient::boundary(&boundary.uri()).unwrap();
        let err = client
            .call("nope", "/x", &CallOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Boundary { status: 404, ref message, ref kind }
                if kind == "unknown_endpoint" && message == "Unknown endpoint: nope"
        ));
    }

    #[tokio::test]
    async fn test_upstream_status_passes_through() {
        let boundary = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "post not found",
                "kind": "upstream"
            })))
            .mount(&boundary)
            .await;

        let client = ApiClient::boundary(&boundary.uri()).unwrap();
        let response = client
            .call("cms", "/posts/9", &CallOptions::default())
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_invalid_boundary_url() {
        assert!(matches!(
            ApiClient::boundary("not a url"),
            Err(ClientError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_route_is_joined_onto_base() {
        let client = BoundaryClient::new("http://127.0.0.1:3939", None).unwrap();
        assert_eq!(
            client.route().as_str(),
            "http://127.0.0.1:3939/api/__partyline__"
        );
    }

    #[test]
    fn test_secret_registry_goes_through_boundary() {
        let registry = EndpointRegistry::from_settings(
            Settings::single("https://api.x")
                .with_token("T")
                .with_allow_direct(true),
        )
        .unwrap();
        let client = ApiClient::for_registry(&registry, "http://127.0.0.1:3939", None).unwrap();
        assert!(!client.is_direct());
    }

    #[test]
    fn test_public_registry_without_opt_in_goes_through_boundary() {
        let registry = EndpointRegistry::from_settings(
            Settings::default().with_endpoint("open", EndpointSettings::new("https://open.x")),
        )
        .unwrap();
        let client = ApiClient::for_registry(&registry, "http://127.0.0.1:3939", None).unwrap();
        assert!(!client.is_direct());
    }

    #[tokio::test]
    async fn test_public_registry_dispatches_directly() {
        let upstream = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/todos/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
            .expect(1)
            .mount(&upstream)
            .await;

        let registry = EndpointRegistry::from_settings(
            Settings::default()
                .with_endpoint("open", EndpointSettings::new(upstream.uri()))
                .with_allow_direct(true),
        )
        .unwrap();
        let client = ApiClient::for_registry(&registry, "http://127.0.0.1:9", None).unwrap();
        assert!(client.is_direct());

        let handle = client.endpoint("open");
        assert_eq!(handle.shortcuts().raw, "$open");

        let todo: serde_json::Value = handle
            .fetch("/todos/:id", &CallOptions::default().with_path_param("id", 1))
            .await
            .unwrap();
        assert_eq!(todo["id"], 1);
    }
}
