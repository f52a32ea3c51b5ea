//! Request resolution and dispatch.
//!
//! [`resolve`] is a pure function that turns an endpoint id, a path template
//! and [`CallOptions`] into a [`ResolvedRequest`]:
//!
//! 1. look up the endpoint
//! 2. substitute path params; a `?query` written into the path is split off
//!    and `.`/`..` segments are rejected
//! 3. merge query: path query, endpoint defaults, then call-site values
//!    (later sources replace a key entirely)
//! 4. merge headers, later wins, case-insensitively:
//!    synthesized `Authorization: Bearer <token>`, endpoint headers, call headers
//! 5. default the method to `GET`; pass the body through
//!
//! [`Dispatcher`] pairs an immutable registry with a [`Transport`] and issues
//! exactly one outbound call per dispatch.
//!
//! # Security
//!
//! This is the only place that reads endpoint tokens. A `Dispatcher` built
//! from a full [`EndpointRegistry`] belongs on the trusted side of the secret
//! boundary.

use std::sync::Arc;

use log::debug;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use partyline_common::headers::{Headers, merge_headers};
use partyline_common::path::resolve_path;
use partyline_common::{CallOptions, EndpointRegistry, PublicRegistry, ResolvedRequest};

use crate::error::ClientError;
use crate::transport::{HttpTransport, Transport, TransportResponse};

/// Resolves a logical call into a concrete request without any I/O.
///
/// # Errors
///
/// - [`ClientError::UnknownEndpoint`] if `endpoint_id` is not registered
/// - [`ClientError::MissingPathParam`] if a placeholder has no value
/// - [`ClientError::InvalidRequest`] if the method is not a valid HTTP token
///   or the path contains a `.` or `..` segment
pub fn resolve(
    registry: &EndpointRegistry,
    endpoint_id: &str,
    path: &str,
    opts: &CallOptions,
) -> Result<ResolvedRequest, ClientError> {
    let endpoint = registry
        .get(endpoint_id)
        .ok_or_else(|| ClientError::UnknownEndpoint(endpoint_id.to_string()))?;

    let path = resolve_path(path, &opts.path_params)?;
    let (path, path_query) = match path.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (path, String::new()),
    };

    // Dot segments would escape the endpoint's base path.
    if path.split('/').any(is_dot_segment) {
        return Err(ClientError::InvalidRequest(format!(
            "path '{path}' contains a dot segment"
        )));
    }

    let mut query: Vec<(String, String)> = Vec::new();
    for (name, value) in url::form_urlencoded::parse(path_query.as_bytes()) {
        if !endpoint.query().contains_key(&*name) && !opts.query.contains_key(&*name) {
            query.push((name.into_owned(), value.into_owned()));
        }
    }
    for (name, value) in endpoint.query() {
        if !opts.query.contains_key(name) {
            query.extend(value.to_strings().into_iter().map(|v| (name.clone(), v)));
        }
    }
    for (name, value) in &opts.query {
        query.extend(value.to_strings().into_iter().map(|v| (name.clone(), v)));
    }

    let bearer: Headers = endpoint
        .token()
        .map(|token| {
            (
                "Authorization".to_string(),
                format!("Bearer {}", token.expose_secret()),
            )
        })
        .into_iter()
        .collect();
    let call_headers = opts.headers.normalize();
    let headers = merge_headers([&bearer, endpoint.headers(), &call_headers]);

    let method = opts.method();
    if method.is_empty() || !method.bytes().all(is_token_byte) {
        return Err(ClientError::InvalidRequest(format!(
            "invalid method '{method}'"
        )));
    }

    Ok(ResolvedRequest {
        endpoint_id: endpoint_id.to_string(),
        base_url: endpoint.url().to_string(),
        path,
        method,
        query,
        headers,
        body: opts.body.clone(),
    })
}

/// `.` or `..`, including their percent-encoded spellings.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// RFC 9110 `tchar`.
const fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

/// Dispatches calls against an immutable registry.
///
/// Cheap to clone and safe to share across tasks: the registry is read-only
/// and the dispatcher holds no other state.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use partyline_client::Dispatcher;
/// use partyline_common::{CallOptions, EndpointRegistry, Settings};
///
/// # async fn example() -> anyhow::Result<()> {
/// let registry = EndpointRegistry::from_settings(
///     Settings::single("https://api.example.com").with_token("secret"),
/// )?;
/// let dispatcher = Dispatcher::http(Arc::new(registry), None)?;
///
/// let user: serde_json::Value = dispatcher
///     .fetch("party", "/users/:id", &CallOptions::default().with_path_param("id", 42))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<T: Transport = HttpTransport> {
    registry: Arc<EndpointRegistry>,
    transport: Arc<T>,
}

impl<T: Transport> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoints", &self.registry.ids().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Dispatcher<HttpTransport> {
    /// Creates a dispatcher backed by [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn http(
        registry: Arc<EndpointRegistry>,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, ClientError> {
        Ok(Self::new(registry, HttpTransport::new(timeout)?))
    }
}

impl<T: Transport> Dispatcher<T> {
    /// Creates a dispatcher over a full, possibly secret-bearing registry.
    pub fn new(registry: Arc<EndpointRegistry>, transport: T) -> Self {
        Self {
            registry,
            transport: Arc::new(transport),
        }
    }

    /// Creates a dispatcher over a registry proven to hold no secrets.
    pub fn public(registry: PublicRegistry, transport: T) -> Self {
        Self::new(Arc::new(registry.into_registry()), transport)
    }

    /// The registry this dispatcher resolves against.
    #[must_use]
    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Resolves a call without sending it.
    ///
    /// # Errors
    ///
    /// See [`resolve`].
    pub fn resolve(
        &self,
        endpoint_id: &str,
        path: &str,
        opts: &CallOptions,
    ) -> Result<ResolvedRequest, ClientError> {
        resolve(&self.registry, endpoint_id, path, opts)
    }

    /// Resolves and sends a call, returning the raw response whatever its status.
    ///
    /// Exactly one transport call is made; resolution errors are raised
    /// before any I/O. Transport errors propagate unchanged.
    ///
    /// # Errors
    ///
    /// Returns resolution errors (see [`resolve`]) or the transport's error.
    pub async fn dispatch(
        &self,
        endpoint_id: &str,
        path: &str,
        opts: &CallOptions,
    ) -> Result<TransportResponse, ClientError> {
        let request = self.resolve(endpoint_id, path, opts)?;
        debug!(
            "Dispatching {} {} to endpoint '{endpoint_id}'",
            request.method, request.path
        );
        self.transport.send(&request).await
    }

    /// Dispatches a call and decodes a successful JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] for non-2xx responses, a
    /// serialization error if the body does not decode, or any error from
    /// [`Self::dispatch`].
    pub async fn fetch<R: DeserializeOwned>(
        &self,
        endpoint_id: &str,
        path: &str,
        opts: &CallOptions,
    ) -> Result<R, ClientError> {
        self.dispatch(endpoint_id, path, opts)
            .await?
            .error_for_status()?
            .json()
    }
}
