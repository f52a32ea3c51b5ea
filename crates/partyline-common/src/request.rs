//! Fully merged, ready-to-send requests.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::headers::{Headers, find_header};

/// Header names whose values are masked by [`ResolvedRequest::redacted`].
const SENSITIVE_HEADERS: &[&str] = &["authorization", "proxy-authorization", "cookie"];

/// The outcome of resolving an endpoint id, path and call options.
///
/// Produced fresh for every call and never persisted. Resolving the same
/// inputs twice yields equal values.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRequest {
    /// Endpoint id the request was resolved from.
    pub endpoint_id: String,
    /// Endpoint base URL.
    pub base_url: String,
    /// Resolved path, relative to `base_url`.
    pub path: String,
    /// Uppercased HTTP method.
    pub method: String,
    /// Query pairs in order: endpoint defaults, then call-site values.
    pub query: Vec<(String, String)>,
    /// Merged headers.
    pub headers: Headers,
    /// Body, passed through unchanged.
    pub body: Option<serde_json::Value>,
}

impl ResolvedRequest {
    /// Joins base URL, path and query into an absolute URL.
    ///
    /// The path is appended to the base URL's path, so a base of
    /// `https://api.example.com/v1` and a path of `/users` give
    /// `https://api.example.com/v1/users`.
    ///
    /// `path` is taken as a path only; a `?` in it is encoded. Resolution
    /// moves any query written into the path over to `query` first.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed.
    pub fn url(&self) -> Result<url::Url, url::ParseError> {
        let mut url = url::Url::parse(&self.base_url)?;

        let path = self.path.trim_start_matches('/');
        if !path.is_empty() {
            let joined = format!("{}/{path}", url.path().trim_end_matches('/'));
            url.set_path(&joined);
        }

        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(url)
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// A copy with credential-bearing header values masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for (name, value) in &mut copy.headers {
            if SENSITIVE_HEADERS
                .iter()
                .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
            {
                *value = "[REDACTED]".to_string();
            }
        }
        copy
    }
}

impl fmt::Debug for ResolvedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = self.redacted();
        f.debug_struct("ResolvedRequest")
            .field("endpoint_id", &redacted.endpoint_id)
            .field("base_url", &redacted.base_url)
            .field("path", &redacted.path)
            .field("method", &redacted.method)
            .field("query", &redacted.query)
            .field("headers", &redacted.headers)
            .field("body", &redacted.body)
            .finish()
    }
}
