//! The endpoint registry.
//!
//! [`EndpointRegistry::from_settings`] normalizes both configuration shapes
//! (single default endpoint, or a map of named endpoints) into one immutable
//! id → [`Endpoint`] mapping. The registry is built once at startup and shared
//! read-only, typically behind an `Arc`.
//!
//! Named endpoints take over completely: when any are configured, the
//! top-level single-endpoint settings are discarded rather than merged, even
//! if none of the named endpoints uses the default name.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use log::{info, warn};
use secrecy::SecretString;

use crate::error::ConfigError;
use crate::headers::Headers;
use crate::naming::{self, Shortcuts};
use crate::settings::{EndpointSettings, Query, Settings};

/// A named backend API target.
#[derive(Clone)]
pub struct Endpoint {
    id: String,
    url: String,
    token: Option<SecretString>,
    headers: Headers,
    query: Query,
}

impl Endpoint {
    fn from_settings(id: String, settings: EndpointSettings) -> Result<Self, ConfigError> {
        naming::validate_id(&id)?;

        let url = settings
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingUrl { id: id.clone() })?;

        url::Url::parse(&url).map_err(|source| ConfigError::InvalidUrl {
            id: id.clone(),
            url: url.clone(),
            source,
        })?;

        Ok(Self {
            id,
            url,
            token: settings.token,
            headers: settings.headers,
            query: settings.query,
        })
    }

    /// The endpoint id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The base URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The bearer token, if any.
    ///
    /// Reading the value requires an explicit `expose_secret()` call.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Default headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Default query parameters.
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Returns `true` when the endpoint holds a token or default headers.
    ///
    /// Default headers count because they commonly carry custom credentials.
    #[must_use]
    pub fn carries_secrets(&self) -> bool {
        self.token.is_some() || !self.headers.is_empty()
    }

    /// Generated call-site names for this endpoint.
    #[must_use]
    pub fn shortcuts(&self) -> Shortcuts {
        Shortcuts::for_id(self.id.clone())
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("query", &self.query)
            .finish()
    }
}

/// Immutable mapping of endpoint id to [`Endpoint`].
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: BTreeMap<String, Endpoint>,
    allow_direct: bool,
}

impl EndpointRegistry {
    /// Builds the registry from settings.
    ///
    /// Emits warning-level diagnostics in single-endpoint mode when the URL
    /// is missing (the default endpoint is then not registered) or when the
    /// endpoint has neither a token nor headers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a named endpoint lacks a URL, has an
    /// unparsable URL, or has an id that cannot become an identifier.
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let allow_direct = settings.allow_direct;

        let endpoints = if settings.has_named_endpoints() {
            if settings.url.is_some() {
                info!(
                    "Named endpoints configured; ignoring top-level settings for '{}'",
                    settings.name
                );
            }
            Self::named(settings.endpoints)?
        } else {
            Self::single(settings)?
        };

        let registry = Self {
            endpoints,
            allow_direct,
        };
        registry.warn_on_shortcut_collisions();

        Ok(registry)
    }

    fn named(
        entries: BTreeMap<String, EndpointSettings>,
    ) -> Result<BTreeMap<String, Endpoint>, ConfigError> {
        entries
            .into_iter()
            .map(|(id, settings)| Ok((id.clone(), Endpoint::from_settings(id, settings)?)))
            .collect()
    }

    fn single(settings: Settings) -> Result<BTreeMap<String, Endpoint>, ConfigError> {
        naming::validate_id(&settings.name)?;

        let mut endpoints = BTreeMap::new();

        if settings.token.is_none() && settings.headers.is_empty() {
            warn!(
                "Endpoint '{}' has no token and no custom headers. \
                 Are you sure the API does not require authentication?",
                settings.name
            );
        }

        let Some(url) = settings.url.filter(|u| !u.trim().is_empty()) else {
            warn!(
                "Missing base URL for endpoint '{}'; set `url` or {}",
                settings.name,
                crate::settings::ENV_BASE_URL
            );
            return Ok(endpoints);
        };

        let endpoint = Endpoint::from_settings(
            settings.name.clone(),
            EndpointSettings {
                url: Some(url),
                token: settings.token,
                headers: settings.headers,
                query: settings.query,
            },
        )?;
        endpoints.insert(settings.name, endpoint);

        Ok(endpoints)
    }

    fn warn_on_shortcut_collisions(&self) {
        let mut seen: BTreeMap<String, &str> = BTreeMap::new();
        for id in self.endpoints.keys() {
            match seen.entry(naming::raw_name(id)) {
                Entry::Occupied(existing) => warn!(
                    "Endpoints '{}' and '{id}' share the shortcut name {}",
                    existing.get(),
                    existing.key()
                ),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }
    }

    /// Looks up an endpoint by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Endpoint> {
        self.endpoints.get(id)
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.endpoints.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Registered endpoints in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    /// Number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` when no endpoint is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Returns `true` when any endpoint holds a token or default headers.
    #[must_use]
    pub fn carries_secrets(&self) -> bool {
        self.endpoints.values().any(Endpoint::carries_secrets)
    }

    /// Generated call-site names for every endpoint, in id order.
    #[must_use]
    pub fn shortcuts(&self) -> Vec<Shortcuts> {
        self.endpoints.values().map(Endpoint::shortcuts).collect()
    }

    /// A view that untrusted callers may dispatch through directly.
    ///
    /// Available only when direct dispatch is enabled in settings and no
    /// endpoint carries secrets. Otherwise callers must go through the
    /// secret boundary.
    #[must_use]
    pub fn public_view(&self) -> Option<PublicRegistry> {
        (self.allow_direct && !self.carries_secrets()).then(|| PublicRegistry(self.clone()))
    }
}

/// A registry proven to hold no tokens or default headers.
///
/// Only obtainable through [`EndpointRegistry::public_view`].
#[derive(Debug, Clone)]
pub struct PublicRegistry(EndpointRegistry);

impl PublicRegistry {
    /// The underlying secret-free registry.
    #[must_use]
    pub const fn registry(&self) -> &EndpointRegistry {
        &self.0
    }

    /// Unwraps the secret-free registry.
    #[must_use]
    pub fn into_registry(self) -> EndpointRegistry {
        self.0
    }
}
