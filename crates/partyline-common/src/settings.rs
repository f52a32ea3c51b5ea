//! Configuration input.
//!
//! Settings are read once at startup and turned into an
//! [`EndpointRegistry`](crate::registry::EndpointRegistry). Files may be TOML,
//! YAML or JSON; the format is picked from the file extension.
//!
//! ## Single endpoint
//!
//! ```toml
//! name = "cms"
//! url = "https://cms.example.com/api"
//! token = "secret"
//! headers = { "X-Client" = "partyline" }
//! ```
//!
//! ## Multiple endpoints
//!
//! ```toml
//! [endpoints.json-placeholder]
//! url = "https://jsonplaceholder.typicode.com"
//!
//! [endpoints.cms]
//! url = "https://cms.example.com/api"
//! token = "secret"
//! query = { locale = "en" }
//! ```
//!
//! When `endpoints` is non-empty the top-level `name`, `url`, `token`,
//! `headers` and `query` are ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::headers::Headers;
use crate::value::QueryValue;

/// Environment variable supplying the default endpoint's base URL.
pub const ENV_BASE_URL: &str = "PARTYLINE_BASE_URL";
/// Environment variable supplying the default endpoint's bearer token.
pub const ENV_TOKEN: &str = "PARTYLINE_TOKEN";
/// Environment variable overriding the config file location.
pub const ENV_CONFIG: &str = "PARTYLINE_CONFIG";

/// Default query parameters keyed by name.
pub type Query = BTreeMap<String, QueryValue>;

/// Top-level settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Id of the default endpoint in single-endpoint mode.
    #[serde(default = "default_name")]
    pub name: String,

    /// Base URL of the default endpoint.
    #[serde(default)]
    pub url: Option<String>,

    /// Bearer token of the default endpoint.
    #[serde(default, skip_serializing)]
    pub token: Option<SecretString>,

    /// Headers sent with every request to the default endpoint.
    #[serde(default)]
    pub headers: Headers,

    /// Query parameters sent with every request to the default endpoint.
    #[serde(default)]
    pub query: Query,

    /// Named endpoints. Disables single-endpoint mode when non-empty.
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointSettings>,

    /// Let untrusted callers dispatch directly when no endpoint holds secrets.
    #[serde(default)]
    pub allow_direct: bool,

    /// Outbound request timeout in seconds. `None` means no timeout.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Secret boundary server settings.
    #[serde(default)]
    pub server: ServerSettings,
}

/// Settings for one named endpoint.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct EndpointSettings {
    /// Base URL. Required.
    #[serde(default)]
    pub url: Option<String>,

    /// Bearer token.
    #[serde(default, skip_serializing)]
    pub token: Option<SecretString>,

    /// Default headers.
    #[serde(default)]
    pub headers: Headers,

    /// Default query parameters.
    #[serde(default)]
    pub query: Query,
}

/// Secret boundary server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Socket address the boundary listens on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_name() -> String {
    "party".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:3939".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: default_name(),
            url: None,
            token: None,
            headers: Headers::new(),
            query: Query::new(),
            endpoints: BTreeMap::new(),
            allow_direct: false,
            timeout_seconds: None,
            server: ServerSettings::default(),
        }
    }
}

// Tokens stay out of debug output.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("query", &self.query)
            .field("endpoints", &self.endpoints)
            .field("allow_direct", &self.allow_direct)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("server", &self.server)
            .finish()
    }
}

impl fmt::Debug for EndpointSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointSettings")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("query", &self.query)
            .finish()
    }
}

impl Settings {
    /// Settings for a single default endpoint.
    pub fn single(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Sets the default endpoint's token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Sets the default endpoint's id.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a header to the default endpoint.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a named endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, id: impl Into<String>, endpoint: EndpointSettings) -> Self {
        self.endpoints.insert(id.into(), endpoint);
        self
    }

    /// Enables direct dispatch for untrusted callers when nothing is secret.
    #[must_use]
    pub const fn with_allow_direct(mut self, allow_direct: bool) -> Self {
        self.allow_direct = allow_direct;
        self
    }

    /// Returns `true` when named endpoints override single-endpoint mode.
    #[must_use]
    pub fn has_named_endpoints(&self) -> bool {
        !self.endpoints.is_empty()
    }

    /// Fills `url` and `token` from the environment when the file left them unset.
    ///
    /// `lookup` is called with [`ENV_BASE_URL`] and [`ENV_TOKEN`]. Pass
    /// `|key| std::env::var(key).ok()` to read the process environment.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.url.is_none() {
            self.url = lookup(ENV_BASE_URL).filter(|v| !v.is_empty());
        }
        if self.token.is_none() {
            self.token = lookup(ENV_TOKEN)
                .filter(|v| !v.is_empty())
                .map(SecretString::from);
        }
        self
    }

    /// Parses TOML settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is invalid.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| parse_error(Path::new("<toml>"), e))
    }

    /// Loads settings from a file, picking the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or has an
    /// unsupported extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str(&read()?).map_err(|e| parse_error(path, e)),
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&read()?).map_err(|e| parse_error(path, e))
            }
            Some("json") => serde_json::from_str(&read()?).map_err(|e| parse_error(path, e)),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Default config file location: `<config_dir>/partyline/config.toml`.
    ///
    /// [`ENV_CONFIG`] takes precedence when set.
    #[must_use]
    pub fn default_path<F>(lookup: F, config_dir: Option<PathBuf>) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(ENV_CONFIG)
            .map(PathBuf::from)
            .or_else(|| config_dir.map(|dir| dir.join("partyline").join("config.toml")))
    }
}

fn parse_error(path: &Path, err: impl fmt::Display) -> ConfigError {
    ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

impl EndpointSettings {
    /// Endpoint settings with only a base URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Adds a default header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a default query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }
}
