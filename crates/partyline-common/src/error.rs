//! Error types shared by every partyline crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building the endpoint registry from settings.
///
/// These are startup errors: the registry cannot be constructed and the
/// process is expected to fail fast.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The endpoint id cannot be turned into a valid identifier.
    #[error("Invalid endpoint id '{id}': {reason}")]
    InvalidEndpointId {
        /// The offending id.
        id: String,
        /// Why the id was rejected.
        reason: &'static str,
    },

    /// A named endpoint has no base URL.
    #[error("Endpoint '{id}' is missing a base URL")]
    MissingUrl {
        /// Id of the endpoint without a URL.
        id: String,
    },

    /// A base URL could not be parsed.
    #[error("Endpoint '{id}' has an invalid base URL '{url}': {source}")]
    InvalidUrl {
        /// Id of the endpoint.
        id: String,
        /// The URL as configured.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// The settings file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file could not be parsed.
    #[error("Failed to parse config file {path}: {message}")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The settings file extension is not one of toml, yaml, yml or json.
    #[error("Unsupported config file format: {0}. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat(PathBuf),
}

/// Errors raised while substituting path template placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A placeholder in the template has no value in the path params.
    #[error("Missing path parameter '{name}'")]
    MissingPathParam {
        /// Name of the unresolved placeholder.
        name: String,
    },
}
