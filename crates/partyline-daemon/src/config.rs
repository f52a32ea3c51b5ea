//! Daemon configuration.
//!
//! Settings are loaded from `$PARTYLINE_CONFIG` if set, otherwise from
//! `~/.config/partyline/config.toml` when that file exists. Environment
//! variables fill the default endpoint's URL and token when the file leaves
//! them unset, so a single endpoint can be served with no file at all.
//!
//! ## Example Configuration
//!
//! ```toml
//! timeout_seconds = 30
//!
//! [server]
//! bind = "127.0.0.1:3939"
//!
//! [endpoints.cms]
//! url = "https://cms.example.com/api"
//! token = "secret"
//! query = { locale = "en" }
//!
//! [endpoints.json-placeholder]
//! url = "https://jsonplaceholder.typicode.com"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use partyline_common::settings::ENV_CONFIG;
use partyline_common::{EndpointRegistry, Settings};

use crate::error::Result;

/// Settings plus where they were read from.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Loaded settings, environment applied.
    pub settings: Settings,

    /// The file the settings came from, if any.
    pub source: Option<PathBuf>,
}

impl DaemonConfig {
    /// Loads configuration from the process environment and default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists (or was named explicitly)
    /// and cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok(), Self::config_dir())
    }

    /// Loads configuration from `path` if given, otherwise as [`Self::load`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self {
                settings: Settings::from_file(path)?.with_env(|key| std::env::var(key).ok()),
                source: Some(path.to_path_buf()),
            }),
            None => Self::load(),
        }
    }

    /// Loads configuration with an explicit environment lookup.
    ///
    /// A path named by `PARTYLINE_CONFIG` must exist. The default path is
    /// optional and falls back to empty settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file cannot be read or parsed.
    pub fn load_with<F>(lookup: F, config_dir: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = lookup(ENV_CONFIG).is_some();
        let path = Settings::default_path(&lookup, config_dir);

        let (settings, source) = match path {
            Some(path) if explicit || path.exists() => (Settings::from_file(&path)?, Some(path)),
            _ => (Settings::default(), None),
        };

        Ok(Self {
            settings: settings.with_env(&lookup),
            source,
        })
    }

    /// Returns the XDG config base directory.
    ///
    /// Uses `XDG_CONFIG_HOME` if set, otherwise `~/.config`.
    pub fn config_dir() -> Option<PathBuf> {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
    }

    /// Builds the immutable endpoint registry.
    ///
    /// # Errors
    ///
    /// Returns an error if any endpoint is invalid.
    pub fn registry(&self) -> Result<EndpointRegistry> {
        Ok(EndpointRegistry::from_settings(self.settings.clone())?)
    }

    /// Outbound request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.settings.timeout_seconds.map(Duration::from_secs)
    }

    /// Address the boundary listens on.
    pub fn bind_addr(&self) -> &str {
        &self.settings.server.bind
    }
}
