//! Canonical call-site names for endpoints.
//!
//! Every endpoint id produces two identifiers: a *raw* name for direct calls
//! (`$` + lowerCamelCase) and a *data* name for the reactive data wrapper
//! (`use` + PascalCase + `Data`).
//!
//! ```
//! use partyline_common::naming::{data_name, raw_name};
//!
//! assert_eq!(raw_name("user profile"), "$userProfile");
//! assert_eq!(data_name("user profile"), "useUserProfileData");
//! ```
//!
//! Ids that differ only in case or separators (`user-profile`, `user_profile`)
//! map to the same names. This is a known limitation; the registry logs a
//! warning when it happens.

use heck::{ToLowerCamelCase, ToUpperCamelCase};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Sigil marking a direct-call shortcut.
pub const RAW_PREFIX: &str = "$";
/// Prefix of a reactive-data shortcut.
pub const DATA_PREFIX: &str = "use";
/// Suffix of a reactive-data shortcut.
pub const DATA_SUFFIX: &str = "Data";

/// Returns the direct-call name for an endpoint id.
#[must_use]
pub fn raw_name(id: &str) -> String {
    format!("{RAW_PREFIX}{}", id.to_lower_camel_case())
}

/// Returns the reactive-data name for an endpoint id.
#[must_use]
pub fn data_name(id: &str) -> String {
    format!("{DATA_PREFIX}{}{DATA_SUFFIX}", id.to_upper_camel_case())
}

/// Checks that an endpoint id can be cased into a valid identifier.
///
/// Accepted ids contain only alphanumerics, `-`, `_` and whitespace, hold at
/// least one alphanumeric character, and do not start with a digit once cased.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEndpointId`] describing the first violation.
pub fn validate_id(id: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidEndpointId {
        id: id.to_string(),
        reason,
    };

    if id.trim().is_empty() {
        return Err(invalid("id is empty"));
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c.is_whitespace())
    {
        return Err(invalid(
            "only letters, digits, '-', '_' and spaces are allowed",
        ));
    }

    let cased = id.to_lower_camel_case();
    match cased.chars().next() {
        None => Err(invalid("id has no letters or digits")),
        Some(c) if c.is_numeric() => Err(invalid("id must not start with a digit")),
        Some(_) => Ok(()),
    }
}

/// The pair of generated call-site names for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcuts {
    /// The endpoint id the names were derived from.
    pub id: String,
    /// Direct-call name, e.g. `$userProfile`.
    pub raw: String,
    /// Reactive-data name, e.g. `useUserProfileData`.
    pub data: String,
}

impl Shortcuts {
    /// Derives both names for `id`.
    pub fn for_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            raw: raw_name(&id),
            data: data_name(&id),
            id,
        }
    }
}
