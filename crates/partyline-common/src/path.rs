//! Path template resolution.
//!
//! Templates may contain `:name` or `{name}` placeholders. Each placeholder is
//! replaced by the stringified, percent-encoded value of the matching path
//! param. Params that no placeholder references are ignored.
//!
//! ```
//! use std::collections::BTreeMap;
//! use partyline_common::path::resolve_path;
//! use partyline_common::ParamValue;
//!
//! let params = BTreeMap::from([("id".to_string(), ParamValue::from(42))]);
//! assert_eq!(resolve_path("/users/:id", &params).unwrap(), "/users/42");
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};

use crate::error::PathError;
use crate::value::ParamValue;

/// Path params keyed by placeholder name.
pub type PathParams = BTreeMap<String, ParamValue>;

/// Everything except RFC 3986 unreserved characters is encoded.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[allow(clippy::unwrap_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)|\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap()
});

/// Substitutes every placeholder in `template` with its param value.
///
/// # Errors
///
/// Returns [`PathError::MissingPathParam`] naming the first placeholder that
/// has no value in `params`. No partial path is returned.
pub fn resolve_path(template: &str, params: &PathParams) -> Result<String, PathError> {
    let mut missing = None;

    let resolved = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map_or("", |m| m.as_str());

        if let Some(value) = params.get(name) {
            utf8_percent_encode(&value.to_string(), PATH_SEGMENT).to_string()
        } else {
            missing.get_or_insert_with(|| name.to_string());
            String::new()
        }
    });

    match missing {
        Some(name) => Err(PathError::MissingPathParam { name }),
        None => Ok(resolved.into_owned()),
    }
}

/// Lists placeholder names in the order they appear in `template`.
#[must_use]
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn params(pairs: &[(&str, ParamValue)]) -> PathParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_colon_placeholder() {
        let resolved = resolve_path("/users/:id", &params(&[("id", 42.into())])).unwrap();
        assert_eq!(resolved, "/users/42");
    }

    #[test]
    fn test_brace_placeholder() {
        let p = params(&[("org", "acme".into()), ("repo", "web".into())]);
        assert_eq!(
            resolve_path("/orgs/{org}/repos/{repo}", &p).unwrap(),
            "/orgs/acme/repos/web"
        );
    }

    #[test]
    fn test_missing_param_names_placeholder() {
        let err = resolve_path("/users/:id", &PathParams::new()).unwrap_err();
        assert_eq!(
            err,
            PathError::MissingPathParam {
                name: "id".to_string()
            }
        );
    }

    #[test]
    fn test_first_missing_param_is_reported() {
        let err = resolve_path("/a/:first/b/:second", &PathParams::new()).unwrap_err();
        assert_eq!(
            err,
            PathError::MissingPathParam {
                name: "first".to_string()
            }
        );
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let p = params(&[("q", "a b/c?d".into())]);
        assert_eq!(resolve_path("/search/:q", &p).unwrap(), "/search/a%20b%2Fc%3Fd");

        let p = params(&[("name", "café".into())]);
        assert_eq!(resolve_path("/n/:name", &p).unwrap(), "/n/caf%C3%A9");
    }

    #[test]
    fn test_identity_without_placeholders() {
        let p = params(&[("unused", 1.into())]);
        assert_eq!(resolve_path("/health", &p).unwrap(), "/health");
        assert_eq!(resolve_path("", &PathParams::new()).unwrap(), "");
    }

    #[test]
    fn test_extra_params_ignored() {
        let p = params(&[("id", 7.into()), ("page", 2.into())]);
        assert_eq!(resolve_path("/items/:id", &p).unwrap(), "/items/7");
    }

    #[test]
    fn test_colon_followed_by_digit_is_literal() {
        assert_eq!(
            resolve_path("/at/10:30", &PathParams::new()).unwrap(),
            "/at/10:30"
        );
    }

    #[test]
    fn test_no_unresolved_syntax_remains() {
        let p = params(&[("a", "x".into()), ("b", "y".into())]);
        let resolved = resolve_path("/:a/{b}/:a", &p).unwrap();
        assert_eq!(resolved, "/x/y/x");
        assert!(placeholders(&resolved).is_empty());
    }

    #[test]
    fn test_placeholders_in_order() {
        assert_eq!(placeholders("/u/:id/p/{post}"), vec!["id", "post"]);
    }
}
