//! Header normalization.
//!
//! Call sites may pass headers in three shapes: a plain map, an ordered list
//! of `(name, value)` pairs, or an [`http::HeaderMap`]. [`HeaderInput`] models
//! them as a tagged union and [`HeaderInput::normalize`] turns any of them into
//! one canonical `BTreeMap<String, String>`.
//!
//! ```
//! use partyline_common::headers::HeaderInput;
//!
//! let headers = HeaderInput::from(vec![("A", "1"), ("A", "2")]);
//! assert_eq!(headers.normalize().get("A").map(String::as_str), Some("2"));
//! ```

use std::collections::BTreeMap;

use http::HeaderMap;
use serde::{Deserialize, Serialize, Serializer};

/// Canonical header mapping.
pub type Headers = BTreeMap<String, String>;

/// Headers as supplied by a caller.
///
/// Deserializes from an object (`{"Accept": "text/plain"}`) or from an array
/// of pairs (`[["Accept", "text/plain"]]`). Always serializes as the
/// normalized object, so a [`HeaderMap`] can cross a JSON boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HeaderInput {
    /// A plain name → value map.
    Map(Headers),
    /// Ordered pairs; later pairs override earlier ones with the same name.
    Pairs(Vec<(String, String)>),
    /// A platform header collection.
    #[serde(skip)]
    Headers(HeaderMap),
}

impl Default for HeaderInput {
    fn default() -> Self {
        Self::Map(Headers::new())
    }
}

impl HeaderInput {
    /// Converts the input into a canonical mapping without mutating it.
    #[must_use]
    pub fn normalize(&self) -> Headers {
        match self {
            Self::Map(map) => map.clone(),
            Self::Pairs(pairs) => pairs.iter().cloned().collect(),
            Self::Headers(header_map) => header_map
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect(),
        }
    }

    /// Returns `true` when the input holds no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Map(map) => map.is_empty(),
            Self::Pairs(pairs) => pairs.is_empty(),
            Self::Headers(header_map) => header_map.is_empty(),
        }
    }
}

/// Normalizes optional header input; absent input yields an empty mapping.
#[must_use]
pub fn normalize_headers(input: Option<&HeaderInput>) -> Headers {
    input.map_or_else(Headers::new, HeaderInput::normalize)
}

/// Merges header layers in increasing precedence.
///
/// Names are compared case-insensitively. A later layer replaces an earlier
/// header of the same name, and the later spelling of the name is kept.
#[must_use]
pub fn merge_headers<'a, I>(layers: I) -> Headers
where
    I: IntoIterator<Item = &'a Headers>,
{
    let mut merged = Headers::new();
    for layer in layers {
        for (name, value) in layer {
            merged.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            merged.insert(name.clone(), value.clone());
        }
    }
    merged
}

/// Case-insensitive header lookup.
#[must_use]
pub fn find_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

impl Serialize for HeaderInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.normalize().serialize(serializer)
    }
}

impl From<Headers> for HeaderInput {
    fn from(map: Headers) -> Self {
        Self::Map(map)
    }
}

impl From<HeaderMap> for HeaderInput {
    fn from(header_map: HeaderMap) -> Self {
        Self::Headers(header_map)
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for HeaderInput {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
