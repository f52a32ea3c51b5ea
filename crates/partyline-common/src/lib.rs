//! # partyline-common
//!
//! Shared types for resolving logical API calls into concrete HTTP requests.
//!
//! This crate holds everything that does not touch the network:
//! - Canonical shortcut names for endpoint ids
//! - Header, query and path template normalization
//! - Settings and the immutable endpoint registry built from them
//! - Per-call options, resolved requests and the secret boundary wire types
//!
//! ## Example
//!
//! ```
//! use partyline_common::{EndpointRegistry, EndpointSettings, Settings};
//!
//! let settings = Settings::default()
//!     .with_endpoint("json-placeholder", EndpointSettings::new("https://jsonplaceholder.typicode.com"))
//!     .with_endpoint("cms", EndpointSettings::new("https://cms.example.com").with_token("secret"));
//!
//! let registry = EndpointRegistry::from_settings(settings)?;
//! assert_eq!(registry.len(), 2);
//! assert_eq!(registry.shortcuts()[1].raw, "$jsonPlaceholder");
//! # Ok::<(), partyline_common::ConfigError>(())
//! ```

pub mod error;
/// Header input shapes and case-insensitive merging.
pub mod headers;
/// Endpoint id → call-site name conversion.
pub mod naming;
pub mod options;
/// Path template placeholder substitution.
pub mod path;
pub mod protocol;
pub mod registry;
pub mod request;
pub mod settings;
pub mod value;

pub use error::{ConfigError, PathError};
pub use headers::{HeaderInput, Headers};
pub use naming::Shortcuts;
pub use options::CallOptions;
pub use path::PathParams;
pub use protocol::{BOUNDARY_ERROR_HEADER, BOUNDARY_ROUTE, BoundaryErrorBody, BoundaryRequest};
pub use registry::{Endpoint, EndpointRegistry, PublicRegistry};
pub use request::ResolvedRequest;
pub use settings::{EndpointSettings, Query, ServerSettings, Settings};
pub use value::{ParamValue, QueryValue};
