//! # partyline-client
//!
//! Dispatches logical API calls to configured endpoints.
//!
//! Two call paths exist, and they are distinct types:
//! - [`Dispatcher`] resolves calls against a full [`EndpointRegistry`],
//!   tokens included. It belongs on the trusted side of the secret boundary.
//! - [`ApiClient`] is for untrusted callers. It forwards calls to the
//!   boundary, or dispatches directly over a [`PublicRegistry`].
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use partyline_client::Dispatcher;
//! use partyline_common::{CallOptions, EndpointRegistry, EndpointSettings, Settings};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = Settings::default().with_endpoint(
//!     "cms",
//!     EndpointSettings::new("https://cms.example.com").with_token("secret"),
//! );
//! let dispatcher = Dispatcher::http(Arc::new(EndpointRegistry::from_settings(settings)?), None)?;
//!
//! let opts = CallOptions::default()
//!     .with_path_param("id", 7)
//!     .with_query("locale", "en");
//! let response = dispatcher.dispatch("cms", "/posts/:id", &opts).await?;
//! println!("{} {}", response.status, response.text());
//! # Ok(())
//! # }
//! ```
//!
//! [`EndpointRegistry`]: partyline_common::EndpointRegistry
//! [`PublicRegistry`]: partyline_common::PublicRegistry

pub mod api_client;
pub mod dispatch;
pub mod error;
pub mod transport;

pub use api_client::{ApiClient, BoundaryClient, EndpointHandle};
pub use dispatch::{Dispatcher, resolve};
pub use error::ClientError;
pub use transport::{HttpTransport, Transport, TransportResponse};
