//! # partyline-daemon
//!
//! The secret boundary: a small HTTP server that holds endpoint credentials
//! and dispatches calls on behalf of untrusted callers.
//!
//! Callers `POST` a [`BoundaryRequest`](partyline_common::BoundaryRequest) to
//! [`BOUNDARY_ROUTE`](partyline_common::BOUNDARY_ROUTE); tokens never leave
//! this process.

pub mod config;
pub mod error;
pub mod server;

pub use config::DaemonConfig;
pub use error::{DaemonError, Result};
pub use server::{BoundaryState, router, serve};
