//! Partyline Daemon
//!
//! Long-running secret boundary that dispatches calls to configured
//! endpoints with server-held credentials.

use std::sync::Arc;

use futures::stream::StreamExt;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use partyline_client::Dispatcher;
use partyline_daemon::{BoundaryState, DaemonConfig, Result, serve};

/// Initializes structured logging with tracing.
///
/// Supports two output formats via `PARTYLINE_LOG_FORMAT` environment variable:
/// - `json`: Machine-readable JSON logs
/// - `pretty`: Human-readable formatted logs (default)
///
/// Log level is controlled via `RUST_LOG` environment variable.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let format = std::env::var("PARTYLINE_LOG_FORMAT")
        .unwrap_or_else(|_| "pretty".to_string())
        .to_lowercase();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("partyline_daemon=info,partyline_client=info,partyline_common=info")
    });

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .init();
        }
    }
}

/// Resolves on the first SIGINT or SIGTERM.
async fn shutdown_signal(mut signals: Signals) {
    while let Some(signal) = signals.next().await {
        match signal {
            SIGTERM => {
                info!("Received SIGTERM, initiating graceful shutdown");
                break;
            }
            SIGINT => {
                info!("Received SIGINT, initiating graceful shutdown");
                break;
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting partyline daemon");

    let config = match DaemonConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return Err(e);
        }
    };
    match &config.source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No config file found, using environment only"),
    }

    let registry = match config.registry() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("Invalid endpoint configuration: {e}");
            return Err(e);
        }
    };

    if registry.is_empty() {
        warn!("No endpoints registered; every call will fail with unknown_endpoint");
    } else {
        info!(
            endpoints = ?registry.ids().collect::<Vec<_>>(),
            "Registered {} endpoint(s)",
            registry.len()
        );
    }

    let dispatcher = Dispatcher::http(registry, config.timeout())?;
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let signals = Signals::new([SIGTERM, SIGINT])?;

    serve(listener, BoundaryState::new(dispatcher), shutdown_signal(signals)).await?;

    info!("Daemon shutdown complete");

    Ok(())
}
