//! Command implementations for the CLI.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use log::debug;

use partyline_client::{ApiClient, Dispatcher};
use partyline_common::EndpointRegistry;
use partyline_daemon::DaemonConfig;

use crate::args::RequestArgs;
use crate::display::{display_resolved, display_response, display_shortcuts};

fn load(config: Option<&Path>) -> Result<(DaemonConfig, EndpointRegistry)> {
    let config = DaemonConfig::load_from(config).context("Failed to load configuration")?;
    if let Some(path) = &config.source {
        debug!("Loaded configuration from {}", path.display());
    }
    let registry = config.registry().context("Invalid endpoint configuration")?;
    Ok((config, registry))
}

/// Sends a request and prints the response.
///
/// With `boundary`, the call is forwarded and no local credentials are read.
pub async fn call(config: Option<&Path>, request: &RequestArgs, boundary: Option<&str>) -> Result<()> {
    let opts = request.to_options();

    let response = if let Some(url) = boundary {
        ApiClient::boundary(url)?
            .call(&request.endpoint, &request.path, &opts)
            .await?
    } else {
        let (config, registry) = load(config)?;
        Dispatcher::http(Arc::new(registry), config.timeout())?
            .dispatch(&request.endpoint, &request.path, &opts)
            .await?
    };

    display_response(&response);

    if !response.is_success() {
        bail!("{} HTTP {}", "Request failed:".bright_red(), response.status);
    }
    Ok(())
}

/// Prints the request a call would send, credentials masked.
pub fn resolve(config: Option<&Path>, request: &RequestArgs, json: bool) -> Result<()> {
    let (_, registry) = load(config)?;
    let resolved = partyline_client::resolve(
        &registry,
        &request.endpoint,
        &request.path,
        &request.to_options(),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resolved.redacted())?);
    } else {
        display_resolved(&resolved);
    }
    Ok(())
}

/// Lists the generated call-site names.
pub fn shortcuts(config: Option<&Path>) -> Result<()> {
    let (_, registry) = load(config)?;
    display_shortcuts(&registry.shortcuts());
    Ok(())
}
