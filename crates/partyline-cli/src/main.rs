//! Partyline CLI
//!
//! Calls configured endpoints, either directly with the credentials in the
//! local config or through a running secret boundary, previews resolved
//! requests with secrets redacted, and lists generated shortcut names.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod args;
mod commands;
mod display;

use crate::args::RequestArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (.toml, .yaml, .yml or .json). Defaults to
    /// $PARTYLINE_CONFIG, then ~/.config/partyline/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a request to an endpoint and print the response
    Call {
        #[command(flatten)]
        request: RequestArgs,

        /// Forward through the secret boundary at this base URL instead of
        /// dispatching with local credentials
        #[arg(long, env = "PARTYLINE_BOUNDARY")]
        boundary: Option<String>,
    },

    /// Print the request a call would send, with secrets redacted
    Resolve {
        #[command(flatten)]
        request: RequestArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the call-site names generated for each endpoint
    Shortcuts,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Call { request, boundary } => {
            commands::call(config, &request, boundary.as_deref()).await
        }
        Commands::Resolve { request, json } => commands::resolve(config, &request, json),
        Commands::Shortcuts => commands::shortcuts(config),
    }
}
