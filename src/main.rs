//! Flag toggle service.
//!
//! A small HTTP service that answers "is this feature flag on?" by asking a
//! flag client bound to a remote (or local) flag configuration source.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │              FLAG TOGGLE SERVICE             │
//!                        │                                              │
//!  GET /get-toggle       │  ┌─────────┐    ┌──────────┐    ┌──────────┐ │
//!  ──────────────────────┼─▶│  http   │───▶│  toggle  │───▶│  flags   │ │
//!                        │  │ server  │    │ handler  │    │  client  │ │
//!  200 true|false        │  └─────────┘    └──────────┘    └────┬─────┘ │
//!  ◀─────────────────────┼───────────────────────────────────────┘      │
//!                        │                         snapshot store ▲     │
//!                        │                                        │     │
//!                        │          polling / file watch / offline│     │   Flag
//!                        │  ──────────────────────────────────────┴─────┼── backend
//!                        │                                              │
//!                        │  config · observability · lifecycle          │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use flag_toggle_service::config::load_config;
use flag_toggle_service::lifecycle::{startup, StartupError};
use flag_toggle_service::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "flag-toggle-service")]
#[command(about = "Evaluates boolean feature flags over HTTP", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("failed to initialize logging: {}", e);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?config,
        "flag-toggle-service starting"
    );

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Fatal startup error");
        return Err(e);
    }

    Ok(())
}
