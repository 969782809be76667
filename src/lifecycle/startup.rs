//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the flag client from the validated configuration
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: a flag client that cannot start is fatal, no request is served
//! - The listener binds last (traffic only when the client exists)

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::Instrument;

use crate::config::{ConfigError, ServiceConfig};
use crate::flags::{FlagClient, FlagClientError, FlagEvaluator, TracingLogSink};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("flag client failed to start: {0}")]
    FlagClient(#[from] FlagClientError),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[from] std::net::AddrParseError),

    #[error("metrics exporter failed to start: {0}")]
    Metrics(#[from] BuildError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Run the service until SIGINT/SIGTERM.
pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    let span = tracing::info_span!(
        "startup",
        application = %config.observability.application_name
    );

    let shutdown = Shutdown::new();

    let flags = FlagClient::start(&config.flags, Arc::new(TracingLogSink), shutdown.subscribe())
        .instrument(span.clone())
        .await?;

    span.in_scope(|| {
        tracing::info!(
            source = config.flags.source.kind(),
            initialized = flags.initialized(),
            default_value = config.flags.default_value,
            "Flag client ready"
        );
    });

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    span.in_scope(|| tracing::info!(address = %local_addr, "Listening for connections"));

    let server = HttpServer::new(config, flags);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => return Ok(result??),
        _ = signals::shutdown_signal() => {}
    }

    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
