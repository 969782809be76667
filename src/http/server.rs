//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::ServiceConfig;
use crate::flags::FlagEvaluator;
use crate::http::middleware::track_metrics;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::{docs, health, toggle};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub flags: Arc<dyn FlagEvaluator>,
    pub default_value: bool,
}

/// HTTP server for the toggle API.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server answering from `flags`.
    pub fn new(config: ServiceConfig, flags: Arc<dyn FlagEvaluator>) -> Self {
        let state = AppState {
            flags,
            default_value: config.flags.default_value,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let mut routes = Router::new()
            .route("/get-toggle", get(toggle::get_toggle))
            .route("/health", get(health::health));

        if config.docs.enabled {
            routes = routes.merge(docs::routes());
        }

        let application: Arc<str> = config.observability.application_name.as_str().into();
        let make_span = move |request: &Request<Body>| {
            tracing::info_span!(
                "request",
                application = %application,
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id(request),
            )
        };

        routes
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(track_metrics))
            .layer(propagate_request_id_layer())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(make_span)
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            docs = self.config.docs.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
