//! Metrics collection and exposition.
//!
//! # Metrics
//! - `toggle_evaluations_total` (counter): evaluations by reason and value
//! - `toggle_flag_polls_total` (counter): flag backend polls by outcome
//! - `toggle_http_requests_total` (counter): requests by status
//! - `toggle_http_request_duration_seconds` (histogram): latency distribution
//!
//! Without an installed recorder every call is a no-op, so tests and
//! metrics-disabled deployments pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::flags::EvaluationDetail;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_evaluation(detail: &EvaluationDetail) {
    metrics::counter!(
        "toggle_evaluations_total",
        "reason" => detail.reason.to_string(),
        "value" => if detail.value { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_flag_poll(outcome: &'static str) {
    metrics::counter!("toggle_flag_polls_total", "outcome" => outcome).increment(1);
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("toggle_http_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("toggle_http_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}
