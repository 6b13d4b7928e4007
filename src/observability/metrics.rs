//! Metrics collection and exposition.
//!
//! # Metrics
//! - `front_requests_total` (counter): requests by outcome and status
//! - `front_request_duration_seconds` (histogram): latency by outcome
//! - `front_backend_retries_total` (counter): backend fetch retries
//!
//! # Design Decisions
//! - Outcome label is one of `found`, `not_found`, `fetch_failed`
//! - Exporter is optional; without it the macros record nowhere

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "front_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("front_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record one retried backend fetch.
pub fn record_retry() {
    metrics::counter!("front_backend_retries_total").increment(1);
}
