//! Metrics collection and exposition.
//!
//! # Metrics
//! - `site_requests_total` (counter): requests by route, method, status
//! - `site_request_duration_seconds` (histogram): latency by route
//! - `site_purges_total` (counter): purge attempts by outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder it is a no-op
//! - The Prometheus exporter listens on its own address

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint and install the global recorder.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one finished request.
pub fn record_request(route: &'static str, method: &Method, status: u16, start: Instant) {
    let labels = [
        ("route", route.to_string()),
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("site_requests_total", &labels).increment(1);
    metrics::histogram!("site_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record a purge attempt: `purged`, `rejected` or `failed`.
pub fn record_purge(outcome: &'static str) {
    metrics::counter!("site_purges_total", "outcome" => outcome).increment(1);
}
