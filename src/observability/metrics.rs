//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, relay mode
//! - `proxy_request_duration_seconds` (histogram): time until the response
//!   head is ready, by method and relay mode

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Relay label for requests that ended in the 500 envelope.
pub const RELAY_ERROR: &str = "error";

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one proxied request.
pub fn record_request(method: &str, status: u16, relay: &'static str, start: Instant) {
    ::metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "relay" => relay
    )
    .increment(1);

    ::metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "relay" => relay
    )
    .record(start.elapsed().as_secs_f64());
}
