//! Prometheus metrics setup and metric definitions

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Histogram buckets (seconds) for HTTP latency. Prometheus defaults plus
/// sub-millisecond buckets for fast endpoints.
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .set_buckets(LATENCY_BUCKETS)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions so `/metrics` carries HELP/TYPE lines from
/// startup, not just after first use.
pub fn describe_metrics() {
    describe_counter!(
        "bookclub_http_requests_total",
        "Total number of HTTP requests by method, route template and status"
    );
    describe_histogram!(
        "bookclub_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "bookclub_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    gauge!("bookclub_http_requests_in_flight").set(0.0);
}
