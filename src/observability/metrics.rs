//! Metrics collection and exposition.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize the Prometheus exporter and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus recorder");

    tracing::info!("Metrics server listening on http://{}", addr);
}

/// Record one dispatch attempt against an analyzer.
pub fn record_dispatch(analyzer: &str, outcome: &str, started: Instant) {
    let labels = [
        ("analyzer", analyzer.to_string()),
        ("outcome", outcome.to_string()),
    ];

    counter!("loggate_dispatch_total", &labels).increment(1);
    histogram!("loggate_dispatch_duration_seconds", &labels).record(started.elapsed().as_secs_f64());
}

/// Record one active probe result.
pub fn record_probe(analyzer: &str, success: bool) {
    let labels = [
        ("analyzer", analyzer.to_string()),
        ("outcome", (if success { "success" } else { "failure" }).to_string()),
    ];
    counter!("loggate_probe_total", &labels).increment(1);
}

/// Update the per-analyzer health gauge.
pub fn record_analyzer_health(analyzer: &str, healthy: bool) {
    let val = if healthy { 1.0 } else { 0.0 };
    gauge!("loggate_analyzer_healthy", "analyzer" => analyzer.to_string()).set(val);
}

/// Update the instantaneous queue depth gauge.
pub fn record_queue_depth(depth: usize) {
    gauge!("loggate_queue_depth").set(depth as f64);
}
