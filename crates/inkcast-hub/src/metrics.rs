//! Prometheus metrics recording.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus metrics recorder and return the handle for rendering.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

pub fn record_ws_connect() {
    metrics::gauge!("ws_connections_active").increment(1.0);
}

pub fn record_ws_disconnect() {
    metrics::gauge!("ws_connections_active").decrement(1.0);
}

/// Record an accepted event by kind ("line" or "clear").
pub fn record_event(kind: &'static str) {
    metrics::counter!("events_total", "kind" => kind).increment(1);
}

pub fn record_malformed() {
    metrics::counter!("malformed_events_total").increment(1);
}

/// Record one fan-out and the log size it carried.
pub fn record_broadcast(recipients: usize, records: usize) {
    metrics::counter!("broadcasts_total").increment(1);
    metrics::histogram!("broadcast_recipients").record(recipients as f64);
    metrics::gauge!("log_records").set(records as f64);
}
