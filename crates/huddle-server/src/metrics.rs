//! Metrics collection and export for Huddle.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const SESSIONS_CREATED_TOTAL: &str = "huddle_sessions_created_total";
    pub const CLIENTS_JOINED_TOTAL: &str = "huddle_clients_joined_total";
    pub const CONNECTIONS_TOTAL: &str = "huddle_connections_total";
    pub const CONNECTIONS_ACTIVE: &str = "huddle_connections_active";
    pub const MESSAGES_TOTAL: &str = "huddle_messages_echoed_total";
    pub const MESSAGES_BYTES: &str = "huddle_messages_echoed_bytes";
    pub const REJECTIONS_TOTAL: &str = "huddle_connect_rejections_total";
    pub const ERRORS_TOTAL: &str = "huddle_errors_total";
}

/// Describe every metric to the current recorder.
///
/// Descriptions given before a recorder is installed are discarded.
fn describe_metrics() {
    metrics::describe_counter!(
        names::SESSIONS_CREATED_TOTAL,
        "Total number of sessions created since server start"
    );
    metrics::describe_counter!(
        names::CLIENTS_JOINED_TOTAL,
        "Total number of clients joined since server start"
    );
    metrics::describe_counter!(
        names::CONNECTIONS_TOTAL,
        "Total number of relay connections since server start"
    );
    metrics::describe_gauge!(
        names::CONNECTIONS_ACTIVE,
        "Current number of active relay connections"
    );
    metrics::describe_counter!(names::MESSAGES_TOTAL, "Total number of messages echoed");
    metrics::describe_counter!(names::MESSAGES_BYTES, "Total payload bytes echoed");
    metrics::describe_counter!(
        names::REJECTIONS_TOTAL,
        "Connect requests rejected before upgrade"
    );
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of errors");

    info!("Metrics described");
}

/// Install the Prometheus recorder with its HTTP listener, then describe
/// every metric to it.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    describe_metrics();

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a created session.
pub fn record_session_created() {
    counter!(names::SESSIONS_CREATED_TOTAL).increment(1);
}

/// Record a joined client.
pub fn record_client_joined() {
    counter!(names::CLIENTS_JOINED_TOTAL).increment(1);
}

/// Record a new connection.
pub fn record_connection(endpoint: &'static str) {
    counter!(names::CONNECTIONS_TOTAL, "endpoint" => endpoint).increment(1);
    gauge!(names::CONNECTIONS_ACTIVE).increment(1.0);
}

/// Record a disconnection.
pub fn record_disconnection() {
    gauge!(names::CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record an echoed message.
pub fn record_message(bytes: usize, kind: &'static str) {
    counter!(names::MESSAGES_TOTAL, "kind" => kind).increment(1);
    counter!(names::MESSAGES_BYTES, "kind" => kind).increment(bytes as u64);
}

/// Record a connect request rejected during validation.
pub fn record_rejection(reason: &'static str) {
    counter!(names::REJECTIONS_TOTAL, "reason" => reason).increment(1);
}

/// Record an error.
pub fn record_error(error_type: &'static str) {
    counter!(names::ERRORS_TOTAL, "type" => error_type).increment(1);
}

/// Metrics guard that records disconnection on drop.
pub struct ConnectionMetricsGuard;

impl ConnectionMetricsGuard {
    /// Create a new metrics guard, recording a connection.
    #[must_use]
    pub fn new(endpoint: &'static str) -> Self {
        record_connection(endpoint);
        Self
    }
}

impl Drop for ConnectionMetricsGuard {
    fn drop(&mut self) {
        record_disconnection();
    }
}
