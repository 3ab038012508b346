//! Business metrics for EventMingle.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `eventmingle_records_created_total{resource}` - Records created through the API
//! - `eventmingle_records_deleted_total{resource}` - Records deleted through the API
//! - `eventmingle_logins_total{outcome}` - Login attempts by outcome (success, failure)
//! - `eventmingle_registrations_total` - Self-service sign-ups
//! - `eventmingle_chat_messages_total` - Chat messages persisted
//! - `eventmingle_rsvps_total{status}` - RSVPs by answer
//!
//! ## Gauges
//! - `eventmingle_chat_connections` - Open chat sockets
//!
//! HTTP traffic is counted separately by the request tracking layer
//! (`http_requests_total`), store failures by the Postgres store
//! (`eventmingle_store_errors_total`).

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Register all metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        "eventmingle_records_created_total",
        "Records created through the REST API, by resource"
    );
    describe_counter!(
        "eventmingle_records_deleted_total",
        "Records deleted through the REST API, by resource"
    );
    describe_counter!(
        "eventmingle_logins_total",
        "Login attempts by outcome (success, failure)"
    );
    describe_counter!("eventmingle_registrations_total", "Self-service sign-ups");
    describe_counter!("eventmingle_chat_messages_total", "Chat messages persisted");
    describe_counter!("eventmingle_rsvps_total", "RSVPs by answer");
    describe_gauge!("eventmingle_chat_connections", "Open chat sockets");
    describe_counter!("http_requests_total", "HTTP requests by method and status");
    describe_counter!(
        "eventmingle_store_errors_total",
        "Failed record store queries by operation"
    );

    tracing::info!("Business metrics registered");
}

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// # Errors
///
/// Returns error if a recorder is already installed or the listener cannot bind.
pub fn install_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {e}"))?;
    register_business_metrics();
    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Record a created record.
pub fn record_created(resource: &'static str) {
    metrics::counter!("eventmingle_records_created_total", "resource" => resource).increment(1);
}

/// Record a deleted record.
pub fn record_deleted(resource: &'static str) {
    metrics::counter!("eventmingle_records_deleted_total", "resource" => resource).increment(1);
}

/// Record a login attempt.
pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("eventmingle_logins_total", "outcome" => outcome).increment(1);
}

/// Record a self-service registration.
pub fn record_registration() {
    metrics::counter!("eventmingle_registrations_total").increment(1);
}

/// Record a persisted chat message.
pub fn record_chat_message() {
    metrics::counter!("eventmingle_chat_messages_total").increment(1);
}

/// Record an RSVP.
pub fn record_rsvp(status: &'static str) {
    metrics::counter!("eventmingle_rsvps_total", "status" => status).increment(1);
}

/// Track open chat sockets.
pub fn chat_connection_opened() {
    metrics::gauge!("eventmingle_chat_connections").increment(1.0);
}

/// Track closed chat sockets.
pub fn chat_connection_closed() {
    metrics::gauge!("eventmingle_chat_connections").decrement(1.0);
}
