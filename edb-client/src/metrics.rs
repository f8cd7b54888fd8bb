//! Client metrics definitions
//!
//! OpenTelemetry instruments recorded by the connection event loop. They are
//! only created when the client is built with observability enabled, and are
//! exported through whatever meter provider `init_observability` installed.
//!
//! # Metrics Collected
//!
//! - **edb.client.connection.state**: lifecycle state (gauge)
//! - **edb.client.requests.total**: settled requests by method and status (counter)
//! - **edb.client.request.duration**: request latency in seconds (histogram)
//! - **edb.client.requests.pending**: requests awaiting a response (up/down counter)
//! - **edb.client.errors.total**: errors by kind (counter)
//! - **edb.client.notifications.received**: unsolicited frames by method (counter)

use crate::lifecycle::ClientState;
use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter, UpDownCounter},
    InstrumentationScope, KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Lifecycle state, see [`ClientState::as_metric`]
    pub connection_state: Gauge<i64>,
    /// Settled requests
    pub requests_total: Counter<u64>,
    /// Request duration in seconds
    pub request_duration: Histogram<f64>,
    /// Requests currently in the correlation table
    pub pending_requests: UpDownCounter<i64>,
    /// Errors by kind
    pub errors_total: Counter<u64>,
    /// Notifications received
    pub notifications_received: Counter<u64>,
}

impl ClientMetrics {
    /// Create metrics on the global meter named after the service
    pub fn new(service_name: impl Into<String>) -> Self {
        let scope = InstrumentationScope::builder(service_name.into()).build();
        let meter = global::meter_with_scope(scope);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("edb.client.connection.state")
                .with_description(
                    "Client state (0=idle, 1=connecting, 2=open, 3=closing, 4=closed, 5=failed)",
                )
                .build(),
            requests_total: meter
                .u64_counter("edb.client.requests.total")
                .with_description("Total number of settled requests")
                .build(),
            request_duration: meter
                .f64_histogram("edb.client.request.duration")
                .with_description("Request duration in seconds")
                .with_unit("s")
                .build(),
            pending_requests: meter
                .i64_up_down_counter("edb.client.requests.pending")
                .with_description("Requests awaiting a response")
                .build(),
            errors_total: meter
                .u64_counter("edb.client.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
            notifications_received: meter
                .u64_counter("edb.client.notifications.received")
                .with_description("Total number of notifications received")
                .build(),
        }
    }

    /// Update connection state
    pub fn update_connection_state(&self, state: ClientState) {
        self.connection_state.record(state.as_metric(), &[]);
    }

    /// A request entered the correlation table
    pub fn record_issued(&self) {
        self.pending_requests.add(1, &[]);
    }

    /// A request left the correlation table
    pub fn record_settled(&self, method: &str, ok: bool, duration_secs: f64) {
        let status = if ok { "success" } else { "error" };
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status),
        ];
        self.pending_requests.add(-1, &[]);
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record an error by kind
    pub fn record_error(&self, kind: &str) {
        let attributes = &[KeyValue::new("error_type", kind.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record a notification received
    pub fn record_notification(&self, method: &str) {
        let attributes = &[KeyValue::new("method", method.to_string())];
        self.notifications_received.add(1, attributes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ClientMetrics::new("edb-test-client");

        // No provider installed: instruments are no-ops but must not panic
        metrics.update_connection_state(ClientState::Open);
        metrics.record_issued();
        metrics.record_settled("erisdb.getAccount", true, 0.05);
        metrics.record_error("decode");
        metrics.record_notification("NewBlock");
    }

    #[test]
    fn test_request_lifecycle_metrics() {
        let metrics = ClientMetrics::new("edb-test-requests");

        for method in ["erisdb.isListening", "erisdb.getMoniker", "erisdb.sendAndHold"] {
            metrics.record_issued();
            metrics.record_settled(method, method != "erisdb.sendAndHold", 0.01);
        }
        metrics.record_error("timeout");
        metrics.record_error("remote");
    }

    #[test]
    fn test_every_state_is_recordable() {
        let metrics = ClientMetrics::new("edb-test-state");
        for state in [
            ClientState::Idle,
            ClientState::Connecting,
            ClientState::Open,
            ClientState::Closing,
            ClientState::Closed,
            ClientState::Failed,
        ] {
            metrics.update_connection_state(state);
        }
    }

    #[test]
    fn test_owned_service_names() {
        // One meter scope per client build, named from a runtime string
        for i in 0..16 {
            let metrics = ClientMetrics::new(format!("edb-test-client-{}", i));
            metrics.record_issued();
            metrics.record_settled("erisdb.getChainId", true, 0.001);
        }
    }
}
