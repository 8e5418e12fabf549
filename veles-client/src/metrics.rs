//! Client metrics
//!
//! OpenTelemetry instruments recorded by [`ServerProxy`](crate::ServerProxy)
//! when it was built with observability enabled. They export through the
//! meter provider installed by `veles_core::init_observability`.
//!
//! # Metrics Collected
//!
//! - **requests_total**: envelopes sent, by method and status (counter)
//! - **request_duration**: round-trip latency in seconds (histogram)
//! - **errors_total**: failures, by error kind (counter)
//! - **batch_size**: jobs per multicall (histogram)
//!
//! ```rust,no_run
//! use veles_client::ClientMetrics;
//!
//! let metrics = ClientMetrics::new("inventory-client");
//! metrics.record_request("inventory.count", "success", 0.012);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use veles_core::Error;

/// Instruments for one proxy
pub struct ClientMetrics {
    /// Total number of envelopes sent
    pub requests_total: Counter<u64>,
    /// Round-trip duration in seconds
    pub request_duration: Histogram<f64>,
    /// Total number of failures
    pub errors_total: Counter<u64>,
    /// Jobs per multicall flush
    pub batch_size: Histogram<u64>,
}

impl ClientMetrics {
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Build the instruments on a caller-supplied meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("veles.client.requests.total")
                .with_description("Total number of envelopes sent")
                .build(),
            request_duration: meter
                .f64_histogram("veles.client.request.duration")
                .with_description("Round-trip duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("veles.client.errors.total")
                .with_description("Total number of failed calls")
                .build(),
            batch_size: meter
                .u64_histogram("veles.client.batch.size")
                .with_description("Number of jobs in a multicall")
                .build(),
        }
    }

    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    pub fn record_error(&self, error_type: &str) {
        let attributes = &[KeyValue::new("error_type", error_type.to_string())];
        self.errors_total.add(1, attributes);
    }

    pub fn record_batch(&self, size: u64) {
        self.batch_size.record(size, &[]);
    }
}

/// Short label for an error, used as the `error_type` attribute
pub(crate) fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::Validation(_) => "validation",
        Error::Protocol(_) => "protocol",
        Error::Translation(_) => "translation",
        Error::Serialization(_) => "serialization",
        Error::Fault(_) => "fault",
        Error::Transport(_) => "transport",
        Error::WebSocket(_) => "websocket",
        Error::UnsupportedScheme(_) => "unsupported_scheme",
        Error::ConnectionClosed => "connection_closed",
        Error::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_core::ErrorData;

    #[test]
    fn test_metrics_creation() {
        let metrics = ClientMetrics::new("test-client");
        metrics.record_request("math.add", "success", 0.05);
        metrics.record_error("transport");
        metrics.record_batch(3);
    }

    #[test]
    fn test_request_metrics() {
        let metrics = ClientMetrics::new("test-client-req");

        metrics.record_request("add", "success", 0.05);
        metrics.record_request("multiply", "success", 0.03);
        metrics.record_request("divide", "error", 0.01);
        metrics.record_error("fault");
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(error_kind(&Error::ConnectionClosed), "connection_closed");
        assert_eq!(error_kind(&Error::Fault(ErrorData::new(-32000, "x"))), "fault");
        assert_eq!(error_kind(&Error::Protocol("mixed".into())), "protocol");
    }
}
