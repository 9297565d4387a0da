//! OpenTelemetry instruments for Vault calls
//!
//! With the `metrics` feature the transport counts requests, failures and
//! latency per operation, and the handle cache counts handle creations per
//! mount. Without it every recorder compiles to nothing.

use std::sync::{Arc, OnceLock};

#[cfg(feature = "metrics")]
use opentelemetry::{
    metrics::{Counter, Histogram},
    KeyValue,
};

/// Metrics settings
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Record metrics for this client
    pub enabled: bool,
    /// Meter name
    pub service_name: String,
    /// Reported SDK version
    pub service_version: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: "vault-versioned-sdk".to_string(),
            service_version: crate::VERSION.to_string(),
        }
    }
}

/// Instruments shared by every client in the process
#[derive(Clone)]
pub struct Metrics {
    #[cfg(feature = "metrics")]
    calls: Counter<u64>,
    #[cfg(feature = "metrics")]
    latency: Histogram<f64>,
    #[cfg(feature = "metrics")]
    failures: Counter<u64>,
    #[cfg(feature = "metrics")]
    handles: Counter<u64>,
}

/// Label for the failure class of an HTTP status, `None` when the call
/// succeeded or the path was simply absent
#[cfg_attr(not(feature = "metrics"), allow(dead_code))]
fn failure_class(status: u16) -> Option<&'static str> {
    match status {
        404 => None,
        500.. => Some("server"),
        400..=499 => Some("client"),
        _ => None,
    }
}

#[cfg(feature = "metrics")]
impl Metrics {
    /// Register the instruments on the global meter provider
    pub fn new(config: &TelemetryConfig) -> Self {
        let meter = opentelemetry::global::meter(config.service_name.clone());

        Self {
            calls: meter
                .u64_counter("vault_sdk.requests_total")
                .with_description("Vault API calls by operation and status")
                .init(),
            latency: meter
                .f64_histogram("vault_sdk.request_duration_seconds")
                .with_description("Vault API call latency in seconds")
                .init(),
            failures: meter
                .u64_counter("vault_sdk.errors_total")
                .with_description("Failed Vault API calls; 404 is not counted")
                .init(),
            handles: meter
                .u64_counter("vault_sdk.handles_created_total")
                .with_description("KV mount handles created")
                .init(),
        }
    }

    /// Record an answered call
    pub fn record_request(&self, operation: &str, status: u16, duration_secs: f64) {
        let labels = [
            KeyValue::new("operation", operation.to_string()),
            KeyValue::new("status", i64::from(status)),
        ];
        self.calls.add(1, &labels);
        self.latency.record(duration_secs, &labels);

        if let Some(class) = failure_class(status) {
            self.failures.add(
                1,
                &[
                    KeyValue::new("type", class),
                    KeyValue::new("operation", operation.to_string()),
                ],
            );
        }
    }

    /// Record a call that never got an HTTP answer
    pub fn record_transport_error(&self, operation: &str) {
        self.failures.add(
            1,
            &[
                KeyValue::new("type", "transport"),
                KeyValue::new("operation", operation.to_string()),
            ],
        );
    }

    /// Record creation of the handle for `mount`
    pub fn record_handle_created(&self, mount: &str) {
        self.handles
            .add(1, &[KeyValue::new("mount", mount.to_string())]);
    }
}

#[cfg(not(feature = "metrics"))]
impl Metrics {
    /// No instruments without the `metrics` feature
    pub fn new(_config: &TelemetryConfig) -> Self {
        Self {}
    }

    /// No-op
    pub fn record_request(&self, _operation: &str, _status: u16, _duration_secs: f64) {}

    /// No-op
    pub fn record_transport_error(&self, _operation: &str) {}

    /// No-op
    pub fn record_handle_created(&self, _mount: &str) {}
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Metrics(recording: {})", cfg!(feature = "metrics"))
    }
}

static GLOBAL_METRICS: OnceLock<Arc<Metrics>> = OnceLock::new();

/// Install the process-wide instruments; later calls return the first set
pub fn init_telemetry(config: TelemetryConfig) -> Arc<Metrics> {
    GLOBAL_METRICS
        .get_or_init(|| Arc::new(Metrics::new(&config)))
        .clone()
}

/// The process-wide instruments, if a client enabled telemetry
pub fn telemetry() -> Option<Arc<Metrics>> {
    GLOBAL_METRICS.get().cloned()
}
