//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the counter/timer sink the dynamic layer reports into
//! - Forward to the process-wide `metrics` recorder by default
//! - Optionally expose a Prometheus scrape endpoint
//!
//! # Metrics
//! - `config_remote_fetch_total` (counter): fetch attempts by outcome
//! - `config_remote_fetch_duration_seconds` (histogram): fetch latency by outcome
//! - `config_snapshot_published_total` (counter): snapshots made visible to readers
//!
//! # Design Decisions
//! - The sink is passed in explicitly; `GlobalMetrics` is the documented default
//! - Labels are static strings, so recording never allocates label values

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const FETCH_TOTAL: &str = "config_remote_fetch_total";
pub const FETCH_DURATION: &str = "config_remote_fetch_duration_seconds";
pub const SNAPSHOT_PUBLISHED: &str = "config_snapshot_published_total";

/// Static label pairs attached to a measurement.
pub type Labels<'a> = &'a [(&'static str, &'static str)];

/// Opaque counter/timer sink.
pub trait MetricsSink: Send + Sync {
    fn increment(&self, name: &'static str, labels: Labels<'_>);

    fn record(&self, name: &'static str, elapsed: Duration, labels: Labels<'_>);
}

/// Forwards to whatever recorder is installed for the `metrics` facade.
///
/// When no recorder is installed every call is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalMetrics;

fn to_labels(labels: Labels<'_>) -> Vec<metrics::Label> {
    labels
        .iter()
        .map(|(key, value)| metrics::Label::new(*key, *value))
        .collect()
}

impl MetricsSink for GlobalMetrics {
    fn increment(&self, name: &'static str, labels: Labels<'_>) {
        metrics::counter!(name, to_labels(labels)).increment(1);
    }

    fn record(&self, name: &'static str, elapsed: Duration, labels: Labels<'_>) {
        metrics::histogram!(name, to_labels(labels)).record(elapsed.as_secs_f64());
    }
}

/// Shared handle to a sink.
#[derive(Clone)]
pub struct SharedMetrics(Arc<dyn MetricsSink>);

impl SharedMetrics {
    pub fn new(sink: impl MetricsSink + 'static) -> Self {
        Self(Arc::new(sink))
    }

    pub fn increment(&self, name: &'static str, labels: Labels<'_>) {
        self.0.increment(name, labels);
    }

    pub fn record(&self, name: &'static str, elapsed: Duration, labels: Labels<'_>) {
        self.0.record(name, elapsed, labels);
    }
}

impl Default for SharedMetrics {
    fn default() -> Self {
        Self::new(GlobalMetrics)
    }
}

impl From<Arc<dyn MetricsSink>> for SharedMetrics {
    fn from(sink: Arc<dyn MetricsSink>) -> Self {
        Self(sink)
    }
}

impl fmt::Debug for SharedMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedMetrics")
    }
}

/// Install the Prometheus recorder with an HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint listening");
    Ok(())
}
