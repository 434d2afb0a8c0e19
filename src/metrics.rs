//! Prometheus metrics.
//!
//! Operations record through the `metrics` facade; nothing is collected until
//! `MetricsService::install` registers the Prometheus recorder.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

use crate::error::{Error, Result};

/// Total requests per operation.
pub const REQUESTS_TOTAL: &str = "villa_search_requests_total";

/// Failed requests per operation.
pub const FAILURES_TOTAL: &str = "villa_search_failures_total";

/// Operation latency in seconds.
pub const DURATION_SECONDS: &str = "villa_search_duration_seconds";

/// Operations the indexer exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Index,
    Search,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Index => "index",
            Operation::Search => "search",
            Operation::Delete => "delete",
        }
    }
}

/// Record one completed operation.
pub fn record_operation(operation: Operation, started: Instant, success: bool) {
    let label = operation.as_str();
    counter!(REQUESTS_TOTAL, "operation" => label).increment(1);
    if !success {
        counter!(FAILURES_TOTAL, "operation" => label).increment(1);
    }
    histogram!(DURATION_SECONDS, "operation" => label).record(started.elapsed().as_secs_f64());
}

/// Owns the Prometheus recorder handle used to render `/metrics`.
#[derive(Clone)]
pub struct MetricsService {
    handle: PrometheusHandle,
}

impl MetricsService {
    /// Install the global Prometheus recorder.
    ///
    /// Fails if a recorder is already installed in this process.
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| Error::Config(format!("Failed to install metrics recorder: {}", e)))?;
        Ok(Self { handle })
    }

    /// Current metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
