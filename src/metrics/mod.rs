//! Metrics module
//!
//! Per-target probe metrics and the HTTP server that exposes them.

mod exporter;
mod registry;

pub use exporter::{MetricsServer, DEFAULT_METRICS_PORT};
pub use registry::{
    MetricsRegistry, TargetSample, REQUEST_COUNT_METRIC, RESPONSE_MS_METRIC, UP_METRIC, URL_LABEL,
};
