//! Probe metrics registry
//!
//! Holds the three per-target series scraped by Prometheus. Every value is a
//! prometheus atomic, so scrapes never observe a torn value and concurrent
//! records never lose a counter increment. The three updates of one
//! [`MetricsRegistry::record`] are not applied as a group.

use dashmap::DashMap;
use prometheus::{Encoder, Gauge, GaugeVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::error::{Error, Result};
use crate::probe::{ProbeOutcome, Target};

/// Up/down gauge family
pub const UP_METRIC: &str = "sample_external_url_up";

/// Latency gauge family
pub const RESPONSE_MS_METRIC: &str = "sample_external_url_response_ms";

/// Check counter family
pub const REQUEST_COUNT_METRIC: &str = "sample_external_url_request_count";

/// Label carrying the target URL
pub const URL_LABEL: &str = "url";

/// Current values for one target
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSample {
    /// 1 if the last check got HTTP 200, else 0
    pub up: f64,

    /// Latency of the last check; 0 if it failed
    pub response_ms: f64,

    /// Completed checks since startup
    pub request_count: u64,
}

/// Cached child handles for one target's series
#[derive(Clone)]
struct TargetSeries {
    up: Gauge,
    response_ms: Gauge,
    request_count: IntCounter,
}

/// Registry of per-target probe metrics.
///
/// Owns its own [`prometheus::Registry`] rather than the process-wide
/// default one, so several instances can coexist (tests do this).
pub struct MetricsRegistry {
    registry: Registry,
    up: GaugeVec,
    response_ms: GaugeVec,
    request_count: IntCounterVec,
    series: DashMap<Target, TargetSeries>,
}

impl MetricsRegistry {
    /// Create a registry with the three metric families registered
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let up = GaugeVec::new(
            Opts::new(UP_METRIC, "URL status (1 = up, 0 = down)"),
            &[URL_LABEL],
        )?;
        let response_ms = GaugeVec::new(
            Opts::new(RESPONSE_MS_METRIC, "URL response time in milliseconds"),
            &[URL_LABEL],
        )?;
        let request_count = IntCounterVec::new(
            Opts::new(REQUEST_COUNT_METRIC, "Counter of URL checks"),
            &[URL_LABEL],
        )?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(response_ms.clone()))?;
        registry.register(Box::new(request_count.clone()))?;

        Ok(Self {
            registry,
            up,
            response_ms,
            request_count,
            series: DashMap::new(),
        })
    }

    /// Record the outcome of one completed check.
    ///
    /// Latency is overwritten on every check, including with 0 on failure.
    pub fn record(&self, outcome: &ProbeOutcome) {
        let series = self.series_for(&outcome.target);

        series.up.set(if outcome.reachable() { 1.0 } else { 0.0 });
        series.response_ms.set(outcome.latency_ms());
        series.request_count.inc();

        debug!(
            url = %outcome.target,
            up = outcome.reachable(),
            response_ms = outcome.latency_ms(),
            "Recorded probe outcome"
        );
    }

    /// Current values for a target, or `None` before its first check
    pub fn sample(&self, target: &Target) -> Option<TargetSample> {
        self.series.get(target).map(|series| TargetSample {
            up: series.up.get(),
            response_ms: series.response_ms.get(),
            request_count: series.request_count.get(),
        })
    }

    /// Targets recorded at least once
    pub fn targets(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = self.series.iter().map(|e| e.key().clone()).collect();
        targets.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        targets
    }

    /// Render all series in the Prometheus text exposition format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;

        String::from_utf8(buffer)
            .map_err(|e| Error::Internal(format!("Metrics output is not UTF-8: {}", e)))
    }

    fn series_for(&self, target: &Target) -> TargetSeries {
        if let Some(series) = self.series.get(target) {
            return series.value().clone();
        }

        self.series
            .entry(target.clone())
            .or_insert_with(|| {
                let url = target.as_str();
                TargetSeries {
                    up: self.up.with_label_values(&[url]),
                    response_ms: self.response_ms.with_label_values(&[url]),
                    request_count: self.request_count.with_label_values(&[url]),
                }
            })
            .value()
            .clone()
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("targets", &self.series.len())
            .finish()
    }
}
