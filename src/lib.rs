//! URL Probe Exporter
//!
//! Periodically probes a fixed list of HTTP endpoints and exposes their
//! reachability and latency as Prometheus metrics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  check   ┌─────────────┐  record  ┌──────────────────┐
//! │  Scheduler  │─────────▶│   Checker   │─────────▶│ MetricsRegistry  │
//! │ (own task)  │          │ (HTTP GET)  │          │   (atomics)      │
//! └─────────────┘          └─────────────┘          └────────┬─────────┘
//!                                                            │ encode
//!                                                   ┌────────▼─────────┐
//!                                                   │  MetricsServer   │◀── scrape
//!                                                   └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`] - Exporter configuration and defaults
//! - [`error`] - Error types
//! - [`metrics`] - Metrics registry and exposition server
//! - [`probe`] - Targets, outcomes and the HTTP checker
//! - [`scheduler`] - Periodic probe loop

pub mod config;
pub mod error;
pub mod metrics;
pub mod probe;
pub mod scheduler;

pub use config::ExporterConfig;
pub use error::{Error, Result};
pub use metrics::{MetricsRegistry, MetricsServer, TargetSample};
pub use probe::{Checker, HttpChecker, ProbeOutcome, ProbeResult, Target};
pub use scheduler::{PassSummary, Scheduler, SchedulerHandle};
