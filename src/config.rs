//! Exporter configuration

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::metrics::DEFAULT_METRICS_PORT;
use crate::probe::{Target, DEFAULT_REQUEST_TIMEOUT};
use crate::scheduler::DEFAULT_CHECK_INTERVAL;

/// Targets monitored when none are configured
pub const DEFAULT_TARGETS: &[&str] = &["https://httpstat.us/503", "https://httpstat.us/200"];

/// Everything needed to wire the exporter together
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Targets, in check order
    pub targets: Vec<Target>,

    /// Time between pass starts
    pub check_interval: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Exposition server listen address
    pub metrics_addr: SocketAddr,
}

impl ExporterConfig {
    /// Config for `targets` with the default interval, timeout and address
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            targets,
            check_interval: DEFAULT_CHECK_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            metrics_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_METRICS_PORT),
        }
    }

    /// The compiled-in target list. Any entry that fails to parse is an error.
    pub fn default_targets() -> Result<Vec<Target>> {
        DEFAULT_TARGETS.iter().map(|url| Target::parse(*url)).collect()
    }

    /// Reject settings the scheduler or checker cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.check_interval.is_zero() {
            return Err(Error::Config(
                "check interval must be greater than zero".into(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "request timeout must be greater than zero".into(),
            ));
        }

        // a repeated target would be counted twice per pass
        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target) {
                return Err(Error::Config(format!("duplicate target: {}", target)));
            }
        }

        Ok(())
    }
}
