//! Probe outcomes
//!
//! A [`ProbeOutcome`] lives for the duration of one check-and-record step and
//! is not retained afterwards.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Target;

/// HTTP status that counts as "up"
pub const UP_STATUS: u16 = 200;

/// What a single probe produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeResult {
    /// A complete HTTP response was received, whatever its status
    Response {
        status: u16,
        #[serde(serialize_with = "serialize_duration_ms")]
        latency: Duration,
    },

    /// The request did not complete (timeout, refused, DNS, TLS, body read).
    /// The reason is kept for logging only.
    Failed { reason: String },
}

/// Result of checking one target once
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    /// Target that was probed
    pub target: Target,

    /// Response or failure
    pub result: ProbeResult,

    /// When the probe finished
    pub timestamp: DateTime<Utc>,
}

impl ProbeOutcome {
    /// Outcome for a received response
    pub fn response(target: Target, status: u16, latency: Duration) -> Self {
        Self {
            target,
            result: ProbeResult::Response { status, latency },
            timestamp: Utc::now(),
        }
    }

    /// Outcome for a request that never completed
    pub fn failed(target: Target, reason: impl Into<String>) -> Self {
        Self {
            target,
            result: ProbeResult::Failed {
                reason: reason.into(),
            },
            timestamp: Utc::now(),
        }
    }

    /// True only for a response with status 200
    pub fn reachable(&self) -> bool {
        matches!(
            self.result,
            ProbeResult::Response {
                status: UP_STATUS,
                ..
            }
        )
    }

    /// Round-trip latency in milliseconds; 0 when the request failed.
    pub fn latency_ms(&self) -> f64 {
        match &self.result {
            ProbeResult::Response { latency, .. } => duration_ms(*latency),
            ProbeResult::Failed { .. } => 0.0,
        }
    }

    /// HTTP status, if a response arrived
    pub fn status(&self) -> Option<u16> {
        match self.result {
            ProbeResult::Response { status, .. } => Some(status),
            ProbeResult::Failed { .. } => None,
        }
    }
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

fn serialize_duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration_ms(*duration))
}
