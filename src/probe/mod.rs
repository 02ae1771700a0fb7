//! Probing
//!
//! Targets, the checker that probes them, and the outcome of one probe.

mod checker;
mod outcome;
mod target;

pub use checker::{Checker, HttpChecker, DEFAULT_REQUEST_TIMEOUT};
pub use outcome::{ProbeOutcome, ProbeResult, UP_STATUS};
pub use target::Target;
