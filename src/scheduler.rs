//! Probe Scheduler
//!
//! Runs one pass over every target immediately, then one pass per interval.
//! Passes never overlap: when a pass overruns the interval the next one
//! starts as soon as it finishes, and missed ticks are not replayed.
//! Targets within a pass are checked one at a time in configured order.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::error::{Error, Result};
use crate::metrics::MetricsRegistry;
use crate::probe::{Checker, ProbeOutcome, Target};

/// Default time between pass starts
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Totals for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Targets checked and recorded
    pub checked: usize,

    /// Targets that answered HTTP 200
    pub reachable: usize,
}

/// Drives the checker over all targets and records the outcomes
pub struct Scheduler {
    targets: Vec<Target>,
    interval: Duration,
    checker: Arc<dyn Checker>,
    registry: Arc<MetricsRegistry>,
}

impl Scheduler {
    /// Create a scheduler. The interval must be non-zero.
    pub fn new(
        targets: Vec<Target>,
        interval: Duration,
        checker: Arc<dyn Checker>,
        registry: Arc<MetricsRegistry>,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::Config("check interval must be greater than zero".into()));
        }

        Ok(Self {
            targets,
            interval,
            checker,
            registry,
        })
    }

    /// Targets in check order
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Time between pass starts
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Check and record every target once
    pub async fn run_pass(&self) -> PassSummary {
        self.pass(&CancellationToken::new()).await
    }

    /// Run passes until `shutdown` is cancelled. The first pass starts
    /// immediately.
    #[instrument(skip_all, fields(targets = self.targets.len(), interval = ?self.interval))]
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            "Starting scheduler: {} targets every {:?}",
            self.targets.len(),
            self.interval
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let summary = self.pass(&shutdown).await;
            info!(
                "Pass complete: {}/{} targets up",
                summary.reachable, summary.checked
            );
        }

        info!("Scheduler stopped");
    }

    /// Start [`Scheduler::run`] as a background task
    pub fn spawn(self, shutdown: CancellationToken) -> SchedulerHandle {
        let token = shutdown.clone();
        let task = tokio::spawn(async move { self.run(token).await });

        SchedulerHandle { shutdown, task }
    }

    async fn pass(&self, shutdown: &CancellationToken) -> PassSummary {
        let mut summary = PassSummary::default();

        for target in &self.targets {
            if shutdown.is_cancelled() {
                break;
            }

            let outcome = self.check_target(target).await;
            self.registry.record(&outcome);

            summary.checked += 1;
            if outcome.reachable() {
                summary.reachable += 1;
            }
        }

        summary
    }

    /// Run one check in its own task so a panicking checker still yields a
    /// recorded failure.
    async fn check_target(&self, target: &Target) -> ProbeOutcome {
        let checker = Arc::clone(&self.checker);
        let owned = target.clone();

        match tokio::spawn(async move { checker.check(&owned).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error checking URL {}: check aborted: {}", target, e);
                ProbeOutcome::failed(target.clone(), format!("check aborted: {}", e))
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("targets", &self.targets)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Handle to a running scheduler task
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Ask the loop to stop after the check in flight, if any
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    /// Whether the loop has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the loop to exit
    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Scheduler task failed: {}", e)))
    }
}
