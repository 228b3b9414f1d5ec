//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Commands**: Request/response messages sent to the poller via mpsc
//! 2. **Events**: A `CycleReport` is broadcast after every finished cycle
//! 3. **Replies**: oneshot channels for synchronous queries

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;

/// Commands that can be sent to the PollerActor
#[derive(Debug)]
pub enum PollerCommand {
    /// Run a cycle right away instead of waiting for the schedule.
    ///
    /// Never overlaps a scheduled cycle; the schedule is re-armed from this
    /// cycle's start.
    PollNow {
        respond_to: oneshot::Sender<CycleReport>,
    },

    /// Read the running counters
    GetStats {
        respond_to: oneshot::Sender<PollerStats>,
    },

    /// Change the polling interval
    ///
    /// Takes effect when the next cycle is scheduled.
    UpdateInterval { interval: Duration },

    /// Stop the poller.
    ///
    /// Commands are handled between cycles, so the reply is sent after the
    /// in-flight cycle (if any) has finished.
    Shutdown { respond_to: oneshot::Sender<()> },
}

/// Outcome of one poll cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Number of targets attempted
    pub targets: usize,

    /// Samples successfully appended to the store
    pub samples_stored: usize,

    /// Targets skipped because the exchange failed as a whole
    pub unreachable: usize,

    /// Stored samples that carry at least one variable error string
    pub partial: usize,

    /// Samples built but rejected by the store
    pub store_failures: usize,
}

impl CycleReport {
    /// Wall-clock duration of the cycle
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Poller statistics
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollerStats {
    pub cycles_completed: u64,

    /// Cycles that finished after the next one was due
    pub overruns: u64,

    pub samples_stored: u64,
    pub target_failures: u64,
    pub store_failures: u64,

    /// Current interval in milliseconds
    pub interval_ms: u64,

    pub last_cycle: Option<CycleReport>,
}

impl PollerStats {
    pub(crate) fn record(&mut self, report: &CycleReport) {
        self.cycles_completed += 1;
        self.samples_stored += report.samples_stored as u64;
        self.target_failures += report.unreachable as u64;
        self.store_failures += report.store_failures as u64;
        self.last_cycle = Some(report.clone());
    }
}
