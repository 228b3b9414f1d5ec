//! PollerActor - drives poll cycles on a fixed cadence
//!
//! ## Scheduling
//!
//! The actor owns the only cycle that can run. It runs one cycle as soon as it
//! starts, then re-arms itself from each cycle's start:
//!
//! ```text
//! next_start = started + interval
//! ```
//!
//! If a cycle outlasts the interval, `next_start` is already in the past and
//! the next cycle begins as soon as the current one returns. Cycles are awaited
//! inline, so two of them never run at the same time, and commands are only
//! looked at between cycles.
//!
//! ```text
//! sleep_until(next_start) → PollCycle::run → broadcast CycleReport → re-arm
//!     ↑
//!     └─── Commands (PollNow, GetStats, UpdateInterval, Shutdown)
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, instrument, trace, warn};

use super::cycle::PollCycle;
use super::messages::{CycleReport, PollerCommand, PollerStats};

/// Actor running the poll cycles
pub struct PollerActor {
    cycle: PollCycle,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<PollerCommand>,

    /// Broadcast sender for finished cycle reports
    report_tx: broadcast::Sender<CycleReport>,

    interval: Duration,

    stats: PollerStats,
}

impl PollerActor {
    pub fn new(
        cycle: PollCycle,
        interval: Duration,
        command_rx: mpsc::Receiver<PollerCommand>,
        report_tx: broadcast::Sender<CycleReport>,
    ) -> Self {
        let stats = PollerStats {
            interval_ms: interval.as_millis() as u64,
            ..PollerStats::default()
        };

        Self {
            cycle,
            command_rx,
            report_tx,
            interval,
            stats,
        }
    }

    /// Run the actor's main loop until `Shutdown` or until every handle is
    /// dropped.
    #[instrument(skip(self), fields(targets = self.cycle.targets().len()))]
    pub async fn run(mut self) {
        info!("starting poller with interval {:?}", self.interval);

        let started = Instant::now();
        self.run_cycle(started).await;
        let mut last_start = started;
        let mut next_start = started + self.interval;
        let mut shutdown_reply: Option<oneshot::Sender<()>> = None;

        loop {
            tokio::select! {
                _ = sleep_until(next_start) => {
                    let started = Instant::now();
                    self.run_cycle(started).await;
                    last_start = started;
                    next_start = started + self.interval;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(PollerCommand::PollNow { respond_to }) => {
                            debug!("received PollNow command");
                            let started = Instant::now();
                            let report = self.run_cycle(started).await;
                            last_start = started;
                            next_start = started + self.interval;
                            let _ = respond_to.send(report);
                        }

                        Some(PollerCommand::GetStats { respond_to }) => {
                            let _ = respond_to.send(self.stats.clone());
                        }

                        Some(PollerCommand::UpdateInterval { interval }) => {
                            debug!("updating interval to {:?}", interval);
                            self.interval = interval;
                            self.stats.interval_ms = interval.as_millis() as u64;
                            next_start = last_start + interval;
                        }

                        Some(PollerCommand::Shutdown { respond_to }) => {
                            debug!("received shutdown command");
                            self.command_rx.close();
                            shutdown_reply = Some(respond_to);
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        info!(
            "poller stopped after {} cycles",
            self.stats.cycles_completed
        );

        if let Some(respond_to) = shutdown_reply {
            let _ = respond_to.send(());
        }
    }

    async fn run_cycle(&mut self, started: Instant) -> CycleReport {
        let report = self.cycle.run().await;

        self.stats.record(&report);
        if started.elapsed() > self.interval {
            self.stats.overruns += 1;
            debug!(
                "cycle took {:?}, longer than the {:?} interval",
                started.elapsed(),
                self.interval
            );
        }

        match self.report_tx.send(report.clone()) {
            Ok(receivers) => trace!("published cycle report to {receivers} receivers"),
            Err(_) => trace!("no receivers for cycle report"),
        }

        report
    }
}

/// Handle for controlling a PollerActor
///
/// Cheap to clone; every clone talks to the same actor.
#[derive(Clone)]
pub struct PollerHandle {
    sender: mpsc::Sender<PollerCommand>,
    report_tx: broadcast::Sender<CycleReport>,
}

impl PollerHandle {
    /// Spawn the poller. The first cycle starts right away.
    pub fn spawn(
        cycle: PollCycle,
        interval: Duration,
        report_tx: broadcast::Sender<CycleReport>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = PollerActor::new(cycle, interval, cmd_rx, report_tx.clone());
        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            report_tx,
        }
    }

    /// Receive a `CycleReport` for every cycle finished from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CycleReport> {
        self.report_tx.subscribe()
    }

    /// Run a cycle outside the schedule and wait for its report
    pub async fn poll_now(&self) -> Result<CycleReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::PollNow { respond_to: tx })
            .await
            .context("failed to send PollNow command")?;

        rx.await.context("failed to receive cycle report")
    }

    pub async fn get_stats(&self) -> Result<PollerStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::GetStats { respond_to: tx })
            .await
            .context("failed to send GetStats command")?;

        rx.await.context("failed to receive poller stats")
    }

    pub async fn update_interval(&self, interval: Duration) -> Result<()> {
        self.sender
            .send(PollerCommand::UpdateInterval { interval })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    /// Stop the poller, waiting for an in-flight cycle to finish
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::Shutdown { respond_to: tx })
            .await
            .context("failed to send Shutdown command")?;

        rx.await.context("poller exited without acknowledging shutdown")
    }
}
