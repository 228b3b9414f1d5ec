//! PollCycle - one pass over the target registry
//!
//! ## Message Flow
//!
//! ```text
//!              ┌──► worker(hostA) ──┐
//! run() ──────┼──► worker(hostB) ──┼──► results channel ──► collector ──► store.insert
//!              └──► worker(...)   ──┘
//!          (at most max_concurrency fetches in flight)
//! ```
//!
//! Workers only talk to the session client. The collector stamps, builds and
//! stores samples one at a time, so insertion order follows the timestamps.
//! Nothing in here fails as a whole: every failure is per target, logged, and
//! counted in the returned `CycleReport`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, instrument, trace, warn};

use crate::catalog::{VariableCatalog, VariableId};
use crate::config::Target;
use crate::snmp::{SessionClient, SessionError, SessionResult};
use crate::storage::{Sample, TelemetryStore};

use super::messages::CycleReport;

/// Everything a cycle needs, shared read-only between cycles
#[derive(Clone)]
pub struct PollCycle {
    client: Arc<dyn SessionClient>,
    store: Arc<dyn TelemetryStore>,
    targets: Arc<Vec<Target>>,
    catalog: Arc<VariableCatalog>,
    variables: Arc<[VariableId]>,
    timeout: Duration,
    max_concurrency: usize,
}

struct FetchOutcome {
    target: String,
    result: SessionResult<crate::snmp::RawReply>,
}

impl PollCycle {
    pub fn new(
        client: Arc<dyn SessionClient>,
        store: Arc<dyn TelemetryStore>,
        targets: Vec<Target>,
        catalog: VariableCatalog,
        timeout: Duration,
        max_concurrency: usize,
    ) -> Self {
        let variables: Arc<[VariableId]> = catalog.variable_ids().into();
        Self {
            client,
            store,
            targets: Arc::new(targets),
            catalog: Arc::new(catalog),
            variables,
            timeout,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Poll every target once and persist one sample per reachable target.
    #[instrument(skip(self), fields(targets = self.targets.len()))]
    pub async fn run(&self) -> CycleReport {
        let started_at = Utc::now();
        let mut report = CycleReport {
            started_at,
            finished_at: started_at,
            targets: self.targets.len(),
            samples_stored: 0,
            unreachable: 0,
            partial: 0,
            store_failures: 0,
        };

        let (result_tx, mut result_rx) = mpsc::channel(self.targets.len().max(1));
        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut workers = Vec::with_capacity(self.targets.len());

        for target in self.targets.iter().cloned() {
            let client = Arc::clone(&self.client);
            let variables = Arc::clone(&self.variables);
            let permits = Arc::clone(&permits);
            let result_tx = result_tx.clone();
            let timeout = self.timeout;
            let name = target.name.clone();

            let worker = tokio::spawn(async move {
                // The semaphore is never closed
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };

                trace!("fetching {} variables from {}", variables.len(), target.name);

                // Bounds clients that ignore their own timeout argument
                let result = match tokio::time::timeout(
                    timeout,
                    client.fetch(&target, &variables, timeout),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(SessionError::Timeout(timeout)),
                };

                let _ = result_tx
                    .send(FetchOutcome {
                        target: target.name,
                        result,
                    })
                    .await;
            });
            workers.push((name, worker));
        }
        drop(result_tx);

        while let Some(outcome) = result_rx.recv().await {
            self.collect(outcome, &mut report).await;
        }

        // Every sender is gone by now. A worker that panicked never reported
        // its target.
        for (name, worker) in workers {
            if let Err(e) = worker.await {
                error!("{name}: fetch worker failed: {e}");
                report.unreachable += 1;
            }
        }

        report.finished_at = Utc::now();
        debug!(
            "cycle finished in {:?}: {} stored, {} unreachable, {} partial, {} store failures",
            report.duration(),
            report.samples_stored,
            report.unreachable,
            report.partial,
            report.store_failures
        );
        report
    }

    async fn collect(&self, outcome: FetchOutcome, report: &mut CycleReport) {
        let FetchOutcome { target, result } = outcome;

        let (reply, partial) = match result {
            Ok(reply) => (reply, false),
            Err(SessionError::VariableErrors { reply, failed }) => {
                let failed = failed
                    .iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                warn!("{target}: variable errors for {failed}");
                (reply, true)
            }
            Err(e) => {
                warn!("{target}: unreachable this cycle: {e}");
                report.unreachable += 1;
                return;
            }
        };

        let sample = Sample::from_reply(target, Utc::now(), &reply, &self.catalog);

        match self.store.insert(&sample).await {
            Ok(id) => {
                trace!("stored sample {:?} for {}", id, sample.container);
                report.samples_stored += 1;
                if partial {
                    report.partial += 1;
                }
            }
            Err(e) => {
                error!("failed to store sample for {}: {}", sample.container, e);
                report.store_failures += 1;
            }
        }
    }
}
