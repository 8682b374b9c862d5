//! Single-flight run gate and cron scheduling.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::error::{Result, SyncError};
use crate::orchestrator::{RunSummary, SyncOrchestrator};

#[derive(Debug)]
pub enum TriggerOutcome {
    Completed(RunSummary),
    /// Another run was already in flight; nothing was started.
    Skipped,
    Failed(SyncError),
}

/// Guarantees at most one synchronization run at a time. Triggers that
/// arrive while a run is active are dropped rather than queued.
#[derive(Debug)]
pub struct SyncRunner {
    orchestrator: SyncOrchestrator,
    gate: Mutex<()>,
}

impl SyncRunner {
    pub fn new(orchestrator: SyncOrchestrator) -> Self {
        Self {
            orchestrator,
            gate: Mutex::new(()),
        }
    }

    pub fn orchestrator(&self) -> &SyncOrchestrator {
        &self.orchestrator
    }

    pub fn is_running(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    pub async fn trigger(&self) -> TriggerOutcome {
        let Ok(_guard) = self.gate.try_lock() else {
            info!("synchronization already running; skipping trigger");
            return TriggerOutcome::Skipped;
        };

        match self.orchestrator.run().await {
            Ok(summary) => TriggerOutcome::Completed(summary),
            Err(err) => {
                error!(error = %err, "synchronization run failed");
                TriggerOutcome::Failed(err)
            }
        }
    }
}

/// Cron-driven trigger source for a [`SyncRunner`]. Schedules run in UTC.
pub struct SyncScheduler {
    inner: JobScheduler,
}

impl std::fmt::Debug for SyncScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncScheduler").finish_non_exhaustive()
    }
}

impl SyncScheduler {
    /// `cron` is a seconds-first expression.
    pub async fn start(runner: Arc<SyncRunner>, cron: &str) -> Result<Self> {
        let inner = JobScheduler::new().await.map_err(setup_error)?;

        let job = Job::new_async(cron, move |_uuid, _lock| {
            let runner = Arc::clone(&runner);
            Box::pin(async move {
                if let TriggerOutcome::Completed(summary) =
                    runner.trigger().await
                {
                    info!(
                        run_id = %summary.run_id,
                        candidates = summary.candidates,
                        "scheduled synchronization complete"
                    );
                }
            })
        })
        .map_err(|err| {
            SyncError::Setup(format!("invalid cron expression `{cron}`: {err}"))
        })?;

        inner.add(job).await.map_err(setup_error)?;
        inner.start().await.map_err(setup_error)?;
        info!(cron, "watchlist synchronization scheduled");

        Ok(Self { inner })
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.inner.shutdown().await.map_err(setup_error)
    }
}

fn setup_error(err: tokio_cron_scheduler::JobSchedulerError) -> SyncError {
    SyncError::Setup(format!("scheduler: {err}"))
}
