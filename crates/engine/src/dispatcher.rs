//! Background job dispatcher.
//!
//! A single long-lived task that claims queued jobs in FIFO order and
//! launches their pipelines. All admission decisions (credit precheck,
//! per-user concurrency) happen on this task, so they are serialized; the
//! pipelines themselves run concurrently on spawned tasks tracked for
//! graceful shutdown.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use vidova_core::job::Job;
use vidova_core::store::GenerationStore;
use vidova_core::types::Id;

use crate::admission::{AdmissionController, AdmissionPermit};
use crate::error::EngineError;
use crate::pipeline::{PipelineOutcome, Pipelines};

/// Default polling interval for the dispatcher loop.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Queued jobs examined per dispatch cycle.
const CLAIM_BATCH: i64 = 32;

/// Claims queued jobs and runs their pipelines.
pub struct Dispatcher {
    store: Arc<dyn GenerationStore>,
    pipelines: Arc<Pipelines>,
    admission: Arc<AdmissionController>,
    notify: Arc<Notify>,
    poll_interval: Duration,
    tasks: TaskTracker,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn GenerationStore>,
        pipelines: Arc<Pipelines>,
        admission: Arc<AdmissionController>,
    ) -> Self {
        Self {
            store,
            pipelines,
            admission,
            notify: Arc::new(Notify::new()),
            poll_interval: DEFAULT_POLL_INTERVAL,
            tasks: TaskTracker::new(),
        }
    }

    /// Handle the submission path uses to wake the loop immediately after
    /// creating a job, instead of waiting for the next poll tick.
    pub fn notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }

    /// Run the dispatch loop until the token is cancelled, then wait for
    /// in-flight pipeline tasks to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Job dispatcher started",
        );

        match self.recover_stalled().await {
            Ok(resumed) if !resumed.is_empty() => {
                tracing::info!(count = resumed.len(), "Resumed jobs interrupted by restart");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Recovery pass failed");
            }
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job dispatcher shutting down");
                    break;
                }
                _ = self.notify.notified() => {}
                _ = ticker.tick() => {}
            }
            if let Err(e) = self.dispatch_once().await {
                tracing::error!(error = %e, "Dispatch cycle failed");
            }
        }

        self.tasks.close();
        self.tasks.wait().await;
    }

    /// One dispatch cycle over the queued backlog.
    ///
    /// Jobs are visited oldest-first. When a user is at their concurrency
    /// limit, all of that user's remaining queued jobs are skipped for the
    /// cycle so their own FIFO order is preserved.
    pub async fn dispatch_once(&self) -> Result<Vec<JoinHandle<()>>, EngineError> {
        let queued = self.store.queued_jobs(CLAIM_BATCH).await?;
        let mut blocked: HashSet<Id> = HashSet::new();
        let mut launched = Vec::new();

        for job in queued {
            if blocked.contains(&job.owner_id) {
                continue;
            }
            match self.admit(&job).await {
                Ok(Admitted::Launched(handle)) => launched.push(handle),
                Ok(Admitted::Skipped) => {}
                Ok(Admitted::AtCapacity) => {
                    blocked.insert(job.owner_id);
                }
                Err(e) => {
                    tracing::error!(job_id = %job.id, error = %e, "Admission check failed");
                }
            }
        }
        Ok(launched)
    }

    /// Relaunch jobs a previous process left mid-pipeline.
    ///
    /// A job in `processing` with no correlation id was claimed but never
    /// reached a provider submission or a terminal write; only a crash
    /// leaves it there. Memoized steps let the relaunch skip whatever the
    /// first run recorded. Jobs suspended on the provider are excluded;
    /// the webhook resumes those.
    pub async fn recover_stalled(&self) -> Result<Vec<JoinHandle<()>>, EngineError> {
        let stalled = self.store.stalled_jobs(CLAIM_BATCH).await?;
        let mut launched = Vec::new();
        for job in stalled {
            // Admission already passed on the first claim; only the
            // concurrency slot is re-taken.
            let Some(permit) = self.admission.try_acquire(job.owner_id) else {
                continue;
            };
            tracing::warn!(job_id = %job.id, "Resuming job interrupted mid-pipeline");
            launched.push(self.launch(job, permit));
        }
        Ok(launched)
    }

    /// Admit one queued job: credit precheck, concurrency slot, claim.
    async fn admit(&self, job: &Job) -> Result<Admitted, EngineError> {
        // Zero balance is a terminal outcome, not a wait: the job is
        // rejected without ever consuming a slot.
        let balance = self.store.credit_balance(job.owner_id).await?;
        if balance <= 0 {
            if self.store.mark_no_credits(job.id).await? {
                tracing::info!(job_id = %job.id, owner_id = %job.owner_id, "Job rejected: no credits");
            }
            return Ok(Admitted::Skipped);
        }

        let Some(permit) = self.admission.try_acquire(job.owner_id) else {
            return Ok(Admitted::AtCapacity);
        };

        // A replayed cycle may find the job already claimed; the permit
        // just drops.
        if !self.store.mark_processing(job.id).await? {
            return Ok(Admitted::Skipped);
        }

        Ok(Admitted::Launched(self.launch(job.clone(), permit)))
    }

    fn launch(&self, job: Job, permit: AdmissionPermit) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let pipelines = Arc::clone(&self.pipelines);
        self.tasks.spawn(async move {
            // Permit held for the whole run; released when the pipeline
            // completes, fails, or suspends.
            let _permit = permit;
            match pipelines.run(&job).await {
                Ok(PipelineOutcome::Completed) => {
                    tracing::info!(job_id = %job.id, "Job completed synchronously");
                }
                Ok(PipelineOutcome::Suspended) => {}
                Err(e) => {
                    tracing::error!(job_id = %job.id, error = %e, "Pipeline failed");
                    if let Err(write_err) = store.fail_job(job.id, &e.to_string()).await {
                        tracing::error!(
                            job_id = %job.id,
                            error = %write_err,
                            "Failed to record pipeline failure",
                        );
                    }
                }
            }
        })
    }
}

enum Admitted {
    /// Pipeline task spawned.
    Launched(JoinHandle<()>),
    /// Nothing to do: no credits, or the job was claimed elsewhere.
    Skipped,
    /// Owner is at the concurrency limit; their queue waits.
    AtCapacity,
}
