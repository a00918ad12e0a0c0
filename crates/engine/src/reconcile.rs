//! Provider webhook reconciliation.
//!
//! The asynchronous provider delivers callbacks at least once, in any
//! order, for jobs of any kind. The reconciler resolves the callback's
//! correlation id to a job and applies at most one terminal transition;
//! every other case (unknown id, already-terminal job, progress notice)
//! is acknowledged without mutation so the provider stops retrying.

use std::sync::Arc;

use vidova_core::collab::StorageImporter;
use vidova_core::job::Job;
use vidova_core::store::GenerationStore;
use vidova_core::types::Id;
use vidova_core::webhook::{CallbackOutcome, ProviderCallback};

use crate::error::EngineError;

/// How a callback was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Artifact imported, job completed, credit debited.
    Completed,
    /// Job transitioned to `failed`.
    Failed,
    /// The job was already terminal; nothing mutated.
    AlreadyProcessed,
    /// No job carries this correlation id (stale or foreign callback).
    UnknownCorrelation,
    /// Intermediate progress notice; no transition.
    Ignored,
}

/// Applies provider callbacks to suspended jobs.
pub struct WebhookReconciler {
    store: Arc<dyn GenerationStore>,
    importer: Arc<dyn StorageImporter>,
}

impl WebhookReconciler {
    pub fn new(store: Arc<dyn GenerationStore>, importer: Arc<dyn StorageImporter>) -> Self {
        Self { store, importer }
    }

    /// Reconcile one callback. Never returns an error for duplicate or
    /// unknown deliveries; `Err` means the store itself failed.
    pub async fn reconcile(
        &self,
        callback: &ProviderCallback,
    ) -> Result<ReconcileOutcome, EngineError> {
        let Some(job) = self.store.job_by_correlation(&callback.request_id).await? else {
            tracing::warn!(
                request_id = %callback.request_id,
                "Callback for unknown correlation id",
            );
            return Ok(ReconcileOutcome::UnknownCorrelation);
        };

        if job.status.is_terminal() {
            tracing::info!(
                job_id = %job.id,
                request_id = %callback.request_id,
                "Duplicate callback for terminal job",
            );
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        match callback.outcome() {
            CallbackOutcome::Other => {
                tracing::debug!(
                    job_id = %job.id,
                    status = %callback.status,
                    "Progress callback acknowledged",
                );
                Ok(ReconcileOutcome::Ignored)
            }
            CallbackOutcome::Failure => {
                let detail = callback.error_detail();
                tracing::warn!(job_id = %job.id, detail = %detail, "Provider reported failure");
                self.fail(job.id, &detail).await
            }
            CallbackOutcome::Success => self.complete(&job, callback).await,
        }
    }

    async fn complete(
        &self,
        job: &Job,
        callback: &ProviderCallback,
    ) -> Result<ReconcileOutcome, EngineError> {
        let Some(url) = callback.artifact_url() else {
            return self
                .fail(job.id, "Provider reported success without a video artifact")
                .await;
        };

        let output_key = match self.importer.import_remote(url).await {
            Ok(key) => key,
            Err(e) => {
                return self
                    .fail(job.id, &format!("Artifact import failed: {e}"))
                    .await;
            }
        };

        // The conditional terminal write gates the debit: only the
        // delivery that actually completes the job pays for it.
        if self.store.complete_job(job.id, &output_key).await? {
            let balance = self.store.debit_credit(job.owner_id).await?;
            tracing::info!(
                job_id = %job.id,
                output_key = %output_key,
                balance,
                "Job completed from provider callback",
            );
            Ok(ReconcileOutcome::Completed)
        } else {
            Ok(ReconcileOutcome::AlreadyProcessed)
        }
    }

    async fn fail(&self, job_id: Id, reason: &str) -> Result<ReconcileOutcome, EngineError> {
        if self.store.fail_job(job_id, reason).await? {
            Ok(ReconcileOutcome::Failed)
        } else {
            Ok(ReconcileOutcome::AlreadyProcessed)
        }
    }
}
