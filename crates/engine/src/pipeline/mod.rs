//! Per-kind generation pipelines.
//!
//! A pipeline drives one claimed job from `processing` to either a
//! synchronous completion or a suspension point. Suspension is the moment
//! an asynchronous provider submission returns a correlation id: the id is
//! recorded durably, the run ends, and the job is resumed only by the
//! webhook reconciler. There is no in-memory continuation to lose across
//! restarts.

mod change_audio;
mod photo_to_video;
mod translate;

use std::sync::Arc;

use vidova_core::collab::{
    InferenceQueue, InferenceRequest, SpeechSynthesizer, StorageSigner, VideoRenderer,
};
use vidova_core::job::{Job, JobInput};
use vidova_core::store::GenerationStore;

use crate::error::EngineError;
use crate::step::StepContext;

/// External-service handles the pipelines run against, built once at
/// startup and shared.
#[derive(Clone)]
pub struct Collaborators {
    pub signer: Arc<dyn StorageSigner>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub renderer: Arc<dyn VideoRenderer>,
    pub queue: Arc<dyn InferenceQueue>,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The job reached `completed` synchronously.
    Completed,
    /// The job was handed to the asynchronous provider; the webhook
    /// reconciler finishes it.
    Suspended,
}

/// Pipeline runner for all job kinds.
pub struct Pipelines {
    store: Arc<dyn GenerationStore>,
    collab: Collaborators,
    /// Public URL of the inference webhook endpoint, passed to the
    /// provider at submission time.
    callback_url: String,
}

impl Pipelines {
    pub fn new(
        store: Arc<dyn GenerationStore>,
        collab: Collaborators,
        callback_url: String,
    ) -> Self {
        Self {
            store,
            collab,
            callback_url,
        }
    }

    /// Run the pipeline for a claimed job.
    ///
    /// The caller is responsible for the `queued -> processing` claim and
    /// for recording failures: an `Err` here means the job should be
    /// failed with the error's message.
    pub async fn run(&self, job: &Job) -> Result<PipelineOutcome, EngineError> {
        let steps = StepContext::new(Arc::clone(&self.store), job.id);
        tracing::info!(job_id = %job.id, kind = job.kind.as_str(), "Pipeline started");

        match &job.input {
            JobInput::PhotoToVideo(input) => photo_to_video::run(self, job, input, &steps).await,
            JobInput::Translate(input) => translate::run(self, job, input, &steps).await,
            JobInput::ChangeAudio(input) => change_audio::run(self, job, input, &steps).await,
        }
    }

    /// Submit to the asynchronous provider and suspend the job.
    ///
    /// The submission is memoized: a replay reuses the recorded
    /// correlation id instead of enqueueing a second provider request.
    async fn submit_and_suspend(
        &self,
        job: &Job,
        steps: &StepContext,
        step_name: &str,
        request: InferenceRequest,
    ) -> Result<PipelineOutcome, EngineError> {
        let correlation_id: String = steps
            .run(step_name, || async {
                let id = self
                    .collab
                    .queue
                    .submit(&request, &self.callback_url)
                    .await?;
                Ok(id)
            })
            .await?;

        self.store.record_correlation(job.id, &correlation_id).await?;
        tracing::info!(
            job_id = %job.id,
            correlation_id = %correlation_id,
            "Job suspended awaiting provider callback",
        );
        Ok(PipelineOutcome::Suspended)
    }

    /// Debit one credit for a synchronously completed generation.
    ///
    /// Memoized so a replayed pipeline never debits twice.
    async fn debit_once(&self, job: &Job, steps: &StepContext) -> Result<(), EngineError> {
        let _balance: i64 = steps
            .run("debit-credit", || async {
                let balance = self.store.debit_credit(job.owner_id).await?;
                Ok(balance)
            })
            .await?;
        Ok(())
    }
}
