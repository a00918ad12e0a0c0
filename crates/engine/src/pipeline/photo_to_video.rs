//! Photo-to-video (talking avatar) pipeline.
//!
//! Two execution modes share the audio-preparation step. The experimental
//! mode submits to the asynchronous avatar provider and suspends; the
//! standard mode calls the synchronous renderer and completes in-line,
//! debiting on success.

use vidova_core::collab::InferenceRequest;
use vidova_core::job::{Job, PhotoToVideoInput};

use crate::error::EngineError;
use crate::pipeline::{PipelineOutcome, Pipelines};
use crate::step::StepContext;

pub(crate) async fn run(
    p: &Pipelines,
    job: &Job,
    input: &PhotoToVideoInput,
    steps: &StepContext,
) -> Result<PipelineOutcome, EngineError> {
    let script = input.script.as_deref().unwrap_or_default();

    // Driving audio: supplied by the user, or synthesized from the script.
    let audio_key: String = match input.driving_audio_key.as_deref() {
        Some(key) if !key.trim().is_empty() => key.to_string(),
        _ => {
            steps
                .run("synthesize-speech", || async {
                    let key = p
                        .collab
                        .speech
                        .synthesize(script, input.voice_key.as_deref())
                        .await?;
                    Ok(key)
                })
                .await?
        }
    };

    if input.experimental_model {
        // Presigning is read-only, so a replay minting fresh URLs is
        // harmless; the submission itself is memoized inside
        // `submit_and_suspend`.
        let photo_url = p.collab.signer.presign_get(&input.photo_key).await?;
        let audio_url = p.collab.signer.presign_get(&audio_key).await?;
        let request = InferenceRequest::AvatarGeneration {
            photo_url,
            audio_url,
            prompt: script.to_string(),
        };
        return p
            .submit_and_suspend(job, steps, "submit-avatar-generation", request)
            .await;
    }

    let video_key: String = steps
        .run("render-video", || async {
            let key = p
                .collab
                .renderer
                .render(script, &input.photo_key, Some(&audio_key))
                .await?;
            Ok(key)
        })
        .await?;

    p.debit_once(job, steps).await?;
    p.store.complete_job(job.id, &video_key).await?;
    Ok(PipelineOutcome::Completed)
}
