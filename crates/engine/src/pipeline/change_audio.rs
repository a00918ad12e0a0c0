//! Audio-replacement (lip-sync) pipeline. Always asynchronous: the credit
//! debit happens only after the webhook confirms completion.

use vidova_core::collab::InferenceRequest;
use vidova_core::job::{ChangeAudioInput, Job};

use crate::error::EngineError;
use crate::pipeline::{PipelineOutcome, Pipelines};
use crate::step::StepContext;

pub(crate) async fn run(
    p: &Pipelines,
    job: &Job,
    input: &ChangeAudioInput,
    steps: &StepContext,
) -> Result<PipelineOutcome, EngineError> {
    let video_url = p.collab.signer.presign_get(&input.source_video_key).await?;
    let audio_url = p.collab.signer.presign_get(&input.new_audio_key).await?;
    let request = InferenceRequest::LipSync {
        video_url,
        audio_url,
    };
    p.submit_and_suspend(job, steps, "submit-lip-sync", request)
        .await
}
