//! Video translation (dubbing) pipeline. Always asynchronous: the credit
//! debit happens only after the webhook confirms completion.

use vidova_core::collab::InferenceRequest;
use vidova_core::job::{Job, TranslateInput};

use crate::error::EngineError;
use crate::pipeline::{PipelineOutcome, Pipelines};
use crate::step::StepContext;

pub(crate) async fn run(
    p: &Pipelines,
    job: &Job,
    input: &TranslateInput,
    steps: &StepContext,
) -> Result<PipelineOutcome, EngineError> {
    let video_url = p.collab.signer.presign_get(&input.source_video_key).await?;
    let request = InferenceRequest::Dubbing {
        video_url,
        target_language: input.target_language.clone(),
    };
    p.submit_and_suspend(job, steps, "submit-dubbing", request)
        .await
}
