//! fal.ai queue client.
//!
//! Submissions go to `https://queue.fal.run/<model>?fal_webhook=<url>`;
//! the queue answers immediately with a `request_id` and delivers the
//! final result to the webhook later. The `request_id` is the job's
//! provider correlation id.

use async_trait::async_trait;
use serde::Deserialize;
use vidova_core::collab::{CollabError, InferenceQueue, InferenceRequest};

/// Queue base URL.
const QUEUE_BASE_URL: &str = "https://queue.fal.run";

/// Avatar model: animates a still photo with driving audio.
const AVATAR_MODEL: &str = "fal-ai/ai-avatar";

/// Dubbing model: translates and re-voices a video.
const DUBBING_MODEL: &str = "fal-ai/dubbing";

/// Lip-sync model: replaces a video's audio track.
const LIPSYNC_MODEL: &str = "fal-ai/sync-lipsync";

/// Prompt used when an avatar job carries no script text.
const DEFAULT_AVATAR_PROMPT: &str = "A person talking naturally";

/// The model to submit a request to.
fn model_id(request: &InferenceRequest) -> &'static str {
    match request {
        InferenceRequest::AvatarGeneration { .. } => AVATAR_MODEL,
        InferenceRequest::Dubbing { .. } => DUBBING_MODEL,
        InferenceRequest::LipSync { .. } => LIPSYNC_MODEL,
    }
}

/// Build the model input body for a request.
fn request_body(request: &InferenceRequest) -> serde_json::Value {
    match request {
        InferenceRequest::AvatarGeneration {
            photo_url,
            audio_url,
            prompt,
        } => {
            let prompt = if prompt.trim().is_empty() {
                DEFAULT_AVATAR_PROMPT
            } else {
                prompt.as_str()
            };
            serde_json::json!({
                "image_url": photo_url,
                "audio_url": audio_url,
                "prompt": prompt,
                "num_frames": 145,
                "resolution": "720p",
                "seed": 42,
                "acceleration": "regular",
            })
        }
        InferenceRequest::Dubbing {
            video_url,
            target_language,
        } => serde_json::json!({
            "video_url": video_url,
            "target_language": target_language,
            "do_lipsync": true,
        }),
        InferenceRequest::LipSync {
            video_url,
            audio_url,
        } => serde_json::json!({
            "video_url": video_url,
            "audio_url": audio_url,
            "model": "lipsync-1.9.0-beta",
            "sync_mode": "cut_off",
        }),
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
}

/// Client for the fal.ai submission queue.
pub struct FalQueueClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FalQueueClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, QUEUE_BASE_URL.to_string())
    }

    /// Point the client at a different queue host (tests, staging).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl InferenceQueue for FalQueueClient {
    async fn submit(
        &self,
        request: &InferenceRequest,
        callback_url: &str,
    ) -> Result<String, CollabError> {
        let model = model_id(request);
        let url = format!("{}/{model}", self.base_url);

        let response = self
            .http
            .post(&url)
            .query(&[("fal_webhook", callback_url)])
            .header("Authorization", format!("Key {}", self.api_key))
            .json(&request_body(request))
            .send()
            .await
            .map_err(|e| CollabError::new("inference-queue", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollabError::new(
                "inference-queue",
                format!("{model} submission returned {status}: {body}"),
            ));
        }

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| CollabError::new("inference-queue", e))?;

        tracing::info!(
            model,
            request_id = %submitted.request_id,
            "Submitted asynchronous inference request",
        );
        Ok(submitted.request_id)
    }
}
