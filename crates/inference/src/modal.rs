//! Clients for the Modal-hosted synchronous models.
//!
//! Unlike the fal queue these endpoints block until the model finishes
//! and return the S3 key of the produced artifact directly.

use async_trait::async_trait;
use serde::Deserialize;
use vidova_core::collab::{CollabError, SpeechSynthesizer, VideoRenderer};

#[derive(Debug, Deserialize)]
struct TtsResponse {
    s3_key: String,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    video_s3_key: String,
}

/// Caller identity for Modal web endpoints.
#[derive(Debug, Clone)]
pub struct ModalCredentials {
    pub key: String,
    pub secret: String,
}

/// Client for the Modal text-to-speech and photo-to-video endpoints.
pub struct ModalEndpoints {
    http: reqwest::Client,
    tts_url: String,
    photo_to_video_url: String,
    credentials: ModalCredentials,
}

impl ModalEndpoints {
    pub fn new(
        tts_url: String,
        photo_to_video_url: String,
        credentials: ModalCredentials,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            tts_url,
            photo_to_video_url,
            credentials,
        }
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<T, CollabError> {
        let response = self
            .http
            .post(url)
            .header("Modal-Key", &self.credentials.key)
            .header("Modal-Secret", &self.credentials.secret)
            .json(&body)
            .send()
            .await
            .map_err(|e| CollabError::new("modal", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CollabError::new(
                "modal",
                format!("endpoint returned {status}: {detail}"),
            ));
        }

        response.json().await.map_err(|e| CollabError::new("modal", e))
    }
}

#[async_trait]
impl SpeechSynthesizer for ModalEndpoints {
    async fn synthesize(
        &self,
        script: &str,
        voice_key: Option<&str>,
    ) -> Result<String, CollabError> {
        let body = serde_json::json!({
            "text": script,
            "voice_s3_key": voice_key,
        });
        let tts: TtsResponse = self.call(&self.tts_url, body).await?;
        tracing::info!(key = %tts.s3_key, "Synthesized speech from script");
        Ok(tts.s3_key)
    }
}

#[async_trait]
impl VideoRenderer for ModalEndpoints {
    async fn render(
        &self,
        script: &str,
        photo_key: &str,
        audio_key: Option<&str>,
    ) -> Result<String, CollabError> {
        let body = serde_json::json!({
            "transcript": script,
            "photo_s3_key": photo_key,
            "audio_s3_key": audio_key,
        });
        let rendered: RenderResponse = self.call(&self.photo_to_video_url, body).await?;
        tracing::info!(key = %rendered.video_s3_key, "Rendered photo-to-video output");
        Ok(rendered.video_s3_key)
    }
}
