//! Provider webhook callback shapes.
//!
//! The asynchronous inference provider delivers completion notices to a
//! fixed endpoint, at least once, in this shape. Parsing lives in `core`
//! so both the HTTP layer and the reconciler tests share one definition.

use serde::{Deserialize, Serialize};

/// Inbound callback body from the asynchronous inference provider.
///
/// Only `request_id` and `status` are guaranteed; everything else depends
/// on the outcome and on which provider-side model produced the result.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderCallback {
    /// Correlation id assigned at submission time.
    pub request_id: String,
    /// Raw outcome string, e.g. `"OK"`, `"failed"`, `"in_progress"`.
    pub status: String,
    #[serde(default)]
    pub payload: Option<CallbackPayload>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Success payload; failure callbacks may carry only `detail`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CallbackPayload {
    #[serde(default)]
    pub video: Option<VideoArtifact>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Reference to a provider-hosted output artifact.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoArtifact {
    pub url: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Interpreted callback outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The generation finished; the payload should carry the artifact.
    Success,
    /// The generation failed on the provider side.
    Failure,
    /// An intermediate progress notice; acknowledged without a transition.
    Other,
}

impl ProviderCallback {
    /// Map the raw status string to an outcome.
    pub fn outcome(&self) -> CallbackOutcome {
        match self.status.as_str() {
            "OK" => CallbackOutcome::Success,
            "failed" | "error" | "ERROR" => CallbackOutcome::Failure,
            _ => CallbackOutcome::Other,
        }
    }

    /// The output artifact URL, when the success payload carries one.
    pub fn artifact_url(&self) -> Option<&str> {
        self.payload
            .as_ref()
            .and_then(|p| p.video.as_ref())
            .map(|v| v.url.as_str())
    }

    /// Best-available failure detail for the job record.
    pub fn error_detail(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.payload.as_ref().and_then(|p| p.detail.clone()))
            .unwrap_or_else(|| "Unknown provider error".to_string())
    }
}
