//! Collaborator contracts the orchestration engine depends on.
//!
//! Each external service the pipelines touch (object storage, speech
//! synthesis, the synchronous renderer, the asynchronous inference queue)
//! is expressed as an async trait. Implementations are constructed once at
//! startup and passed into the engine as trait objects; no module-level
//! clients exist anywhere in the codebase.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Failure calling an external collaborator.
///
/// Collaborator failures are never retried by the engine; the pipeline
/// records them on the job and stops.
#[derive(Debug, thiserror::Error)]
#[error("{collaborator}: {message}")]
pub struct CollabError {
    /// Which collaborator failed, e.g. `"storage"` or `"inference-queue"`.
    pub collaborator: &'static str,
    pub message: String,
}

impl CollabError {
    pub fn new(collaborator: &'static str, message: impl std::fmt::Display) -> Self {
        Self {
            collaborator,
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Object storage
// ---------------------------------------------------------------------------

/// What an uploaded file is for; determines the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPurpose {
    PtvPhoto,
    PtvAudio,
    TtsVoiceClone,
    VtSource,
    CvaVideo,
    CvaAudio,
}

impl UploadPurpose {
    /// Key folder for this purpose.
    pub fn folder(self) -> &'static str {
        match self {
            UploadPurpose::PtvPhoto | UploadPurpose::PtvAudio => "ptv",
            UploadPurpose::TtsVoiceClone => "tts",
            UploadPurpose::VtSource => "vt",
            UploadPurpose::CvaVideo | UploadPurpose::CvaAudio => "cva",
        }
    }
}

/// Build a storage key for a new upload: `<folder>/<uuid>.<ext>`.
///
/// The extension is taken from the client-supplied file name; files
/// without one get a bare uuid key.
pub fn upload_key(purpose: UploadPurpose, file_name: &str) -> String {
    let id = uuid::Uuid::new_v4();
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{}/{id}.{ext}", purpose.folder())
        }
        _ => format!("{}/{id}", purpose.folder()),
    }
}

/// A presigned upload slot issued to a client.
#[derive(Debug, Clone, Serialize)]
pub struct PresignedUpload {
    /// Temporary PUT URL the client uploads to.
    pub url: String,
    /// Storage key the upload lands at.
    pub key: String,
}

/// Issues temporary URLs for objects in owned storage.
#[async_trait]
pub trait StorageSigner: Send + Sync {
    /// Presign a readable GET URL for an existing object.
    async fn presign_get(&self, key: &str) -> Result<String, CollabError>;

    /// Presign an upload slot for a new client-side upload.
    async fn presign_upload(
        &self,
        file_name: &str,
        content_type: &str,
        purpose: UploadPurpose,
    ) -> Result<PresignedUpload, CollabError>;
}

/// Pulls a provider-hosted result into owned storage.
#[async_trait]
pub trait StorageImporter: Send + Sync {
    /// Download `url` and persist it, returning the new storage key.
    async fn import_remote(&self, url: &str) -> Result<String, CollabError>;
}

// ---------------------------------------------------------------------------
// Synchronous model endpoints
// ---------------------------------------------------------------------------

/// Text-to-speech collaborator.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech audio from `script`, optionally cloning the voice
    /// sampled at `voice_key`. Returns the storage key of the audio.
    async fn synthesize(
        &self,
        script: &str,
        voice_key: Option<&str>,
    ) -> Result<String, CollabError>;
}

/// Synchronous photo-to-video renderer (the standard, non-experimental path).
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Render a talking-head video; returns the storage key of the video.
    async fn render(
        &self,
        script: &str,
        photo_key: &str,
        audio_key: Option<&str>,
    ) -> Result<String, CollabError>;
}

// ---------------------------------------------------------------------------
// Asynchronous inference queue
// ---------------------------------------------------------------------------

/// A submission to the asynchronous inference provider's queue.
///
/// All three operations complete out-of-band: the provider later delivers
/// a callback carrying the correlation id returned at submission.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceRequest {
    /// Animate a photo with driving audio (experimental avatar model).
    AvatarGeneration {
        photo_url: String,
        audio_url: String,
        prompt: String,
    },
    /// Dub a video into another language.
    Dubbing {
        video_url: String,
        target_language: String,
    },
    /// Replace a video's audio with lip-sync correction.
    LipSync { video_url: String, audio_url: String },
}

/// Asynchronous inference provider queue.
#[async_trait]
pub trait InferenceQueue: Send + Sync {
    /// Submit a request; completion is delivered later to `callback_url`.
    /// Returns the provider's correlation id.
    async fn submit(
        &self,
        request: &InferenceRequest,
        callback_url: &str,
    ) -> Result<String, CollabError>;
}
