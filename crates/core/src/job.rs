//! Generation job entities and the job status state machine.
//!
//! A job is one user-initiated generation request. The three kinds share a
//! single lifecycle shape; only their input payloads and pipelines differ.
//! Status transitions are strictly forward: once a job reaches a terminal
//! state it never mutates again (re-delivery of the same terminal write is
//! treated as a no-op by the store, not as a transition).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Id, Timestamp};

/// Maximum length of a job name (both derived and user-supplied).
pub const MAX_NAME_LEN: usize = 120;

/// Characters of script text used when deriving a default job name.
const NAME_FROM_SCRIPT_LEN: usize = 32;

/// Target languages the dubbing provider accepts.
pub const SUPPORTED_LANGUAGES: [&str; 3] = ["english", "hindi", "turkish"];

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The closed set of generation job kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    PhotoToVideo,
    Translate,
    ChangeAudio,
}

impl JobKind {
    /// Stable string form, used for persistence and logging.
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::PhotoToVideo => "photo_to_video",
            JobKind::Translate => "translate",
            JobKind::ChangeAudio => "change_audio",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "photo_to_video" => Ok(JobKind::PhotoToVideo),
            "translate" => Ok(JobKind::Translate),
            "change_audio" => Ok(JobKind::ChangeAudio),
            other => Err(CoreError::Internal(format!("Unknown job kind: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a job.
///
/// `Processing` covers both active pipeline execution and the
/// suspended-awaiting-webhook phase; a suspended job is a `Processing` job
/// whose `provider_correlation_id` is set and that holds no running task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    NoCredits,
}

impl JobStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::NoCredits => "no_credits",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "no_credits" => Ok(JobStatus::NoCredits),
            other => Err(CoreError::Internal(format!("Unknown job status: {other}"))),
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::NoCredits
        )
    }
}

/// Forward-only transition rules for the job lifecycle.
pub mod state_machine {
    use super::JobStatus;

    /// Returns the set of valid target statuses reachable from `from`.
    ///
    /// Terminal states return an empty slice.
    pub fn valid_transitions(from: JobStatus) -> &'static [JobStatus] {
        match from {
            JobStatus::Queued => &[
                JobStatus::Processing,
                JobStatus::Failed,
                JobStatus::NoCredits,
            ],
            JobStatus::Processing => &[JobStatus::Completed, JobStatus::Failed],
            JobStatus::Completed | JobStatus::Failed | JobStatus::NoCredits => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a transition, returning a descriptive error for invalid ones.
    pub fn validate_transition(from: JobStatus, to: JobStatus) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(format!(
                "Invalid transition: {} -> {}",
                from.as_str(),
                to.as_str()
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Kind-specific inputs
// ---------------------------------------------------------------------------

/// Parameters for a photo-to-video (talking avatar) generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoToVideoInput {
    /// Storage key of the source photo.
    pub photo_key: String,
    /// Script the avatar speaks. Required unless driving audio is supplied.
    pub script: Option<String>,
    /// Pre-recorded driving audio; when absent, audio is synthesized from
    /// the script via the text-to-speech collaborator.
    pub driving_audio_key: Option<String>,
    /// Voice-clone sample for speech synthesis.
    pub voice_key: Option<String>,
    /// Motion expressiveness tunable (model-defined range).
    pub expressiveness: Option<f64>,
    /// Whether to run the face-enhancement pass.
    #[serde(default)]
    pub enhancement: bool,
    /// Experimental path submits to the asynchronous avatar provider;
    /// the standard path calls the synchronous renderer.
    #[serde(default)]
    pub experimental_model: bool,
    /// Requested output resolution, e.g. `"720p"`.
    pub resolution: String,
}

/// Parameters for a video translation (dubbing) generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateInput {
    /// Storage key of the source video.
    pub source_video_key: String,
    /// Target language; must be one of [`SUPPORTED_LANGUAGES`].
    pub target_language: String,
}

/// Parameters for replacing a video's audio track with lip-sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeAudioInput {
    /// Storage key of the source video.
    pub source_video_key: String,
    /// Storage key of the replacement audio.
    pub new_audio_key: String,
}

/// Kind-specific immutable job payload, serialized as tagged JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobInput {
    PhotoToVideo(PhotoToVideoInput),
    Translate(TranslateInput),
    ChangeAudio(ChangeAudioInput),
}

impl JobInput {
    pub fn kind(&self) -> JobKind {
        match self {
            JobInput::PhotoToVideo(_) => JobKind::PhotoToVideo,
            JobInput::Translate(_) => JobKind::Translate,
            JobInput::ChangeAudio(_) => JobKind::ChangeAudio,
        }
    }

    /// Validate an input payload at job creation time.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            JobInput::PhotoToVideo(input) => {
                if input.photo_key.trim().is_empty() {
                    return Err(CoreError::Validation(
                        "photo_key must not be empty".to_string(),
                    ));
                }
                let has_script = input
                    .script
                    .as_deref()
                    .is_some_and(|s| !s.trim().is_empty());
                let has_audio = input
                    .driving_audio_key
                    .as_deref()
                    .is_some_and(|k| !k.trim().is_empty());
                if !has_script && !has_audio {
                    return Err(CoreError::Validation(
                        "photo-to-video requires a script or driving audio".to_string(),
                    ));
                }
                if input.resolution.trim().is_empty() {
                    return Err(CoreError::Validation(
                        "resolution must not be empty".to_string(),
                    ));
                }
                Ok(())
            }
            JobInput::Translate(input) => {
                if input.source_video_key.trim().is_empty() {
                    return Err(CoreError::Validation(
                        "source_video_key must not be empty".to_string(),
                    ));
                }
                if !SUPPORTED_LANGUAGES.contains(&input.target_language.as_str()) {
                    return Err(CoreError::Validation(format!(
                        "Unsupported target language: \"{}\"",
                        input.target_language
                    )));
                }
                Ok(())
            }
            JobInput::ChangeAudio(input) => {
                if input.source_video_key.trim().is_empty() {
                    return Err(CoreError::Validation(
                        "source_video_key must not be empty".to_string(),
                    ));
                }
                if input.new_audio_key.trim().is_empty() {
                    return Err(CoreError::Validation(
                        "new_audio_key must not be empty".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Derive a default display name when the client supplies none.
    ///
    /// Photo-to-video uses the leading script text; translation tags the
    /// timestamp with the target language; everything else falls back to
    /// the creation timestamp.
    pub fn default_name(&self, now: Timestamp) -> String {
        match self {
            JobInput::PhotoToVideo(input) => match input.script.as_deref() {
                Some(script) if !script.trim().is_empty() => {
                    script.chars().take(NAME_FROM_SCRIPT_LEN).collect()
                }
                _ => now.to_rfc3339(),
            },
            JobInput::Translate(input) => {
                format!("{} ({})", now.to_rfc3339(), input.target_language)
            }
            JobInput::ChangeAudio(_) => now.to_rfc3339(),
        }
    }
}

// ---------------------------------------------------------------------------
// Job record
// ---------------------------------------------------------------------------

/// A generation job tracked through its status lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Id,
    pub owner_id: Id,
    pub kind: JobKind,
    /// Human-readable display name, renamable by the owner.
    pub name: String,
    pub status: JobStatus,
    pub input: JobInput,
    /// Correlation key assigned when the job is handed to the asynchronous
    /// provider. Unique across all jobs of all kinds.
    pub provider_correlation_id: Option<String>,
    /// Storage key of the produced artifact. Set iff `status == Completed`.
    pub output_key: Option<String>,
    /// Failure detail recorded on the terminal `Failed` write.
    pub error_detail: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields required to create a job. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub owner_id: Id,
    pub name: String,
    pub input: JobInput,
}

impl NewJob {
    /// Build a new job record, validating the input and deriving a name
    /// when the client did not supply one.
    pub fn build(
        owner_id: Id,
        name: Option<String>,
        input: JobInput,
        now: Timestamp,
    ) -> Result<Self, CoreError> {
        input.validate()?;

        let name = match name {
            Some(n) if !n.trim().is_empty() => n,
            _ => input.default_name(now),
        };
        if name.len() > MAX_NAME_LEN {
            return Err(CoreError::Validation(format!(
                "Job name must not exceed {MAX_NAME_LEN} characters"
            )));
        }

        Ok(Self {
            owner_id,
            name,
            input,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::state_machine::*;
    use super::*;

    fn ptv_input() -> JobInput {
        JobInput::PhotoToVideo(PhotoToVideoInput {
            photo_key: "ptv/photo.jpg".to_string(),
            script: Some("Hello there".to_string()),
            driving_audio_key: None,
            voice_key: None,
            expressiveness: Some(0.7),
            enhancement: false,
            experimental_model: true,
            resolution: "720p".to_string(),
        })
    }

    // -- state machine --------------------------------------------------------

    #[test]
    fn queued_to_processing() {
        assert!(can_transition(JobStatus::Queued, JobStatus::Processing));
    }

    #[test]
    fn queued_to_no_credits() {
        assert!(can_transition(JobStatus::Queued, JobStatus::NoCredits));
    }

    #[test]
    fn processing_to_completed() {
        assert!(can_transition(JobStatus::Processing, JobStatus::Completed));
    }

    #[test]
    fn processing_to_failed() {
        assert!(can_transition(JobStatus::Processing, JobStatus::Failed));
    }

    #[test]
    fn no_resurrection_from_terminal_states() {
        for terminal in [JobStatus::Completed, JobStatus::Failed, JobStatus::NoCredits] {
            assert!(valid_transitions(terminal).is_empty());
        }
    }

    #[test]
    fn completed_cannot_become_failed() {
        assert!(validate_transition(JobStatus::Completed, JobStatus::Failed).is_err());
    }

    #[test]
    fn processing_cannot_return_to_queued() {
        assert!(!can_transition(JobStatus::Processing, JobStatus::Queued));
    }

    // -- status round-trips ---------------------------------------------------

    #[test]
    fn status_string_round_trip() {
        for status in [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::NoCredits,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn kind_string_round_trip() {
        for kind in [JobKind::PhotoToVideo, JobKind::Translate, JobKind::ChangeAudio] {
            assert_eq!(JobKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert!(JobStatus::parse("suspended").is_err());
    }

    // -- input validation -----------------------------------------------------

    #[test]
    fn valid_photo_to_video_input() {
        assert!(ptv_input().validate().is_ok());
    }

    #[test]
    fn photo_to_video_without_script_or_audio_rejected() {
        let input = JobInput::PhotoToVideo(PhotoToVideoInput {
            photo_key: "ptv/photo.jpg".to_string(),
            script: None,
            driving_audio_key: None,
            voice_key: None,
            expressiveness: None,
            enhancement: false,
            experimental_model: false,
            resolution: "720p".to_string(),
        });
        assert!(input.validate().is_err());
    }

    #[test]
    fn photo_to_video_with_audio_but_no_script_accepted() {
        let input = JobInput::PhotoToVideo(PhotoToVideoInput {
            photo_key: "ptv/photo.jpg".to_string(),
            script: None,
            driving_audio_key: Some("ptv/audio.wav".to_string()),
            voice_key: None,
            expressiveness: None,
            enhancement: false,
            experimental_model: false,
            resolution: "720p".to_string(),
        });
        assert!(input.validate().is_ok());
    }

    #[test]
    fn unsupported_language_rejected() {
        let input = JobInput::Translate(TranslateInput {
            source_video_key: "vt/video.mp4".to_string(),
            target_language: "klingon".to_string(),
        });
        assert!(input.validate().is_err());
    }

    #[test]
    fn change_audio_requires_both_keys() {
        let input = JobInput::ChangeAudio(ChangeAudioInput {
            source_video_key: "cva/video.mp4".to_string(),
            new_audio_key: "".to_string(),
        });
        assert!(input.validate().is_err());
    }

    // -- input serialization --------------------------------------------------

    #[test]
    fn input_json_is_kind_tagged() {
        let value = serde_json::to_value(ptv_input()).unwrap();
        assert_eq!(value["kind"], "photo_to_video");
        assert_eq!(value["photo_key"], "ptv/photo.jpg");

        let back: JobInput = serde_json::from_value(value).unwrap();
        assert_eq!(back.kind(), JobKind::PhotoToVideo);
    }

    // -- name derivation ------------------------------------------------------

    #[test]
    fn name_from_script_is_truncated() {
        let input = JobInput::PhotoToVideo(PhotoToVideoInput {
            photo_key: "p".to_string(),
            script: Some("a".repeat(100)),
            driving_audio_key: None,
            voice_key: None,
            expressiveness: None,
            enhancement: false,
            experimental_model: false,
            resolution: "720p".to_string(),
        });
        assert_eq!(input.default_name(chrono::Utc::now()).len(), 32);
    }

    #[test]
    fn translate_name_includes_language() {
        let input = JobInput::Translate(TranslateInput {
            source_video_key: "vt/video.mp4".to_string(),
            target_language: "hindi".to_string(),
        });
        assert!(input.default_name(chrono::Utc::now()).ends_with("(hindi)"));
    }

    #[test]
    fn new_job_uses_client_name_when_present() {
        let job = NewJob::build(
            uuid::Uuid::new_v4(),
            Some("My avatar".to_string()),
            ptv_input(),
            chrono::Utc::now(),
        )
        .unwrap();
        assert_eq!(job.name, "My avatar");
    }

    #[test]
    fn new_job_rejects_oversized_name() {
        let result = NewJob::build(
            uuid::Uuid::new_v4(),
            Some("x".repeat(MAX_NAME_LEN + 1)),
            ptv_input(),
            chrono::Utc::now(),
        );
        assert!(result.is_err());
    }
}
