//! Request and response DTOs for the public HTTP API.

use crate::{JobFailure, JobState};
use serde::{Deserialize, Serialize};

/// Acknowledgement returned once a job has been queued.
pub const PROCESSING_STARTED: &str = "Processing started";

/// Status sentinel for ids the registry has never seen.
pub const NOT_FOUND: &str = "Not Found";

/// Voice-clone submission: the voice to copy and the audio to re-voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneRequest {
    pub clone_audio_url: String,
    pub original_audio_url: String,
}

/// Response to a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub audio_id: String,
    pub status: String,
}

impl SubmitResponse {
    pub fn started(audio_id: impl Into<String>) -> Self {
        Self {
            audio_id: audio_id.into(),
            status: PROCESSING_STARTED.to_string(),
        }
    }
}

/// Response to a status poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub video_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,
}

impl StatusResponse {
    /// Build from a registry lookup; `None` maps to the "Not Found" sentinel.
    pub fn from_lookup(video_id: impl Into<String>, job: Option<&crate::Job>) -> Self {
        let video_id = video_id.into();
        match job {
            Some(job) => Self {
                video_id,
                status: job.state.as_str().to_string(),
                error: match job.state {
                    JobState::Failed => job.failure.clone(),
                    _ => None,
                },
            },
            None => Self {
                video_id,
                status: NOT_FOUND.to_string(),
                error: None,
            },
        }
    }
}

/// Error body, shaped like the `{"detail": ...}` payloads clients already parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
