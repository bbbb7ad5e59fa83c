//! Job lifecycle types: Job, JobState, JobFailure.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// State of a voice-clone job.
///
/// The only legal transition is `Processing` to one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Processing => "Processing",
            JobState::Completed => "Completed",
            JobState::Failed => "Failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Processing)
    }

    /// Whether a job in `self` may move to `next`.
    pub fn can_transition_to(self, next: JobState) -> bool {
        self == JobState::Processing && next.is_terminal()
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stage of the background task failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Conversion,
    Merge,
    Io,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Conversion => write!(f, "conversion"),
            FailureKind::Merge => write!(f, "merge"),
            FailureKind::Io => write!(f, "io"),
        }
    }
}

/// Failure detail kept on a Failed job so clients can see what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// One submitted job as held by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub state: JobState,
    /// Final output location, derived from the job id.
    pub output_path: PathBuf,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<JobFailure>,
}

/// Everything the background task needs to run one job.
#[derive(Debug, Clone)]
pub struct JobInput {
    pub job_id: String,
    /// Voice sample whose timbre is transferred.
    pub clone_audio: PathBuf,
    /// Content audio that gets re-voiced.
    pub original_audio: PathBuf,
    pub output_path: PathBuf,
}
