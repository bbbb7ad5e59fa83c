//! Traits for the job registry and the external collaborators (download, conversion, merge).

use crate::{Job, JobFailure, JobState};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Job registry abstraction.
///
/// Contract: `get` returns `Ok(None)` for unknown ids. `set_state` only accepts the
/// Processing -> {Completed, Failed} transition and rejects everything else with
/// `InvalidTransition`, leaving the stored job untouched.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Register a new job. An existing entry with the same id is an error.
    async fn create(&self, job: Job) -> Result<(), JobStoreError>;

    /// Look up a job by id.
    async fn get(&self, job_id: &str) -> Result<Option<Job>, JobStoreError>;

    /// Move a job to a terminal state; `failure` is kept only for `Failed`.
    async fn set_state(
        &self,
        job_id: &str,
        state: JobState,
        failure: Option<JobFailure>,
    ) -> Result<Job, JobStoreError>;
}

/// Downloads a remote audio file to local storage.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Stream `url` into `dest_dir/file_name`; returns the written path.
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, FetchError>;
}

/// Voice conversion boundary: re-voice `input` with the timbre of `target`.
#[async_trait]
pub trait VoiceConverter: Send + Sync {
    async fn process_audio(
        &self,
        input: &Path,
        target: &Path,
        output: &Path,
    ) -> Result<(), ConvertError>;
}

/// Audio write/merge boundary: render `processed` into the final file at `output`.
#[async_trait]
pub trait AudioMerger: Send + Sync {
    async fn merge_audio(&self, output: &Path, processed: &Path) -> Result<(), MergeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("job already exists: {0}")]
    AlreadyExists(String),
    #[error("job {job_id}: illegal transition {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: JobState,
        to: JobState,
    },
    #[error("job store error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to download audio: Status code {status} ({url})")]
    Status { url: String, status: u16 },
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("checkpoint error: {0}")]
    Checkpoint(String),
    #[error("conversion runtime error: {0}")]
    Runtime(String),
    #[error("invalid speaker embedding: {0}")]
    InvalidEmbedding(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("merge runtime error: {0}")]
    Runtime(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
