//! Scheduler trait: submit a conversion job, get status.

use async_trait::async_trait;
use vox_types::{Job, JobInput, JobStoreError};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("job store: {0}")]
    Store(#[from] JobStoreError),
    #[error("scheduler error: {0}")]
    Other(String),
}

/// Runs conversion jobs in the background; status can be polled.
///
/// Contract: `submit` registers the job as Processing before it returns, so a
/// subsequent `get_status` never yields `Ok(None)` for it. `get_status` returns
/// `Ok(None)` for unknown ids; the API layer maps that to "Not Found".
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Register the job and queue its conversion + merge.
    async fn submit(&self, input: JobInput) -> Result<Job, SchedulerError>;

    /// Get current job state by id.
    async fn get_status(&self, job_id: &str) -> Result<Option<Job>, SchedulerError>;
}
