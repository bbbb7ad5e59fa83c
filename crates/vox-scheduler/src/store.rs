//! In-memory job registry (process lifetime only).

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use vox_types::{Job, JobFailure, JobState, JobStore, JobStoreError};

/// `JobStore` over a map; entries are never evicted.
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: Job) -> Result<(), JobStoreError> {
        let mut guard = self.jobs.write().await;
        if guard.contains_key(&job.job_id) {
            return Err(JobStoreError::AlreadyExists(job.job_id));
        }
        guard.insert(job.job_id.clone(), job);
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<Job>, JobStoreError> {
        let guard = self.jobs.read().await;
        Ok(guard.get(job_id).cloned())
    }

    async fn set_state(
        &self,
        job_id: &str,
        state: JobState,
        failure: Option<JobFailure>,
    ) -> Result<Job, JobStoreError> {
        let mut guard = self.jobs.write().await;
        let job = guard
            .get_mut(job_id)
            .ok_or_else(|| JobStoreError::NotFound(job_id.to_string()))?;
        if !job.state.can_transition_to(state) {
            return Err(JobStoreError::InvalidTransition {
                job_id: job_id.to_string(),
                from: job.state,
                to: state,
            });
        }
        job.state = state;
        job.updated_at = Utc::now().to_rfc3339();
        job.failure = match state {
            JobState::Failed => failure,
            _ => None,
        };
        Ok(job.clone())
    }
}
