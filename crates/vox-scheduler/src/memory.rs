//! In-memory scheduler: single queue + dispatcher, job state in a `JobStore`.

use crate::{Pipeline, Scheduler, SchedulerError};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use vox_types::{FailureKind, Job, JobFailure, JobInput, JobState, JobStore};

/// Queues jobs; a dispatcher runs up to `max_concurrent` pipelines at once and
/// records each outcome in the store.
pub struct InMemoryScheduler {
    store: Arc<dyn JobStore>,
    tx: mpsc::UnboundedSender<JobInput>,
}

impl InMemoryScheduler {
    /// Create scheduler and spawn the dispatcher. Must be called inside a tokio runtime.
    pub fn new(store: Arc<dyn JobStore>, pipeline: Arc<Pipeline>, max_concurrent: usize) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<JobInput>();
        let permits = Arc::new(Semaphore::new(max_concurrent.max(1)));

        let store_clone = Arc::clone(&store);
        tokio::spawn(async move {
            while let Some(input) = rx.recv().await {
                let permit = match Arc::clone(&permits).acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => break,
                };
                let store = Arc::clone(&store_clone);
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    run_job(store.as_ref(), &pipeline, input).await;
                    drop(permit);
                });
            }
        });

        Self { store, tx }
    }
}

async fn run_job(store: &dyn JobStore, pipeline: &Pipeline, input: JobInput) {
    tracing::info!(job_id = %input.job_id, "conversion started");
    let (state, failure) = match pipeline.run(&input).await {
        Ok(()) => {
            tracing::info!(
                job_id = %input.job_id,
                output = %input.output_path.display(),
                "conversion completed"
            );
            (JobState::Completed, None)
        }
        Err(e) => {
            tracing::error!(job_id = %input.job_id, error = %e, "conversion failed");
            (JobState::Failed, Some(e.failure()))
        }
    };
    if let Err(e) = store.set_state(&input.job_id, state, failure).await {
        tracing::warn!(job_id = %input.job_id, error = %e, "could not record job outcome");
    }
}

#[async_trait]
impl Scheduler for InMemoryScheduler {
    async fn submit(&self, input: JobInput) -> Result<Job, SchedulerError> {
        let now = Utc::now().to_rfc3339();
        let job = Job {
            job_id: input.job_id.clone(),
            state: JobState::Processing,
            output_path: input.output_path.clone(),
            created_at: now.clone(),
            updated_at: now,
            failure: None,
        };
        self.store.create(job.clone()).await?;
        let job_id = input.job_id.clone();
        if self.tx.send(input).is_err() {
            let failure = JobFailure {
                kind: FailureKind::Io,
                message: "worker channel closed".to_string(),
            };
            self.store
                .set_state(&job_id, JobState::Failed, Some(failure))
                .await?;
            return Err(SchedulerError::Other("worker channel closed".to_string()));
        }
        Ok(job)
    }

    async fn get_status(&self, job_id: &str) -> Result<Option<Job>, SchedulerError> {
        Ok(self.store.get(job_id).await?)
    }
}
