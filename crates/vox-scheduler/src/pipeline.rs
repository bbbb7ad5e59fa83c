//! Background conversion + merge for one job.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use vox_types::{
    AudioMerger, ConvertError, FailureKind, JobFailure, JobInput, MergeError, VoiceConverter,
};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Convert(#[from] ConvertError),
    #[error("{0}")]
    Merge(#[from] MergeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Failure detail recorded on the job.
    pub fn failure(&self) -> JobFailure {
        let kind = match self {
            PipelineError::Convert(_) => FailureKind::Conversion,
            PipelineError::Merge(_) => FailureKind::Merge,
            PipelineError::Io(_) => FailureKind::Io,
        };
        JobFailure {
            kind,
            message: self.to_string(),
        }
    }
}

/// Converts the original audio to the clone voice, then writes the final file.
///
/// Intermediates live in `<work_root>/<job_id>/`, which is removed afterwards.
/// The final file is moved into place only once it is complete.
pub struct Pipeline {
    converter: Arc<dyn VoiceConverter>,
    merger: Arc<dyn AudioMerger>,
    work_root: PathBuf,
}

impl Pipeline {
    pub fn new(
        converter: Arc<dyn VoiceConverter>,
        merger: Arc<dyn AudioMerger>,
        work_root: impl AsRef<Path>,
    ) -> Self {
        Self {
            converter,
            merger,
            work_root: work_root.as_ref().to_path_buf(),
        }
    }

    pub fn work_dir(&self, job_id: &str) -> PathBuf {
        self.work_root.join(job_id)
    }

    pub async fn run(&self, input: &JobInput) -> Result<(), PipelineError> {
        let work_dir = self.work_dir(&input.job_id);
        tokio::fs::create_dir_all(&work_dir).await?;
        let result = self.run_in(&work_dir, input).await;
        if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
            tracing::warn!(job_id = %input.job_id, error = %e, "failed to clean work dir");
        }
        result
    }

    async fn run_in(&self, work_dir: &Path, input: &JobInput) -> Result<(), PipelineError> {
        let processed = work_dir.join("processed.mp3");
        self.converter
            .process_audio(&input.original_audio, &input.clone_audio, &processed)
            .await?;

        let merged = work_dir.join("final.mp3");
        self.merger.merge_audio(&merged, &processed).await?;

        if let Some(parent) = input.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if let Err(e) = tokio::fs::rename(&merged, &input.output_path).await {
            tracing::debug!(
                job_id = %input.job_id,
                error = %e,
                "rename into output dir failed, copying instead"
            );
            publish_by_copy(&merged, &input.output_path).await?;
        }
        Ok(())
    }
}

/// Copy to a sibling of `dest`, then rename within the output dir.
/// The staging file is removed if either step fails.
async fn publish_by_copy(src: &Path, dest: &Path) -> Result<(), PipelineError> {
    let staging = dest.with_extension("mp3.part");
    let copied = match tokio::fs::copy(src, &staging).await {
        Ok(_) => tokio::fs::rename(&staging, dest).await,
        Err(e) => Err(e),
    };
    if let Err(e) = copied {
        tracing::warn!(
            output = %dest.display(),
            error = %e,
            "failed to publish output"
        );
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }
    Ok(())
}
