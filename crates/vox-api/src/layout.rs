//! On-disk layout of the data root.

use std::path::{Path, PathBuf};

/// Extension of every final output file.
pub const OUTPUT_EXT: &str = "mp3";
/// Content type the download endpoint serves outputs with.
pub const OUTPUT_CONTENT_TYPE: &str = "audio/mpeg";

/// Fixed directories under the data root.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn downloads(&self) -> PathBuf {
        self.root.join("downloaded_audios")
    }

    pub fn processed(&self) -> PathBuf {
        self.root.join("processed_audios")
    }

    pub fn outputs(&self) -> PathBuf {
        self.root.join("output_audios")
    }

    /// Reserved for caption artifacts; nothing writes here yet.
    pub fn captions(&self) -> PathBuf {
        self.root.join("captions")
    }

    /// Per-job download directory.
    pub fn download_dir(&self, job_id: &str) -> PathBuf {
        self.downloads().join(job_id)
    }

    pub fn output_file_name(job_id: &str) -> String {
        format!("{}.{}", job_id, OUTPUT_EXT)
    }

    pub fn output_path(&self, job_id: &str) -> PathBuf {
        self.outputs().join(Self::output_file_name(job_id))
    }

    /// Create every directory of the layout.
    pub async fn create_all(&self) -> std::io::Result<()> {
        for dir in [
            self.downloads(),
            self.processed(),
            self.outputs(),
            self.captions(),
        ] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }
}

/// Job ids usable as file names: non-empty ASCII alphanumerics, `-` and `_`.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
