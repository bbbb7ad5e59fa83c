//! Audio merger backed by the `ffmpeg` command line tool.

use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;
use vox_types::{AudioMerger, MergeError};

/// Renders the processed audio into an MP3 at the output path.
pub struct FfmpegMerger {
    program: String,
}

impl FfmpegMerger {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegMerger {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

fn merge_args(output: &Path, processed: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(processed.as_os_str().to_owned());
    for a in ["-vn", "-c:a", "libmp3lame", "-q:a", "2"] {
        args.push(OsString::from(a));
    }
    args.push(output.as_os_str().to_owned());
    args
}

#[async_trait::async_trait]
impl AudioMerger for FfmpegMerger {
    async fn merge_audio(&self, output: &Path, processed: &Path) -> Result<(), MergeError> {
        if !tokio::fs::try_exists(processed).await? {
            return Err(MergeError::Runtime(format!(
                "processed audio missing: {}",
                processed.display()
            )));
        }
        let out = Command::new(&self.program)
            .args(merge_args(output, processed))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MergeError::Runtime(format!("failed to launch {}: {}", self.program, e)))?;
        if !out.status.success() {
            return Err(MergeError::Runtime(format!(
                "{} exited with {}: {}",
                self.program,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        tracing::debug!(output = %output.display(), "audio written");
        Ok(())
    }
}
