//! Conversion backend that drives an external tone color runtime process.
//!
//! The runtime is invoked as `<program> [args..] <subcommand> ...`:
//!
//! - `extract-se --config C --checkpoint K --device D --input AUDIO [--vad]` prints the
//!   speaker embedding as a JSON float array on stdout.
//! - `convert --config C --checkpoint K --device D --input SRC --source-se F --target-se F
//!   --output OUT` writes the converted audio to `OUT`.

use crate::{Device, ModelLoader, SpeakerEmbedding, ToneColorModel};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use vox_types::ConvertError;

/// Loads the converter checkpoint from `<checkpoint_dir>/converter/`.
pub struct CommandModelLoader {
    program: String,
    args: Vec<String>,
    checkpoint_dir: PathBuf,
}

impl CommandModelLoader {
    pub fn new(program: impl Into<String>, checkpoint_dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            checkpoint_dir: checkpoint_dir.as_ref().to_path_buf(),
        }
    }

    /// Split a command line such as `python3 -m openvoice_cli` into program + leading args.
    pub fn from_command_line(command: &str, checkpoint_dir: impl AsRef<Path>) -> Self {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next().unwrap_or_default();
        Self {
            program,
            args: parts.collect(),
            checkpoint_dir: checkpoint_dir.as_ref().to_path_buf(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

#[async_trait::async_trait]
impl ModelLoader for CommandModelLoader {
    async fn load(&self, device: Device) -> Result<Arc<dyn ToneColorModel>, ConvertError> {
        if self.program.is_empty() {
            return Err(ConvertError::Runtime(
                "no conversion runtime configured".to_string(),
            ));
        }
        let converter_dir = self.checkpoint_dir.join("converter");
        let config = converter_dir.join("config.json");
        let checkpoint = converter_dir.join("checkpoint.pth");
        for path in [&config, &checkpoint] {
            if !tokio::fs::try_exists(path).await? {
                return Err(ConvertError::Checkpoint(format!(
                    "missing {}",
                    path.display()
                )));
            }
        }
        tracing::info!(
            program = %self.program,
            config = %config.display(),
            device = %device,
            "tone color converter checkpoint found"
        );
        Ok(Arc::new(CommandToneColorModel {
            program: self.program.clone(),
            args: self.args.clone(),
            config,
            checkpoint,
            device,
        }))
    }
}

/// A converter checkpoint bound to a device, executed through the runtime process.
pub struct CommandToneColorModel {
    program: String,
    args: Vec<String>,
    config: PathBuf,
    checkpoint: PathBuf,
    device: Device,
}

impl CommandToneColorModel {
    fn command(&self, subcommand: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(subcommand)
            .arg("--config")
            .arg(&self.config)
            .arg("--checkpoint")
            .arg(&self.checkpoint)
            .arg("--device")
            .arg(self.device.to_string())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, mut cmd: Command, what: &str) -> Result<Vec<u8>, ConvertError> {
        let out = cmd.output().await.map_err(|e| {
            ConvertError::Runtime(format!("failed to launch {}: {}", self.program, e))
        })?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ConvertError::Runtime(format!(
                "{} exited with {}: {}",
                what,
                out.status,
                stderr.trim()
            )));
        }
        Ok(out.stdout)
    }
}

fn sidecar(output: &Path, suffix: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{}.{}.json", stem, suffix))
}

#[async_trait::async_trait]
impl ToneColorModel for CommandToneColorModel {
    async fn extract_embedding(
        &self,
        audio: &Path,
        vad: bool,
    ) -> Result<SpeakerEmbedding, ConvertError> {
        let mut cmd = self.command("extract-se");
        cmd.arg("--input").arg(audio);
        if vad {
            cmd.arg("--vad");
        }
        let stdout = self.run(cmd, "extract-se").await?;
        SpeakerEmbedding::from_json(&String::from_utf8_lossy(&stdout))
    }

    async fn convert(
        &self,
        source: &Path,
        source_se: &SpeakerEmbedding,
        target_se: &SpeakerEmbedding,
        output: &Path,
    ) -> Result<(), ConvertError> {
        let source_se_path = sidecar(output, "source_se");
        let target_se_path = sidecar(output, "target_se");
        tokio::fs::write(&source_se_path, source_se.to_json()).await?;
        tokio::fs::write(&target_se_path, target_se.to_json()).await?;

        let mut cmd = self.command("convert");
        cmd.arg("--input")
            .arg(source)
            .arg("--source-se")
            .arg(&source_se_path)
            .arg("--target-se")
            .arg(&target_se_path)
            .arg("--output")
            .arg(output);
        let result = self.run(cmd, "convert").await;

        let _ = tokio::fs::remove_file(&source_se_path).await;
        let _ = tokio::fs::remove_file(&target_se_path).await;
        result?;

        if !tokio::fs::try_exists(output).await? {
            return Err(ConvertError::Runtime(format!(
                "convert produced no file at {}",
                output.display()
            )));
        }
        Ok(())
    }
}
