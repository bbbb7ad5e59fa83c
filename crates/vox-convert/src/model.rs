//! Model-facing traits: speaker embeddings, tone color conversion, loading.

use crate::Device;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use vox_types::ConvertError;

/// Fixed-size summary of a speaker's voice produced by the external model.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerEmbedding(pub Vec<f32>);

impl SpeakerEmbedding {
    /// Parse a JSON float array (either flat or nested one level, as `[[...]]`).
    pub fn from_json(raw: &str) -> Result<Self, ConvertError> {
        let value: serde_json::Value = serde_json::from_str(raw.trim())
            .map_err(|e| ConvertError::InvalidEmbedding(e.to_string()))?;
        let mut out = Vec::new();
        flatten_into(&value, &mut out, 0)?;
        if out.is_empty() {
            return Err(ConvertError::InvalidEmbedding("empty embedding".to_string()));
        }
        Ok(Self(out))
    }

    pub fn to_json(&self) -> String {
        serde_json::Value::from(self.0.clone()).to_string()
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }
}

fn flatten_into(
    value: &serde_json::Value,
    out: &mut Vec<f32>,
    depth: usize,
) -> Result<(), ConvertError> {
    match value {
        serde_json::Value::Number(n) => {
            let x = n
                .as_f64()
                .ok_or_else(|| ConvertError::InvalidEmbedding(format!("bad number {}", n)))?;
            out.push(x as f32);
            Ok(())
        }
        serde_json::Value::Array(items) if depth < 2 => {
            for item in items {
                flatten_into(item, out, depth + 1)?;
            }
            Ok(())
        }
        other => Err(ConvertError::InvalidEmbedding(format!(
            "expected float array, got {}",
            other
        ))),
    }
}

/// A loaded tone color converter.
#[async_trait]
pub trait ToneColorModel: Send + Sync {
    /// Extract the speaker embedding of `audio`; `vad` trims silence first.
    async fn extract_embedding(
        &self,
        audio: &Path,
        vad: bool,
    ) -> Result<SpeakerEmbedding, ConvertError>;

    /// Re-voice `source` from `source_se` to `target_se`, writing `output`.
    async fn convert(
        &self,
        source: &Path,
        source_se: &SpeakerEmbedding,
        target_se: &SpeakerEmbedding,
        output: &Path,
    ) -> Result<(), ConvertError>;

    /// Release model resources. Default: nothing to release.
    async fn unload(&self) -> Result<(), ConvertError> {
        Ok(())
    }
}

/// Loads checkpoints and produces a ready model for `device`.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, device: Device) -> Result<Arc<dyn ToneColorModel>, ConvertError>;
}
