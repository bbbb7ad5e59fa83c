//! Mock backends for tests: no external runtime, no GPU.

use crate::{Device, ModelLoader, SpeakerEmbedding, ToneColorModel};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vox_types::{AudioMerger, ConvertError, MergeError};

const DIM: usize = 256;

/// Loader that counts loads and can fail the first `n` of them.
pub struct MockModelLoader {
    loads: AtomicUsize,
    fail_first: usize,
    fail_convert: bool,
}

impl MockModelLoader {
    pub fn new() -> Self {
        Self {
            loads: AtomicUsize::new(0),
            fail_first: 0,
            fail_convert: false,
        }
    }

    /// The first `n` loads fail with a checkpoint error.
    pub fn failing_loads(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Self::new()
        }
    }

    /// Loads succeed but every conversion fails.
    pub fn failing_conversions() -> Self {
        Self {
            fail_convert: true,
            ..Self::new()
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl Default for MockModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ModelLoader for MockModelLoader {
    async fn load(&self, _device: Device) -> Result<Arc<dyn ToneColorModel>, ConvertError> {
        let n = self.loads.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            return Err(ConvertError::Checkpoint("mock checkpoint missing".to_string()));
        }
        Ok(Arc::new(MockToneColorModel {
            fail_convert: self.fail_convert,
        }))
    }
}

/// Model whose "conversion" copies the source audio to the output.
pub struct MockToneColorModel {
    pub fail_convert: bool,
}

#[async_trait::async_trait]
impl ToneColorModel for MockToneColorModel {
    async fn extract_embedding(
        &self,
        audio: &Path,
        _vad: bool,
    ) -> Result<SpeakerEmbedding, ConvertError> {
        let len = tokio::fs::metadata(audio).await?.len();
        let v = (0..DIM)
            .map(|i| ((len as usize + i) % 17) as f32 / 17.0)
            .collect();
        Ok(SpeakerEmbedding(v))
    }

    async fn convert(
        &self,
        source: &Path,
        _source_se: &SpeakerEmbedding,
        _target_se: &SpeakerEmbedding,
        output: &Path,
    ) -> Result<(), ConvertError> {
        if self.fail_convert {
            return Err(ConvertError::Runtime("mock conversion failed".to_string()));
        }
        tokio::fs::copy(source, output).await?;
        Ok(())
    }
}

/// Merger that copies the processed file to the output path.
#[derive(Default)]
pub struct CopyMerger {
    pub fail: bool,
}

impl CopyMerger {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait::async_trait]
impl AudioMerger for CopyMerger {
    async fn merge_audio(&self, output: &Path, processed: &Path) -> Result<(), MergeError> {
        if self.fail {
            return Err(MergeError::Runtime("mock merge failed".to_string()));
        }
        tokio::fs::copy(processed, output).await?;
        Ok(())
    }
}
