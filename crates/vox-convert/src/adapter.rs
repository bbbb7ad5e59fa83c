//! Voice conversion adapter with a shared, lazily loaded model handle.

use crate::{Device, ModelLoader, ToneColorModel};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use vox_types::{ConvertError, VoiceConverter};

/// Implements `VoiceConverter` on top of a `ToneColorModel`.
///
/// The model is loaded on first use and reused by every later call until
/// [`ToneColorAdapter::shutdown`]. Inference calls are serialized.
pub struct ToneColorAdapter {
    loader: Arc<dyn ModelLoader>,
    device: Device,
    model: RwLock<Option<Arc<dyn ToneColorModel>>>,
    inference: Mutex<()>,
}

impl ToneColorAdapter {
    pub fn new(loader: Arc<dyn ModelLoader>, device: Device) -> Self {
        Self {
            loader,
            device,
            model: RwLock::new(None),
            inference: Mutex::new(()),
        }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub async fn is_loaded(&self) -> bool {
        self.model.read().await.is_some()
    }

    async fn model(&self) -> Result<Arc<dyn ToneColorModel>, ConvertError> {
        if let Some(m) = self.model.read().await.as_ref() {
            return Ok(Arc::clone(m));
        }
        let mut guard = self.model.write().await;
        if let Some(m) = guard.as_ref() {
            return Ok(Arc::clone(m));
        }
        tracing::info!(device = %self.device, "loading tone color converter");
        let model = self.loader.load(self.device).await?;
        *guard = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Drop the shared model. A later call loads it again.
    pub async fn shutdown(&self) -> Result<(), ConvertError> {
        let _busy = self.inference.lock().await;
        let taken = self.model.write().await.take();
        if let Some(model) = taken {
            tracing::info!("unloading tone color converter");
            model.unload().await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl VoiceConverter for ToneColorAdapter {
    async fn process_audio(
        &self,
        input: &Path,
        target: &Path,
        output: &Path,
    ) -> Result<(), ConvertError> {
        let model = self.model().await?;
        let _busy = self.inference.lock().await;

        tracing::info!(input = %input.display(), "extracting source tone color embedding");
        let source_se = model.extract_embedding(input, true).await?;
        tracing::info!(target = %target.display(), "extracting reference speaker embedding");
        let target_se = model.extract_embedding(target, true).await?;

        tracing::info!(output = %output.display(), "converting tone color");
        model.convert(input, &source_se, &target_se, output).await?;
        tracing::info!("audio processing completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockModelLoader;

    #[tokio::test]
    async fn model_loaded_once_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let target = dir.path().join("target.wav");
        tokio::fs::write(&input, b"content").await.unwrap();
        tokio::fs::write(&target, b"voice").await.unwrap();

        let loader = Arc::new(MockModelLoader::new());
        let adapter = ToneColorAdapter::new(loader.clone(), Device::Cpu);
        assert!(!adapter.is_loaded().await);

        for i in 0..3 {
            let out = dir.path().join(format!("out{}.wav", i));
            adapter.process_audio(&input, &target, &out).await.unwrap();
            assert_eq!(tokio::fs::read(&out).await.unwrap(), b"content");
        }
        assert_eq!(loader.load_count(), 1);
        assert!(adapter.is_loaded().await);
    }

    #[tokio::test]
    async fn shutdown_unloads_and_next_call_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        tokio::fs::write(&input, b"content").await.unwrap();

        let loader = Arc::new(MockModelLoader::new());
        let adapter = ToneColorAdapter::new(loader.clone(), Device::Cpu);
        adapter
            .process_audio(&input, &input, &dir.path().join("a.wav"))
            .await
            .unwrap();
        adapter.shutdown().await.unwrap();
        assert!(!adapter.is_loaded().await);
        adapter
            .process_audio(&input, &input, &dir.path().join("b.wav"))
            .await
            .unwrap();
        assert_eq!(loader.load_count(), 2);
    }

    #[tokio::test]
    async fn load_failure_surfaces_and_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        tokio::fs::write(&input, b"content").await.unwrap();

        let loader = Arc::new(MockModelLoader::failing_loads(1));
        let adapter = ToneColorAdapter::new(loader.clone(), Device::Cpu);
        let err = adapter
            .process_audio(&input, &input, &dir.path().join("a.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Checkpoint(_)));
        adapter
            .process_audio(&input, &input, &dir.path().join("b.wav"))
            .await
            .unwrap();
        assert_eq!(loader.load_count(), 2);
    }
}
