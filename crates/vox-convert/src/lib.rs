//! Adapters over the external voice-conversion runtime and the audio mux tool.

mod adapter;
mod command;
mod device;
mod ffmpeg;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
mod model;

pub use adapter::ToneColorAdapter;
pub use command::{CommandModelLoader, CommandToneColorModel};
pub use device::Device;
pub use ffmpeg::FfmpegMerger;
pub use model::{ModelLoader, SpeakerEmbedding, ToneColorModel};
pub use vox_types::{AudioMerger, ConvertError, MergeError, VoiceConverter};

#[cfg(any(test, feature = "test-util"))]
pub use mock::{CopyMerger, MockModelLoader, MockToneColorModel};
