//! Audio downloader: streams remote audio files into the local download area.

mod http;

pub use http::{file_name_for, HttpAudioFetcher};
pub use vox_types::{AudioFetcher, FetchError};
