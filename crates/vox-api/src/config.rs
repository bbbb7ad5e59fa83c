//! Service configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use vox_convert::Device;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid VOX_LISTEN address {value:?}: {message}")]
    Listen { value: String, message: String },
}

/// Runtime settings for the `vox-api` binary.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen: SocketAddr,
    /// Root holding downloaded, processed and output audio.
    pub data_dir: PathBuf,
    /// Holds `converter/config.json` and `converter/checkpoint.pth`.
    pub checkpoint_dir: PathBuf,
    /// Conversion runtime command line, e.g. `python3 -m openvoice_cli`.
    pub converter_command: String,
    pub ffmpeg_bin: String,
    pub device: Device,
    pub max_concurrent_jobs: usize,
}

const DEFAULT_LISTEN: &str = "0.0.0.0:8000";

impl ServiceConfig {
    /// Read `VOX_*` variables; unset values use defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen_raw = get("VOX_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen = listen_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Listen {
                value: listen_raw.clone(),
                message: e.to_string(),
            })?;

        let device = match get("VOX_DEVICE") {
            Some(raw) => Device::parse(&raw).unwrap_or_else(|| {
                let detected = Device::detect();
                tracing::warn!(value = %raw, fallback = %detected, "invalid VOX_DEVICE");
                detected
            }),
            None => Device::detect(),
        };

        let max_concurrent_jobs = match get("VOX_MAX_CONCURRENT_JOBS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(value = %raw, "invalid VOX_MAX_CONCURRENT_JOBS, using 1");
                    1
                }
            },
            None => 1,
        };

        Ok(Self {
            listen,
            data_dir: get("VOX_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            checkpoint_dir: get("VOX_CHECKPOINT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("checkpoints")),
            converter_command: get("VOX_CONVERTER_BIN")
                .unwrap_or_else(|| "openvoice-cli".to_string()),
            ffmpeg_bin: get("VOX_FFMPEG_BIN").unwrap_or_else(|| "ffmpeg".to_string()),
            device,
            max_concurrent_jobs,
        })
    }
}
