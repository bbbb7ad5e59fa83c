//! Compute device selection for the conversion runtime.

use std::path::Path;

/// Device the conversion runtime is asked to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cuda(u32),
    Cpu,
}

impl Device {
    /// Probe the host: CUDA when an NVIDIA device node exists or `CUDA_VISIBLE_DEVICES`
    /// names a device, CPU otherwise.
    pub fn detect() -> Self {
        let visible = std::env::var("CUDA_VISIBLE_DEVICES").ok();
        Self::detect_with(visible.as_deref(), Path::new("/dev/nvidia0").exists())
    }

    fn detect_with(cuda_visible: Option<&str>, has_device_node: bool) -> Self {
        match cuda_visible.map(str::trim) {
            // Explicitly hidden GPUs win over the device node.
            Some("") | Some("-1") => Device::Cpu,
            Some(_) => Device::Cuda(0),
            None if has_device_node => Device::Cuda(0),
            None => Device::Cpu,
        }
    }

    /// Parse `cpu`, `cuda` or `cuda:N` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "cpu" => Some(Device::Cpu),
            "cuda" => Some(Device::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|n| n.parse().ok())
                .map(Device::Cuda),
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cuda(n) => write!(f, "cuda:{}", n),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}
