//! The immutable source configuration consumed by the monitor.

use super::file::FileConfig;
use anyhow::anyhow;

/// Shared-memory object published by the capture service.
pub const DEFAULT_SHM_NAME: &str = "/ash_memory";
pub const DEFAULT_DEVICE: &str = "default";
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;
pub const DEFAULT_MEMORY_STRIDE: usize = 50;
/// Device downsampling is not configurable.
pub const DEVICE_STRIDE: usize = 50;

/// Which sample backend feeds the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Snapshots of a shared-memory region written by another process
    Memory,
    /// Live capture device
    Device,
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct SourceOverrides {
    pub memory: bool,
    pub memory_stride: Option<usize>,
    pub device: Option<String>,
    pub sample_rate: Option<u32>,
}

/// Source selection and parameters, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub backend: Backend,
    pub device: String,
    pub sample_rate: u32,
    pub memory_stride: usize,
    pub device_stride: usize,
    pub shm_name: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Device,
            device: DEFAULT_DEVICE.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            memory_stride: DEFAULT_MEMORY_STRIDE,
            device_stride: DEVICE_STRIDE,
            shm_name: DEFAULT_SHM_NAME.to_string(),
        }
    }
}

impl SourceConfig {
    /// Merges command-line values over the config file over built-in defaults.
    ///
    /// # Errors
    /// - If the resulting memory stride is zero
    /// - If the resulting sample rate is zero
    pub fn resolve(file: &FileConfig, cli: SourceOverrides) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let section = &file.source;

        let config = Self {
            backend: if cli.memory {
                Backend::Memory
            } else {
                Backend::Device
            },
            device: cli
                .device
                .or_else(|| section.device.clone())
                .unwrap_or(defaults.device),
            sample_rate: cli
                .sample_rate
                .or(section.sample_rate)
                .unwrap_or(defaults.sample_rate),
            memory_stride: cli
                .memory_stride
                .or(section.memory_stride)
                .unwrap_or(defaults.memory_stride),
            device_stride: DEVICE_STRIDE,
            shm_name: section.shm_name.clone().unwrap_or(defaults.shm_name),
        };

        if config.memory_stride == 0 {
            return Err(anyhow!("memory stride must be at least 1"));
        }
        if config.sample_rate == 0 {
            return Err(anyhow!("sample rate must be greater than 0 Hz"));
        }

        Ok(config)
    }

    /// Downsample stride of the selected backend.
    pub fn stride(&self) -> usize {
        match self.backend {
            Backend::Memory => self.memory_stride,
            Backend::Device => self.device_stride,
        }
    }

    /// One-line source description for the monitor header.
    pub fn describe(&self) -> String {
        match self.backend {
            Backend::Memory => "source=memory".to_string(),
            Backend::Device => format!("source={}, rate={}", self.device, self.sample_rate),
        }
    }
}
