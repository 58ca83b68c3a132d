//! Configuration file loading for levelscope.
//!
//! The file lives at `~/.config/levelscope/levelscope.toml`. It is optional: when it is
//! missing every setting falls back to its built-in default.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// `[source]` table of the config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSection {
    /// Capture device: "default", an index from `levelscope list-devices`, or a device name
    pub device: Option<String>,
    /// Capture sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Keep every Nth value of each shared-memory snapshot
    pub memory_stride: Option<usize>,
    /// POSIX shared-memory object written by the capture service
    pub shm_name: Option<String>,
}

/// Complete contents of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub source: SourceSection,
}

impl FileConfig {
    /// Loads the config file from the user's config directory.
    ///
    /// Returns the default (empty) configuration when the file does not exist.
    ///
    /// # Errors
    /// - If the home directory cannot be determined
    /// - If the file exists but cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| anyhow!("Failed to read {}: {e}", path.display()))?;
        let config = Self::parse(&content)
            .map_err(|e| anyhow!("Invalid config file {}: {e}", path.display()))?;
        tracing::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parses config file contents.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Path of the config file. The file itself may not exist.
pub fn config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(".config").join("levelscope").join("levelscope.toml"))
}
