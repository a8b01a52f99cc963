//! Inspector settings.

use std::fs;
use std::path::Path;

use format_adf::SECTOR_SIZE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("bytes_per_row must divide the 512-byte block size, got {0}")]
    BytesPerRow(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Run integrity checks in strict mode.
    pub strict: bool,
    /// Number of visited blocks remembered for `back`.
    pub history_capacity: usize,
    /// Hex dump width.
    pub bytes_per_row: usize,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            strict: false,
            history_capacity: 32,
            bytes_per_row: 16,
        }
    }
}

impl InspectorConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bytes_per_row == 0 || SECTOR_SIZE % self.bytes_per_row != 0 {
            return Err(ConfigError::BytesPerRow(self.bytes_per_row));
        }
        Ok(())
    }
}
