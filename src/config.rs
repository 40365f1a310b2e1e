use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid config document: {0}")]
    Parse(String),
    #[error("max_size must be at least 1")]
    ZeroCapacity,
    #[error("min_size {min} exceeds max_size {max}")]
    MinAboveMax { min: usize, max: usize },
    #[error("storage_key must not be empty")]
    EmptyStorageKey,
}

// Key point:
// Serializable
// Comparable
// Explicit defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Hard capacity of the compare set.
    pub max_size: usize,
    /// Smallest set that counts as an active comparison.
    pub min_size: usize,
    /// Key under which the snapshot is persisted, shared by every context.
    pub storage_key: String,
    pub freshness_window_secs: u64,
}

impl CompareConfig {
    pub fn v0() -> Self {
        Self {
            max_size: 3,
            min_size: 2,
            storage_key: "compared_items_list".into(),
            freshness_window_secs: 30 * 60,
        }
    }

    /// Parse a (possibly partial) JSON document over the v0 defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: CompareConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.min_size > self.max_size {
            return Err(ConfigError::MinAboveMax {
                min: self.min_size,
                max: self.max_size,
            });
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(())
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self::v0()
    }
}
