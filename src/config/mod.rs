//! Client configuration
//!
//! The recorder reads a single setting, `voice_broadcast.chunk_length`, from
//! the client configuration file. Every other key in the file is ignored.

use crate::utils::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Target chunk length used when the configuration does not set one (seconds)
pub const DEFAULT_CHUNK_LENGTH_SECS: f64 = 500.0;

/// Top-level client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub voice_broadcast: VoiceBroadcastConfig,
}

/// Voice broadcast section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceBroadcastConfig {
    /// Target chunk length in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_length: Option<f64>,
}

impl VoiceBroadcastConfig {
    /// Configured chunk length, or the default when unset or unusable
    pub fn target_chunk_length(&self) -> f64 {
        self.chunk_length
            .filter(|length| is_valid_chunk_length(*length))
            .unwrap_or(DEFAULT_CHUNK_LENGTH_SECS)
    }
}

impl ClientConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;

        tracing::debug!(
            "Loaded client config from {:?} (chunk length {}s)",
            path,
            config.voice_broadcast.target_chunk_length()
        );

        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject chunk lengths that are not finite and positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.voice_broadcast.chunk_length {
            Some(length) if !is_valid_chunk_length(length) => {
                Err(ConfigError::InvalidChunkLength(length))
            }
            _ => Ok(()),
        }
    }
}

fn is_valid_chunk_length(length: f64) -> bool {
    length.is_finite() && length > 0.0
}
