//! Engine configuration
//!
//! Default parameters for the ranking and clustering engines, loadable from
//! YAML or JSON. Missing sections and fields fall back to their defaults.
//!
//! ```yaml
//! ranking:
//!   alpha: 0.15
//!   tolerance: 1.0e-6
//!   max_iterations: 100
//!   dangling: uniform
//! markov:
//!   steps: 10
//!   cumulative: true
//! clustering:
//!   target:
//!     mode: components
//!     value: 2
//! ```

use crate::algo::{ClusterTarget, MarkovConfig, RankingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub target: ClusterTarget,
}

/// Configuration for every engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ranking: RankingConfig,
    pub markov: MarkovConfig,
    pub clustering: ClusteringConfig,
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let text = std::fs::read_to_string(path)?;
        let config = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&text)?,
            "json" => Self::from_json_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };
        debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.ranking
            .validate()
            .and_then(|_| self.markov.validate())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        match self.clustering.target {
            ClusterTarget::Components(0) => Err(ConfigError::Invalid(
                "clustering target must be at least one component".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
