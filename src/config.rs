//! Pipeline configuration: resolution policy and metric catalog, stored as JSON.

use crate::data::metrics::MetricCatalog;
use crate::data::resolver::ResolutionPolicy;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings fixed at pipeline construction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub policy: ResolutionPolicy,
    #[serde(default)]
    pub catalog: MetricCatalog,
}

impl PipelineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_json(&fs::read_to_string(path)?)?;
        info!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        info!("Saved pipeline config to {}", path.display());
        Ok(())
    }
}
