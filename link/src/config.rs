//! Link configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use weatherlink_sync::SourceConfig;

/// Top-level configuration, read from a JSON file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Name the link reports itself under.
    pub name: String,
    /// Port of the local HTTP view.
    pub http_port: u16,
    pub source: SourceConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            name: "OpenWeatherDataLink".to_string(),
            http_port: 4080,
            source: SourceConfig::default(),
        }
    }
}

impl LinkConfig {
    /// Loads a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Loads `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
