//! Source configuration.

use crate::error::{SyncError, SyncResult};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use weatherlink_types::NodePath;

/// Configuration of the polled JSON source, as read from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// URL of the JSON document.
    pub url: String,
    /// API key appended to the URL as the `APPID` query parameter.
    pub app_id: Option<String>,
    /// JSON pointer to the object whose members are published (`""` = root).
    pub fields_pointer: String,
    /// Parent path of the published field nodes.
    pub node_root: String,
    /// Node receiving the raw response body.
    pub raw_node_path: String,
    /// Delay between connecting and the first pass (in seconds).
    pub initial_delay_secs: u64,
    /// How often to poll while connected (in seconds).
    pub poll_interval_secs: u64,
    /// Request timeout (in seconds). No timeout when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "http://api.openweathermap.org/data/2.5/weather?q=London,uk".to_string(),
            app_id: None,
            fields_pointer: "/main".to_string(),
            node_root: "/".to_string(),
            raw_node_path: "/OpenWeatherData".to_string(),
            initial_delay_secs: 1,
            poll_interval_secs: 60,
            request_timeout_secs: None,
        }
    }
}

/// Validated source settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    /// Full request URL, API key included.
    pub url: String,
    pub fields_pointer: String,
    pub node_root: NodePath,
    pub raw_node_path: NodePath,
    pub initial_delay: Duration,
    pub poll_interval: Duration,
    pub request_timeout: Option<Duration>,
}

impl SourceConfig {
    /// Validates the configuration.
    pub fn settings(&self) -> SyncResult<SourceSettings> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| SyncError::Config(format!("invalid url {:?}: {e}", self.url)))?;
        if let Some(app_id) = self.app_id.as_deref().filter(|id| !id.is_empty()) {
            url.query_pairs_mut().append_pair("APPID", app_id);
        }

        if !self.fields_pointer.is_empty() && !self.fields_pointer.starts_with('/') {
            return Err(SyncError::Config(format!(
                "fields_pointer must be empty or start with '/': {:?}",
                self.fields_pointer
            )));
        }

        if self.poll_interval_secs == 0 {
            return Err(SyncError::Config(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }

        Ok(SourceSettings {
            url: url.to_string(),
            fields_pointer: self.fields_pointer.clone(),
            node_root: NodePath::parse(&self.node_root)?,
            raw_node_path: NodePath::parse(&self.raw_node_path)?,
            initial_delay: Duration::from_secs(self.initial_delay_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        })
    }
}
