//! Runtime configuration handed over from JS.
//!
//! ```json
//! { "logLevel": "debug", "advisor": { "apiKey": "..." } }
//! ```

use std::str::FromStr;

use serde::Deserialize;
use tracing::Level;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_LOG_LEVEL: &str = "info";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcadeConfig {
    /// Without it every advisor answers with its fallback line.
    #[serde(default)]
    pub advisor: Option<AdvisorConfig>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            advisor: None,
            log_level: default_log_level(),
        }
    }
}

impl ArcadeConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let mut config: ArcadeConfig = serde_json::from_str(raw)?;
        config.level()?;
        // A blank key is the same as no advisor at all.
        if config
            .advisor
            .as_ref()
            .is_some_and(|a| a.api_key.trim().is_empty())
        {
            config.advisor = None;
        }
        Ok(config)
    }

    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(self.log_level.trim()).map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}
