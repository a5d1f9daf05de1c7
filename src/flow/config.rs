//! Search Flow Configuration
//!
//! Token key, query parameter name and navigation behaviour.

use std::fs;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::errors::{FlowError, FlowResult};
use super::token::TokenCodec;

/// Search flow configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Key used to sign search tokens (default: "fflowkey")
    #[serde(default = "default_token_key")]
    pub token_key: String,

    /// Query parameter carrying the token (default: "searchData")
    #[serde(default = "default_param_key")]
    pub param_key: String,

    /// Submit directly instead of requesting a navigation (default: false)
    #[serde(default)]
    pub no_navigation: bool,

    /// Do not start a search when the page opens without criteria
    /// (default: true)
    #[serde(default = "default_ignore_init")]
    pub ignore_init: bool,

    /// Token lifetime in seconds; tokens never expire when unset
    #[serde(default)]
    pub token_ttl_secs: Option<i64>,
}

fn default_token_key() -> String {
    "fflowkey".to_string()
}

fn default_param_key() -> String {
    "searchData".to_string()
}

fn default_ignore_init() -> bool {
    true
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            token_key: default_token_key(),
            param_key: default_param_key(),
            no_navigation: false,
            ignore_init: default_ignore_init(),
            token_ttl_secs: None,
        }
    }
}

impl FlowConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> FlowResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| FlowError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| FlowError::ConfigParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.token_ttl()?;
        Ok(config)
    }

    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Token lifetime, rejecting values chrono cannot represent
    pub fn token_ttl(&self) -> FlowResult<Option<Duration>> {
        self.token_ttl_secs
            .map(|secs| {
                Duration::try_seconds(secs).ok_or_else(|| {
                    FlowError::ConfigInvalid(format!("token_ttl_secs {} is out of range", secs))
                })
            })
            .transpose()
    }

    /// Token codec for this configuration
    pub fn codec(&self) -> FlowResult<TokenCodec> {
        Ok(match self.token_ttl()? {
            Some(ttl) => TokenCodec::with_ttl(&self.token_key, ttl),
            None => TokenCodec::new(&self.token_key),
        })
    }
}
