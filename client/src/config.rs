//! Configuration management for the sync agent.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tether_engine::{KeyConfig, ResourceShape, DEFAULT_ID_KEY, DEFAULT_STATUS_KEY};

/// Agent configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote resource
    pub remote_url: String,
    /// Directory holding the stored local values
    pub store_dir: PathBuf,
    /// Storage key of the local value
    pub store_key: String,
    /// Collection or singleton
    pub shape: ResourceShape,
    /// Identity and status key names
    pub keys: KeyConfig,
    /// Period between syncs; `None` syncs once
    pub sync_interval: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let remote_url = lookup("REMOTE_URL").ok_or(ConfigError::MissingRemoteUrl)?;

        let store_dir = lookup("STORE_DIR")
            .unwrap_or_else(|| ".tether".to_string())
            .into();

        let store_key = lookup("STORE_KEY").unwrap_or_else(|| "resource".to_string());

        let shape = match lookup("RESOURCE_SHAPE") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidShape(value))?,
            None => ResourceShape::default(),
        };

        let keys = KeyConfig::new(
            lookup("ID_KEY").unwrap_or_else(|| DEFAULT_ID_KEY.to_string()),
            lookup("STATUS_KEY").unwrap_or_else(|| DEFAULT_STATUS_KEY.to_string()),
        );

        let sync_interval = lookup("SYNC_INTERVAL_SECS")
            .map(|secs| match secs.parse::<u64>() {
                Ok(n) if n > 0 => Ok(Duration::from_secs(n)),
                _ => Err(ConfigError::InvalidInterval),
            })
            .transpose()?;

        Ok(Self {
            remote_url,
            store_dir,
            store_key,
            shape,
            keys,
            sync_interval,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("REMOTE_URL environment variable is required")]
    MissingRemoteUrl,

    #[error("Invalid RESOURCE_SHAPE value: {0}")]
    InvalidShape(String),

    #[error("Invalid SYNC_INTERVAL_SECS value")]
    InvalidInterval,
}
