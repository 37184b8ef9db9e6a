mod batching;
mod cache;
mod deduplication;

use std::{path::Path, str::FromStr};

pub use batching::BatchingConfig;
pub use cache::{CacheConfig, FetchPolicy};
pub use deduplication::DeduplicationConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read the configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("batching.max_size must be at least 1")]
    EmptyBatch,
}

/// Settings of a client engine instance. Every section is optional in TOML.
#[derive(Debug, Default, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Coalescing of network-bound operations
    pub batching: BatchingConfig,
    /// Sharing of in-flight network calls
    pub deduplication: DeduplicationConfig,
    /// Result cache behaviour
    pub cache: CacheConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.batching.max_size == 0 {
            return Err(ConfigError::EmptyBatch);
        }

        Ok(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()
    }
}
