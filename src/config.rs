use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;
use crate::scoring::holding::WithdrawMatching;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub transport: TransportConfig,
    pub scoring: ScoringConfig,
    pub service: ServiceConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TransportConfig {
    pub input_endpoint: String,
    pub success_endpoint: String,
    pub failure_endpoint: String,
    pub consumer_group: String,
    pub poll_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ScoringConfig {
    pub withdraw_matching: WithdrawMatching,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub stats_interval_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            input_endpoint: "tcp://127.0.0.1:5557".into(),
            success_endpoint: "tcp://127.0.0.1:5558".into(),
            failure_endpoint: "tcp://127.0.0.1:5559".into(),
            consumer_group: "dexscore".into(),
            poll_timeout_ms: 1000,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            stats_interval_secs: 30,
        }
    }
}

impl Config {
    /// Load config from a TOML file. Falls back to defaults if the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!("Config loaded from {}", path.display());
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply `DEXSCORE_*` environment overrides on top of the file values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let t = &mut self.transport;
        for (key, slot) in [
            ("DEXSCORE_INPUT_ENDPOINT", &mut t.input_endpoint),
            ("DEXSCORE_SUCCESS_ENDPOINT", &mut t.success_endpoint),
            ("DEXSCORE_FAILURE_ENDPOINT", &mut t.failure_endpoint),
            ("DEXSCORE_CONSUMER_GROUP", &mut t.consumer_group),
        ] {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }
        self
    }
}
