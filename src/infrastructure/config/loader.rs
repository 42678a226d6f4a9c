use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid patrol interval: {0}s. Must be positive")]
    InvalidInterval(u64),

    #[error("Invalid scenario probability: {0}. Must be within [0, 1]")]
    InvalidProbability(f64),

    #[error("Invalid rate gate window: {0}s. Must be positive")]
    InvalidWindow(u64),

    #[error("Invalid rate gate ceiling: {0}. Must be at least 1")]
    InvalidCeiling(u32),

    #[error("Invalid {collaborator} timeout: {secs}s. Must be positive")]
    InvalidTimeout { collaborator: &'static str, secs: u64 },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .nightwatch/config.yaml (project config)
    /// 3. .nightwatch/local.yaml (local overrides, optional)
    /// 4. Environment variables (NIGHTWATCH_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same layering as [`ConfigLoader::load`], rooted at `root`.
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Config> {
        let dir = root.as_ref().join(".nightwatch");
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed("NIGHTWATCH_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file. Environment overrides still apply.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("NIGHTWATCH_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.patrol.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval(config.patrol.interval_secs));
        }

        let probability = config.patrol.scenario_probability;
        if !(0.0..=1.0).contains(&probability) {
            return Err(ConfigError::InvalidProbability(probability));
        }

        if config.patrol.metasystem_name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "patrol.metasystem_name cannot be empty".to_string(),
            ));
        }

        if config.rate_gate.window_secs == 0 {
            return Err(ConfigError::InvalidWindow(config.rate_gate.window_secs));
        }

        if config.rate_gate.max_actions == 0 {
            return Err(ConfigError::InvalidCeiling(config.rate_gate.max_actions));
        }

        let timeouts = &config.timeouts;
        for (collaborator, secs) in [
            ("provider", timeouts.provider_secs),
            ("knowledge", timeouts.knowledge_secs),
            ("dispatch", timeouts.dispatch_secs),
            ("health", timeouts.health_secs),
            ("inbox", timeouts.inbox_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::InvalidTimeout { collaborator, secs });
            }
        }

        config
            .roles
            .validate()
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;

        let providers = &config.providers;
        if providers.initial_backoff_ms >= providers.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                providers.initial_backoff_ms,
                providers.max_backoff_ms,
            ));
        }

        if config.fleet.manifest_path.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "fleet.manifest_path cannot be empty".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
