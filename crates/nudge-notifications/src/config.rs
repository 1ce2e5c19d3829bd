use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::trigger::{DEFAULT_MIN_INTERVAL_SECS, MAX_INTERVAL_SECS, TriggerMapper};
use crate::types::{NotificationPolicy, TextLimits};

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Policy applied to requests built by the notifier itself
    #[serde(default)]
    pub policy: NotificationPolicy,
    #[serde(default)]
    pub limits: TextLimits,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.title_max_chars == 0 || self.limits.body_max_chars == 0 {
            return Err(ConfigError::validation("limits must be > 0"));
        }
        if self.policy.max_pending_count == Some(0) {
            return Err(ConfigError::validation(
                "policy.max_pending_count must be > 0 when set",
            ));
        }
        let floor = self.trigger.min_interval_secs;
        if !(floor > 0.0 && floor <= MAX_INTERVAL_SECS) {
            return Err(ConfigError::validation(
                "trigger.min_interval_secs must be a positive number",
            ));
        }
        self.trigger.utc_offset()?;

        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::validation(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        Ok(())
    }

    pub fn trigger_mapper(&self) -> Result<TriggerMapper, ConfigError> {
        let mapper = TriggerMapper::new().with_min_interval(self.trigger.min_interval_secs);
        Ok(match self.trigger.utc_offset()? {
            Some(offset) => mapper.with_utc_offset(offset),
            None => mapper,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: f64,
    /// Fixed wall-clock offset for exact-date triggers
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

fn default_min_interval_secs() -> f64 {
    DEFAULT_MIN_INTERVAL_SECS
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval_secs(),
            utc_offset_minutes: None,
        }
    }
}

impl TriggerConfig {
    pub fn utc_offset(&self) -> Result<Option<UtcOffset>, ConfigError> {
        self.utc_offset_minutes
            .map(|minutes| {
                UtcOffset::from_whole_seconds(minutes.saturating_mul(60)).map_err(|_| {
                    ConfigError::validation("trigger.utc_offset_minutes is out of range")
                })
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::{AppConfig, ConfigError};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "nudge.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., NUDGE__LIMITS__TITLE_MAX_CHARS=40
        builder = builder.add_source(
            Environment::with_prefix("NUDGE")
                .try_parsing(true)
                .separator("__"),
        );
        let merged: AppConfig = builder.build()?.try_deserialize()?;
        merged.validate()?;
        tracing::debug!(level = %merged.logging.level, "Configuration loaded");
        Ok(merged)
    }
}
