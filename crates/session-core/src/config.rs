//! Configuration for the session orchestrator and its presentation
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration. [`SessionConfig::load`] layers an optional TOML file under
//! `CALLKEEPER__*` environment variables, for example
//! `CALLKEEPER__ORCHESTRATOR__TICK_INTERVAL_MS=500`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SessionError};
use crate::presentation::NotificationConfig;

/// Prefix of environment variables read by [`SessionConfig::load`]
pub const ENV_PREFIX: &str = "CALLKEEPER";

/// Timing of the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Period of the duration timer while connected
    pub tick_interval_ms: u64,
    /// Upper bound for a single presentation refresh or release
    pub refresh_timeout_ms: u64,
    /// How long shutdown waits for session tasks before aborting them
    pub shutdown_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            refresh_timeout_ms: 2000,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Reject zero durations
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(SessionError::config("tick_interval_ms must be greater than zero"));
        }
        if self.refresh_timeout_ms == 0 {
            return Err(SessionError::config("refresh_timeout_ms must be greater than zero"));
        }
        if self.shutdown_timeout_ms == 0 {
            return Err(SessionError::config("shutdown_timeout_ms must be greater than zero"));
        }
        Ok(())
    }
}

/// Logging knobs, turned into a `LoggingConfig` by the binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
    pub file_info: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
        }
    }
}

/// Complete configuration of a call session host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub orchestrator: OrchestratorConfig,
    pub notification: NotificationConfig,
    pub logging: LogSettings,
}

impl SessionConfig {
    /// Load from an optional TOML file, overridden by `CALLKEEPER__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let loaded: SessionConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| SessionError::config(format!("failed to load configuration: {}", e)))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let parsed: SessionConfig = toml::from_str(source)
            .map_err(|e| SessionError::config(format!("invalid TOML configuration: {}", e)))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        self.orchestrator.validate()?;
        if self.notification.channel_name.trim().is_empty() {
            return Err(SessionError::config("notification.channel_name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.orchestrator.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = SessionConfig::from_toml_str(
            r#"
            [orchestrator]
            tick_interval_ms = 250

            [notification]
            show_speaker = false

            [notification.labels]
            hang_up = "End"
            "#,
        )
        .unwrap();

        assert_eq!(config.orchestrator.tick_interval_ms, 250);
        assert_eq!(config.orchestrator.shutdown_timeout_ms, 5000);
        assert!(!config.notification.show_speaker);
        assert!(config.notification.show_mute);
        assert_eq!(config.notification.labels.hang_up, "End");
        assert_eq!(config.notification.labels.answer, "Answer");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = SessionConfig::from_toml_str("[orchestrator]\ntick_interval_ms = 0").unwrap_err();
        assert!(err.is_configuration_error());

        let err = OrchestratorConfig::default()
            .with_shutdown_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("shutdown_timeout_ms"));
    }
}
