use std::env;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Endpoints
    pub builder_url: String,
    pub dashboard_url: String,

    // Polling
    pub build_poll_interval_ms: u64,
    pub build_timeout_secs: u64,
    pub dashboard_refresh_ms: u64,
    pub request_timeout_ms: u64,

    // Logging
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            builder_url: "http://localhost:8080".to_string(),
            dashboard_url: "http://localhost:8080".to_string(),

            build_poll_interval_ms: 2_000,
            build_timeout_secs: 30 * 60,
            dashboard_refresh_ms: 5_000,
            request_timeout_ms: 10_000,

            log_level: "info".to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, val: String) -> Result<T, ConfigError> {
    val.parse()
        .map_err(|_| ConfigError::InvalidEnvVar(name.to_string(), val))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(val) = lookup("BUILDER_URL") {
            config.builder_url = val;
        }

        if let Some(val) = lookup("DASHBOARD_URL") {
            config.dashboard_url = val;
        }

        if let Some(val) = lookup("BUILD_POLL_INTERVAL_MS") {
            config.build_poll_interval_ms = parse_var("BUILD_POLL_INTERVAL_MS", val)?;
        }

        if let Some(val) = lookup("BUILD_TIMEOUT_SECS") {
            config.build_timeout_secs = parse_var("BUILD_TIMEOUT_SECS", val)?;
        }

        if let Some(val) = lookup("DASHBOARD_REFRESH_MS") {
            config.dashboard_refresh_ms = parse_var("DASHBOARD_REFRESH_MS", val)?;
        }

        if let Some(val) = lookup("REQUEST_TIMEOUT_MS") {
            config.request_timeout_ms = parse_var("REQUEST_TIMEOUT_MS", val)?;
        }

        if let Some(val) = lookup("LOG_LEVEL") {
            config.log_level = val;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.builder_url.starts_with("http") {
            return Err(ConfigError::ValidationError("BUILDER_URL must be a valid HTTP URL".to_string()));
        }

        if !self.dashboard_url.starts_with("http") {
            return Err(ConfigError::ValidationError("DASHBOARD_URL must be a valid HTTP URL".to_string()));
        }

        if self.build_poll_interval_ms == 0 || self.dashboard_refresh_ms == 0 {
            return Err(ConfigError::ValidationError("Polling intervals must be greater than 0".to_string()));
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError("REQUEST_TIMEOUT_MS must be greater than 0".to_string()));
        }

        if self.get_build_timeout() <= self.get_build_poll_interval() {
            return Err(ConfigError::ValidationError(
                "BUILD_TIMEOUT_SECS must exceed BUILD_POLL_INTERVAL_MS".to_string(),
            ));
        }

        Ok(())
    }

    pub fn get_build_poll_interval(&self) -> Duration {
        Duration::from_millis(self.build_poll_interval_ms)
    }

    pub fn get_build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn get_dashboard_refresh(&self) -> Duration {
        Duration::from_millis(self.dashboard_refresh_ms)
    }

    pub fn get_request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
