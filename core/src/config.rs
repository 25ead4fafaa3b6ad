//! Client configuration.
//!
//! `ClientConfig` carries the API root and an optional per-request timeout.
//! Values come from code via the `with_*` builders or from the environment:
//!
//! - `SONGS_API_BASE`: API root, default `http://localhost:8000/api`
//! - `SONGS_API_TIMEOUT_SECS`: request timeout in whole seconds, default none

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
pub const API_BASE_ENV: &str = "SONGS_API_BASE";
pub const TIMEOUT_ENV: &str = "SONGS_API_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    InvalidTimeout { name: &'static str, value: String },

    #[error("{name} must not be empty")]
    EmptyApiBase { name: &'static str },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: String,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through `lookup`; unset names keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup(API_BASE_ENV) {
            let base = base.trim();
            if base.is_empty() {
                return Err(ConfigError::EmptyApiBase { name: API_BASE_ENV });
            }
            config.api_base = base.to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidTimeout {
                name: TIMEOUT_ENV,
                value: raw.clone(),
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
