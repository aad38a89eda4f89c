use crate::logging::{log_debug, log_error};
use crate::navigation::{AUTH_PATHS, LOGIN_PATH};
use crate::retry::RetryPolicy;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Errors raised while assembling a client.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting is missing or malformed.
    #[error("Client configuration error: {message}")]
    Invalid {
        /// Description of the configuration problem.
        message: String,
    },

    /// The underlying HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ConfigError {
    /// Create an invalid-configuration error (logs at ERROR level).
    pub fn invalid(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration_error",
            message = %message,
            "Client configuration validation failed"
        );
        Self::Invalid { message }
    }
}

/// Everything needed to talk to the recipe service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root of the REST API; resource paths are appended to it.
    pub base_url: String,
    pub retry_policy: RetryPolicy,
    /// Where an expired session is redirected.
    pub login_path: String,
    /// Screens on which a 401 does not redirect.
    pub auth_paths: Vec<String>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_policy: RetryPolicy::default(),
            login_path: LOGIN_PATH.to_string(),
            auth_paths: AUTH_PATHS.iter().map(|p| p.to_string()).collect(),
            user_agent: concat!("recipe-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if:
    /// - The base URL is empty or not http(s)
    /// - The request timeout is zero
    /// - The backoff multiplier is below 1 or not finite
    /// - The jitter fraction is negative or not finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::invalid("Base URL is required"));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::invalid(format!(
                "Base URL must start with http:// or https://, got {base_url}"
            )));
        }

        let policy = &self.retry_policy;
        if policy.request_timeout.is_zero() {
            return Err(ConfigError::invalid("Request timeout must be greater than zero"));
        }
        if !policy.backoff_multiplier.is_finite() || policy.backoff_multiplier < 1.0 {
            return Err(ConfigError::invalid(format!(
                "Backoff multiplier must be at least 1.0, got {}",
                policy.backoff_multiplier
            )));
        }
        if !policy.jitter.is_finite() || policy.jitter < 0.0 {
            return Err(ConfigError::invalid(format!(
                "Jitter must be a non-negative fraction, got {}",
                policy.jitter
            )));
        }

        Ok(())
    }

    /// Load configuration from environment variables.
    /// This is the ONLY method that should access environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `RECIPE_API_BASE_URL` | `base_url` |
    /// | `RECIPE_API_TIMEOUT_SECS` | `retry_policy.request_timeout` |
    /// | `RECIPE_API_MAX_RETRIES` | `retry_policy.max_retries` |
    /// | `RECIPE_API_RETRY_DELAY_MS` | `retry_policy.base_delay` |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not parse
    /// or the resulting configuration fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("RECIPE_API_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(seconds) = Self::parse_env::<u64>("RECIPE_API_TIMEOUT_SECS")? {
            config.retry_policy.request_timeout = Duration::from_secs(seconds);
        }
        if let Some(max_retries) = Self::parse_env::<u32>("RECIPE_API_MAX_RETRIES")? {
            config.retry_policy.max_retries = max_retries;
        }
        if let Some(millis) = Self::parse_env::<u64>("RECIPE_API_RETRY_DELAY_MS")? {
            config.retry_policy.base_delay = Duration::from_millis(millis);
        }

        config.validate()?;

        log_debug!(
            base_url = %config.base_url,
            max_retries = config.retry_policy.max_retries,
            request_timeout_secs = config.retry_policy.request_timeout.as_secs(),
            "Client configuration loaded from environment"
        );

        Ok(config)
    }

    fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
        match std::env::var(name) {
            Ok(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::invalid(format!("{name} must be a number, got {raw:?}"))),
            Err(_) => Ok(None),
        }
    }
}
