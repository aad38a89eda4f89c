// Unit Tests for Client Configuration
//
// UNIT UNDER TEST: ClientConfig
//
// BUSINESS RESPONSIBILITY:
//   - Provides working defaults for the local recipe service
//   - Rejects settings the client cannot operate with
//   - Loads overrides from the environment in one place
//
// TEST COVERAGE:
//   - Default values
//   - Validation failures with actionable messages
//   - Environment overrides and parse errors

use crate::config::{ClientConfig, ConfigError, DEFAULT_BASE_URL};
use crate::navigation::{AUTH_PATHS, LOGIN_PATH};
use crate::retry::RetryPolicy;

use std::time::Duration;

const ENV_VARS: [&str; 4] = [
    "RECIPE_API_BASE_URL",
    "RECIPE_API_TIMEOUT_SECS",
    "RECIPE_API_MAX_RETRIES",
    "RECIPE_API_RETRY_DELAY_MS",
];

fn clear_env() {
    for name in ENV_VARS {
        std::env::remove_var(name);
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_defaults_target_local_service() {
        // Arrange & Act
        let config = ClientConfig::default();

        // Assert
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.login_path, LOGIN_PATH);
        assert_eq!(config.auth_paths.len(), AUTH_PATHS.len());
        assert_eq!(config.retry_policy, RetryPolicy::default());
        assert!(config.user_agent.starts_with("recipe-client/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        // Arrange
        let config = ClientConfig::new("ftp://recipes.local");

        // Act
        let result = config.validate();

        // Assert
        match result {
            Err(ConfigError::Invalid { message }) => {
                assert!(message.contains("http://"), "got {message}")
            }
            other => panic!("Expected invalid configuration, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_empty_base_url_and_bad_policies() {
        // Arrange
        let empty = ClientConfig::new("  ");
        let zero_timeout = ClientConfig::default().with_retry_policy(RetryPolicy {
            request_timeout: Duration::ZERO,
            ..RetryPolicy::default()
        });
        let shrinking = ClientConfig::default().with_retry_policy(RetryPolicy {
            backoff_multiplier: 0.5,
            ..RetryPolicy::default()
        });
        let negative_jitter = ClientConfig::default().with_retry_policy(RetryPolicy {
            jitter: -0.1,
            ..RetryPolicy::default()
        });

        // Act & Assert
        assert!(empty.validate().is_err());
        assert!(zero_timeout.validate().is_err());
        assert!(shrinking.validate().is_err());
        assert!(negative_jitter.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        // Arrange
        let config = ClientConfig::new("https://recipes.example.com/api");

        // Act
        let json = serde_json::to_string(&config).expect("serializes");
        let parsed: ClientConfig = serde_json::from_str(&json).expect("deserializes");

        // Assert
        assert_eq!(parsed, config);
    }
}

#[cfg(test)]
mod environment_tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_from_env_applies_overrides() {
        // Arrange
        clear_env();
        std::env::set_var("RECIPE_API_BASE_URL", "https://recipes.example.com/api");
        std::env::set_var("RECIPE_API_TIMEOUT_SECS", "5");
        std::env::set_var("RECIPE_API_MAX_RETRIES", "1");
        std::env::set_var("RECIPE_API_RETRY_DELAY_MS", "250");

        // Act
        let config = ClientConfig::from_env();

        // Assert
        let config = config.expect("environment is valid");
        assert_eq!(config.base_url, "https://recipes.example.com/api");
        assert_eq!(config.retry_policy.request_timeout, Duration::from_secs(5));
        assert_eq!(config.retry_policy.max_retries, 1);
        assert_eq!(config.retry_policy.base_delay, Duration::from_millis(250));

        // Cleanup
        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_without_variables_uses_defaults() {
        // Arrange
        clear_env();

        // Act
        let config = ClientConfig::from_env().expect("defaults are valid");

        // Assert
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_rejects_non_numeric_values() {
        // Arrange
        clear_env();
        std::env::set_var("RECIPE_API_MAX_RETRIES", "many");

        // Act
        let result = ClientConfig::from_env();

        // Assert
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        // Cleanup
        clear_env();
    }
}
