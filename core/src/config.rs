//! Configuration loading and validation for the Rigel supervisor
//!
//! This module parses a TOML configuration into `schema::SupervisorConfig`
//! (serde defaults fill any omitted field) and performs strict validation
//! with field-path error messages.

use crate::{CoreError, Result};
use schema::SupervisorConfig;
use std::fs;
use std::path::Path;

/// Load the supervisor configuration from a TOML file path
pub fn load_config_from_toml_path(path: impl AsRef<Path>) -> Result<SupervisorConfig> {
    let data = fs::read_to_string(&path).map_err(|e| {
        CoreError::ConfigurationError(format!("Failed to read config {:?}: {}", path.as_ref(), e))
    })?;
    load_config_from_toml_str(&data)
}

/// Load the supervisor configuration from a TOML string
pub fn load_config_from_toml_str(input: &str) -> Result<SupervisorConfig> {
    let config: SupervisorConfig = toml::from_str(input)
        .map_err(|e| CoreError::ConfigurationError(format!("TOML parse error: {}", e)))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values
pub fn validate_config(config: &SupervisorConfig) -> Result<()> {
    if config.graceful_timeout_secs == 0 {
        return Err(CoreError::ValidationError(
            "gracefulTimeoutSecs: must be greater than 0".to_string(),
        ));
    }

    if config.kill_timeout_secs == 0 {
        return Err(CoreError::ValidationError(
            "killTimeoutSecs: must be greater than 0".to_string(),
        ));
    }

    if config.poll_interval_ms == 0 {
        return Err(CoreError::ValidationError(
            "pollIntervalMs: must be greater than 0".to_string(),
        ));
    }

    if config.event_capacity == 0 {
        return Err(CoreError::ValidationError(
            "eventCapacity: must be greater than 0".to_string(),
        ));
    }

    if config.shutdown_timeout_secs == 0 {
        return Err(CoreError::ValidationError(
            "shutdownTimeoutSecs: must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = load_config_from_toml_str("").unwrap();
        assert_eq!(config, SupervisorConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = load_config_from_toml_str(
            r#"
gracefulTimeoutSecs = 10
pollIntervalMs = 250
"#,
        )
        .unwrap();
        assert_eq!(config.graceful_timeout_secs, 10);
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.kill_timeout_secs, 5);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = load_config_from_toml_str("pollIntervalMs = 0");
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_zero_graceful_timeout_rejected() {
        let result = load_config_from_toml_str("gracefulTimeoutSecs = 0");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("gracefulTimeoutSecs"));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = load_config_from_toml_str("gracefulTimeoutSecs = \"soon\"");
        assert!(matches!(result, Err(CoreError::ConfigurationError(_))));
    }

    #[test]
    fn test_missing_file_rejected() {
        let result = load_config_from_toml_path("/nonexistent/rigel.toml");
        assert!(matches!(result, Err(CoreError::ConfigurationError(_))));
    }
}
