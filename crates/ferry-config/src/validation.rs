// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and positive intervals.

use thiserror::Error;

use crate::model::FerryConfig;

/// A configuration error surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML layer stack failed to parse or deserialize.
    #[error("config parse error: {message}")]
    Parse { message: String },

    /// A deserialized value violates a semantic constraint.
    #[error("config validation error: {message}")]
    Validation { message: String },
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &FerryConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.queue.root_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "queue.root_dir must not be empty".to_string(),
        });
    }

    if config.processor.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "processor.poll_interval_secs must be at least 1".to_string(),
        });
    }

    if config.processor.max_reply_chars == 0 {
        errors.push(ConfigError::Validation {
            message: "processor.max_reply_chars must be positive".to_string(),
        });
    }

    if config.provider.command.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "provider.command must not be empty".to_string(),
        });
    }

    if let Some(timeout) = config.provider.timeout_secs
        && timeout == 0
    {
        errors.push(ConfigError::Validation {
            message: "provider.timeout_secs must be positive when set (omit for unbounded)"
                .to_string(),
        });
    }

    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let host = config.gateway.host.trim();
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.gateway.max_body_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.max_body_bytes must be positive".to_string(),
        });
    }

    if config.channel.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "channel.poll_interval_secs must be at least 1".to_string(),
        });
    }

    if config.channel.pending_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "channel.pending_ttl_secs must be positive".to_string(),
        });
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level `{}` is not one of trace, debug, info, warn, error",
                config.agent.log_level
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Render collected configuration errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("error: {error}");
    }
    eprintln!(
        "ferry: {} configuration error(s); fix ferry.toml or FERRY_* overrides and retry",
        errors.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FerryConfig;

    #[test]
    fn default_config_is_valid() {
        let config = FerryConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_queue_root_is_rejected() {
        let mut config = FerryConfig::default();
        config.queue.root_dir = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("queue.root_dir")));
    }

    #[test]
    fn zero_intervals_are_rejected_and_collected() {
        let mut config = FerryConfig::default();
        config.processor.poll_interval_secs = 0;
        config.channel.poll_interval_secs = 0;
        config.channel.pending_ttl_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3, "all errors collected, not fail-fast");
    }

    #[test]
    fn zero_provider_timeout_is_rejected() {
        let mut config = FerryConfig::default();
        config.provider.timeout_secs = Some(0);
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("timeout_secs")));
    }

    #[test]
    fn unbounded_provider_timeout_is_valid() {
        let mut config = FerryConfig::default();
        config.provider.timeout_secs = None;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut config = FerryConfig::default();
        config.agent.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("log_level")));
    }
}
