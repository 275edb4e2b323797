// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and positive limits.

use thiserror::Error;

use crate::model::ChimeConfig;

/// A configuration error surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML failed to parse or deserialize.
    #[error("config parse error: {message}")]
    Parse { message: String },

    /// A value failed semantic validation.
    #[error("config validation error: {message}")]
    Validation { message: String },
}

/// Valid logging levels accepted for `service.log_level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ChimeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level must be one of {LOG_LEVELS:?}, got `{}`",
                config.service.log_level
            ),
        });
    }

    if config.service.drain_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "service.drain_interval_secs must be positive".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.push.gateway_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "push.gateway_url must not be empty".to_string(),
        });
    } else if !config.push.gateway_url.starts_with("http://")
        && !config.push.gateway_url.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "push.gateway_url must be an http(s) URL, got `{}`",
                config.push.gateway_url
            ),
        });
    }

    if config.push.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "push.timeout_secs must be positive".to_string(),
        });
    }

    if config.outbox.batch_limit <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "outbox.batch_limit must be positive, got {}",
                config.outbox.batch_limit
            ),
        });
    }

    if config.outbox.max_attempts <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "outbox.max_attempts must be positive, got {}",
                config.outbox.max_attempts
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
