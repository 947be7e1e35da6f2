//! Configuration validation.
//!
//! Range checks applied after environment loading.

use super::Config;
use crate::error::ConfigError;

/// Minimum allowed timeout in milliseconds (1 second).
pub const MIN_TIMEOUT_MS: u64 = 1000;

/// Maximum allowed timeout in milliseconds (10 minutes).
pub const MAX_TIMEOUT_MS: u64 = 600_000;

/// Maximum allowed transport retry count.
pub const MAX_RETRIES: u32 = 10;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if any value is out of range:
/// - `OPENAI_API_KEY` must not be blank
/// - `OPENAI_BASE_URL` must be an http(s) URL
/// - `META_ANALYSIS_MODEL` must not be blank
/// - `REQUEST_TIMEOUT_MS` must be between 1000 and 600000
/// - `MAX_RETRIES` must be between 0 and 10
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.api_key.is_blank() {
        return Err(ConfigError::InvalidValue {
            var: "OPENAI_API_KEY".into(),
            reason: "must not be empty".into(),
        });
    }

    if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            var: "OPENAI_BASE_URL".into(),
            reason: format!("must be an http(s) URL, got {}", config.base_url),
        });
    }

    if config.model.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            var: "META_ANALYSIS_MODEL".into(),
            reason: "must not be empty".into(),
        });
    }

    if config.request_timeout_ms < MIN_TIMEOUT_MS || config.request_timeout_ms > MAX_TIMEOUT_MS {
        return Err(ConfigError::InvalidValue {
            var: "REQUEST_TIMEOUT_MS".into(),
            reason: format!("must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS} ms"),
        });
    }

    if config.max_retries > MAX_RETRIES {
        return Err(ConfigError::InvalidValue {
            var: "MAX_RETRIES".into(),
            reason: format!("must be between 0 and {MAX_RETRIES}"),
        });
    }

    Ok(())
}
