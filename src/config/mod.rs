//! Configuration management.
//!
//! This module handles:
//! - Environment variable loading (with `.env` support)
//! - Configuration validation
//! - Default value handling
//! - Secure API key storage via [`SecretString`]
//!
//! Configuration is an explicit value handed to the backend and engine
//! constructors; nothing here is process-global.
//!
//! # Example
//!
//! ```
//! use eval_meta_analysis::config::{Config, SecretString, DEFAULT_MODEL};
//!
//! let config = Config {
//!     api_key: SecretString::new("sk-proj-example"),
//!     base_url: "https://api.openai.com/v1".to_string(),
//!     model: DEFAULT_MODEL.to_string(),
//!     log_level: "info".to_string(),
//!     request_timeout_ms: 120_000,
//!     max_retries: 3,
//! };
//!
//! let debug = format!("{config:?}");
//! assert!(debug.contains("<REDACTED>"));
//! assert!(!debug.contains("sk-proj-example"));
//! ```

mod secret;
mod validation;

pub use secret::SecretString;
pub use validation::{validate_config, MAX_RETRIES, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS};

use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// Default chat completions base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default generation model for clustering.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default request timeout in milliseconds.
///
/// Cluster prompts embed every failing output, so responses are slow.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// Default transport retry attempts inside the backend.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Application configuration.
///
/// Use [`Config::from_env`] to load configuration from environment variables.
/// `max_retries` covers transport failures only; the semantic repair budget
/// lives in [`crate::clusters::EngineConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend API key (protected from logging via [`SecretString`]).
    pub api_key: SecretString,
    /// Chat completions base URL.
    pub base_url: String,
    /// Generation model identifier.
    pub model: String,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: String,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum transport retry attempts.
    pub max_retries: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `OPENAI_API_KEY`: backend API key
    ///
    /// Optional environment variables (with defaults):
    /// - `OPENAI_BASE_URL`: API base URL (default: `https://api.openai.com/v1`)
    /// - `META_ANALYSIS_MODEL`: generation model (default: `gpt-4o-mini`)
    /// - `LOG_LEVEL`: logging level (default: `info`)
    /// - `REQUEST_TIMEOUT_MS`: request timeout (default: `120000`)
    /// - `MAX_RETRIES`: transport retries (default: `3`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - `OPENAI_API_KEY` is missing
    /// - a numeric variable does not parse
    /// - any value fails validation (see [`validate_config`])
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| ConfigError::MissingRequired {
            var: "OPENAI_API_KEY".into(),
        })?;

        let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = std::env::var("META_ANALYSIS_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into());
        let request_timeout_ms = parse_env("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
        let max_retries = parse_env("MAX_RETRIES", DEFAULT_MAX_RETRIES)?;

        let config = Self {
            api_key: SecretString::new(api_key),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            log_level,
            request_timeout_ms,
            max_retries,
        };

        validate_config(&config)?;
        Ok(config)
    }

    /// Override the generation model (the CLI `--model` flag).
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Tracing filter for the configured log level, falling back to `info`.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    }
}

/// Parse an environment variable, using a default if not set.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}
