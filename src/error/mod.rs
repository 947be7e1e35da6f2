//! Error types for the meta-analysis pipeline.
//!
//! This module defines a hierarchical error system:
//! - [`AppError`]: Top-level application errors
//! - [`BackendError`]: Generation backend (chat completions) errors
//! - [`EngineError`]: Cluster validation & repair engine errors
//! - [`InputError`]: Run input loading errors
//! - [`ConfigError`]: Configuration errors
//!
//! All errors implement `Send + Sync` for async compatibility.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level application error.
///
/// This is the main error type returned by the pipeline entry points.
/// It wraps all subsystem errors for unified error handling.
#[derive(Debug, Error)]
pub enum AppError {
    /// Generation backend error.
    #[error("Generation backend error: {0}")]
    Backend(#[from] BackendError),

    /// Cluster engine error.
    #[error("Cluster engine error: {0}")]
    Engine(#[from] EngineError),

    /// Input loading error.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Generation backend errors.
///
/// These errors represent transport-level failures when talking to the
/// chat completions API. Semantic problems with the returned text are
/// reported by [`EngineError`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Authentication failed due to invalid API key.
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// Request was rate limited.
    #[error("Rate limited: retry after {retry_after_seconds}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_seconds: u64,
    },

    /// The requested model is overloaded or the server is unavailable.
    #[error("Model overloaded: {model}")]
    ModelOverloaded {
        /// The model that is overloaded.
        model: String,
    },

    /// Request timed out.
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Invalid request parameters.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of what's invalid.
        message: String,
    },

    /// Network communication error.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Unexpected response from the API.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Description of what was unexpected.
        message: String,
    },
}

impl BackendError {
    /// Returns true if this error is retryable.
    ///
    /// Rate limiting, overload, timeout and network errors are retryable.
    /// Authentication and invalid request errors are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::ModelOverloaded { .. }
                | Self::Timeout { .. }
                | Self::Network { .. }
        )
    }
}

/// Cluster engine errors.
///
/// Validation findings themselves are not errors; they drive the repair
/// loop. Only the conditions below abort a criterion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// No JSON object could be recovered from the model response.
    #[error("JSON parsing failed: {message}")]
    JsonParseFailed {
        /// Description of the parsing error.
        message: String,
    },

    /// Every attempt produced an invalid payload.
    #[error("Meta-analysis JSON validation failed for {criterion} after {attempts} attempts: {}", .errors.join("; "))]
    ValidationFailed {
        /// Criterion being clustered.
        criterion: String,
        /// Number of backend attempts made.
        attempts: u32,
        /// Errors reported for the final attempt.
        errors: Vec<String>,
    },

    /// A payload could not be serialized into the repair prompt.
    #[error("Serialization failed: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },
}

/// Run input errors.
///
/// Any of these is fatal at startup; no partial report is produced.
#[derive(Debug, Error)]
pub enum InputError {
    /// A required input file could not be located.
    #[error("{description} not found: {}", .path.display())]
    MissingFile {
        /// Human readable name of the input.
        description: String,
        /// Path that was expected.
        path: PathBuf,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A JSONL line could not be decoded.
    #[error("Malformed record in {} line {line}: {message}", .path.display())]
    MalformedRecord {
        /// JSONL file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Decoder message.
        message: String,
    },

    /// The criterion catalog could not be decoded.
    #[error("Malformed criterion catalog {}: {message}", .path.display())]
    MalformedCatalog {
        /// Catalog file.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },
}

/// Configuration errors.
///
/// These errors represent failures in configuration loading and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required configuration is missing.
    #[error("Missing required: {var}")]
    MissingRequired {
        /// The missing variable name.
        var: String,
    },

    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },
}
