//! Generation backend adapter.
//!
//! This module provides the production [`GenerationBackend`] implementation:
//! - OpenAI-compatible chat completions over `reqwest`
//! - Transport retries with exponential backoff
//! - Request size validation
//!
//! The cluster engine never sees HTTP; it only depends on the trait.
//!
//! [`GenerationBackend`]: crate::traits::GenerationBackend

mod client;
mod config;
mod types;

pub use client::{OpenAiClient, MAX_MESSAGES, MAX_REQUEST_BYTES};
pub use config::{ClientConfig, DEFAULT_RETRY_DELAY_MS};
pub use types::{
    ApiErrorBody, ApiErrorDetails, ApiMessage, ApiUsage, ChatRequest, ChatResponse, Choice,
    ChoiceMessage,
};
