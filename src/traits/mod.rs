//! Trait definitions for mockable dependencies.
//!
//! This module defines traits for:
//! - [`GenerationBackend`]: the LLM call, treated as a black box returning text
//! - [`TimeProvider`]: clock abstraction so rendered reports are reproducible
//!
//! # Mocking
//!
//! Both traits are annotated with `#[cfg_attr(test, mockall::automock)]`
//! which generates mock implementations automatically for unit tests.

mod types;

pub use types::{CompletionConfig, CompletionResponse, Message, Usage};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::BackendError;

/// Generation backend trait.
///
/// Implementations own transport concerns (timeouts, connection retries).
/// Callers must assume the returned text may be malformed or hallucinated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send an ordered message list and return the completion text.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the call fails after transport retries.
    async fn complete(
        &self,
        messages: Vec<Message>,
        config: CompletionConfig,
    ) -> Result<CompletionResponse, BackendError>;
}

#[async_trait]
impl<T: GenerationBackend + ?Sized> GenerationBackend for Arc<T> {
    async fn complete(
        &self,
        messages: Vec<Message>,
        config: CompletionConfig,
    ) -> Result<CompletionResponse, BackendError> {
        self.as_ref().complete(messages, config).await
    }
}

/// Time provider trait for deterministic testing.
#[cfg_attr(test, mockall::automock)]
pub trait TimeProvider: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Real time provider using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time provider pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeProvider(pub DateTime<Utc>);

impl TimeProvider for FixedTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
