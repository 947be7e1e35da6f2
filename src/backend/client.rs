//! Chat completions client with retry logic.
//!
//! This module provides:
//! - HTTP client for an OpenAI-compatible `/chat/completions` endpoint
//! - Retry logic with exponential backoff for transport failures
//! - Request validation
//! - Response parsing

#![allow(clippy::missing_errors_doc)]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;

use super::config::ClientConfig;
use super::types::{ApiErrorBody, ApiMessage, ChatRequest, ChatResponse};
use crate::config::Config;
use crate::error::BackendError;
use crate::traits::{CompletionConfig, CompletionResponse, GenerationBackend, Message, Usage};

/// Maximum number of messages per request.
pub const MAX_MESSAGES: usize = 50;
/// Maximum total content bytes per request (1MB).
pub const MAX_REQUEST_BYTES: usize = 1_000_000;

/// OpenAI-compatible chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: ClientConfig,
}

impl OpenAiClient {
    /// Create a new client.
    pub fn new(api_key: &str, config: ClientConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
            BackendError::InvalidRequest {
                message: "API key contains invalid header characters".to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self { client, config })
    }

    /// Create a client from application configuration.
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Self::new(config.api_key.expose(), ClientConfig::from_app_config(config))
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a chat request with retry logic.
    pub async fn chat(&self, request: ChatRequest) -> Result<CompletionResponse, BackendError> {
        Self::validate_request(&request)?;
        self.execute_with_retry(&request).await
    }

    /// Validate request size limits.
    fn validate_request(request: &ChatRequest) -> Result<(), BackendError> {
        if request.messages.is_empty() {
            return Err(BackendError::InvalidRequest {
                message: "No messages".to_string(),
            });
        }

        if request.messages.len() > MAX_MESSAGES {
            return Err(BackendError::InvalidRequest {
                message: format!(
                    "Too many messages: {} > {MAX_MESSAGES}",
                    request.messages.len()
                ),
            });
        }

        let bytes = request.content_len();
        if bytes > MAX_REQUEST_BYTES {
            return Err(BackendError::InvalidRequest {
                message: format!("Request too large: {bytes} > {MAX_REQUEST_BYTES} bytes"),
            });
        }

        Ok(())
    }

    /// Execute request with retry logic.
    async fn execute_with_retry(
        &self,
        request: &ChatRequest,
    ) -> Result<CompletionResponse, BackendError> {
        let mut last_error = None;
        let mut delay = self.config.retry_delay_ms;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let wait_ms = retry_wait_ms(delay, last_error.as_ref());
                tracing::warn!(attempt, delay_ms = wait_ms, "Retrying chat completion request");
                tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                delay = delay.saturating_mul(2);
            }

            match self.execute_once(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if !e.is_retryable() {
                        return Err(e);
                    }
                    tracing::warn!(error = %e, attempt, "Retryable backend error");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| BackendError::Network {
            message: "Unknown error after retries".to_string(),
        }))
    }

    /// Execute a single request attempt.
    async fn execute_once(&self, request: &ChatRequest) -> Result<CompletionResponse, BackendError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let start = std::time::Instant::now();

        tracing::debug!(
            url = %url,
            model = %request.model,
            messages = request.messages.len(),
            bytes = request.content_len(),
            timeout_ms = self.config.timeout_ms,
            "Starting chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                if e.is_timeout() {
                    tracing::error!(url = %url, elapsed_ms, "Chat completion request timed out");
                    BackendError::Timeout {
                        timeout_ms: self.config.timeout_ms,
                    }
                } else {
                    tracing::error!(url = %url, elapsed_ms, error = %e, "Chat completion request failed");
                    BackendError::Network {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        tracing::debug!(
            status = %status,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Chat completion response received"
        );

        match status.as_u16() {
            401 | 403 => return Err(BackendError::AuthenticationFailed),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                return Err(BackendError::RateLimited {
                    retry_after_seconds: retry_after,
                });
            }
            500 | 502 | 503 | 529 => {
                return Err(BackendError::ModelOverloaded {
                    model: request.model.clone(),
                });
            }
            _ => {}
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map_or(body, |parsed| parsed.error.message);
            return Err(BackendError::UnexpectedResponse {
                message: format!("Status {status}: {message}"),
            });
        }

        let body: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| BackendError::UnexpectedResponse {
                    message: format!("Failed to parse response: {e}"),
                })?;

        Self::parse_response(body)
    }

    /// Pull the first choice's text out of a chat response.
    fn parse_response(response: ChatResponse) -> Result<CompletionResponse, BackendError> {
        let usage = response.usage.unwrap_or_default();
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::UnexpectedResponse {
                message: "No choices in response".to_string(),
            })?;

        let message = choice.message.ok_or_else(|| BackendError::UnexpectedResponse {
            message: "Choice has no message".to_string(),
        })?;

        if let Some(refusal) = message.refusal.filter(|r| !r.trim().is_empty()) {
            return Err(BackendError::UnexpectedResponse {
                message: format!("Model refused: {refusal}"),
            });
        }

        let content = message
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| BackendError::UnexpectedResponse {
                message: "No content in response".to_string(),
            })?;

        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!("Completion stopped at the token limit; JSON may be truncated");
        }

        Ok(CompletionResponse::new(
            content,
            Usage::new(usage.prompt_tokens, usage.completion_tokens),
        ))
    }
}

/// Backoff before the next attempt; a rate limit never waits less than its `retry-after`.
fn retry_wait_ms(delay_ms: u64, last_error: Option<&BackendError>) -> u64 {
    match last_error {
        Some(BackendError::RateLimited {
            retry_after_seconds,
        }) => delay_ms.max(retry_after_seconds.saturating_mul(1000)),
        _ => delay_ms,
    }
}

#[async_trait]
impl GenerationBackend for OpenAiClient {
    async fn complete(
        &self,
        messages: Vec<Message>,
        config: CompletionConfig,
    ) -> Result<CompletionResponse, BackendError> {
        let api_messages = messages
            .into_iter()
            .map(|m| ApiMessage::new(m.role, m.content))
            .collect();

        let mut request = ChatRequest::new(config.model, api_messages);
        if let Some(temperature) = config.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        self.chat(request).await
    }
}
