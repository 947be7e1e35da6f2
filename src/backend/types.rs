//! Chat completions request and response types.

#![allow(clippy::derive_partial_eq_without_eq)]

use serde::{Deserialize, Serialize};

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    /// Model identifier (e.g., "gpt-4o-mini").
    pub model: String,
    /// Conversation messages, system instruction first.
    pub messages: Vec<ApiMessage>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a request with required fields.
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<ApiMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Total content bytes across all messages.
    #[must_use]
    pub fn content_len(&self) -> usize {
        self.messages.iter().map(|m| m.content.len()).sum()
    }
}

/// A message on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiMessage {
    /// Role: "system", "user" or "assistant".
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ApiMessage {
    /// Create a message with an explicit role.
    #[must_use]
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Response body from `POST /chat/completions`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Completion choices; only the first is used.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<ApiUsage>,
    /// Model that served the request.
    #[serde(default)]
    pub model: Option<String>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Generated message.
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    /// Why generation stopped ("stop", "length", ...).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Generated message content.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    /// Text content; null for refusals or tool calls.
    #[serde(default)]
    pub content: Option<String>,
    /// Refusal text, when the model declined.
    #[serde(default)]
    pub refusal: Option<String>,
}

/// Token usage in a chat response.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
pub struct ApiUsage {
    /// Prompt tokens consumed.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Completion tokens generated.
    #[serde(default)]
    pub completion_tokens: u32,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error details.
    pub error: ApiErrorDetails,
}

/// Error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetails {
    /// Human readable message.
    pub message: String,
    /// Error type, when provided.
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}
