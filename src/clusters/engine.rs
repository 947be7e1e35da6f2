//! Cluster Validation & Repair Engine.
//!
//! Drives the request/validate/repair loop for one criterion:
//!
//! ```text
//! Request ──► Validate ──► Accept
//!    ▲            │
//!    │            ▼
//!    └──────── Repair        (budget exhausted ──► Failed)
//! ```
//!
//! The loop is an explicit [`EngineState`] machine with an attempt counter,
//! so attempt counts and rejected-attempt history are observable in tests
//! with a mocked [`GenerationBackend`].

use super::json::parse_draft;
use super::types::{ClusterPayload, DraftPayload};
use super::validate::{ExampleCheckPolicy, ValidationIssue, Validator};
use crate::error::EngineError;
use crate::prompts::{cluster_prompt, repair_prompt, PromptContext, SYSTEM_INSTRUCTION};
use crate::traits::{CompletionConfig, GenerationBackend, Message};

/// Default number of backend attempts per criterion (1 initial + 2 repairs).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Engine settings.
#[derive(Debug, Clone, PartialEq)]
// f32 temperature rules out Eq
#[allow(clippy::derive_partial_eq_without_eq)]
pub struct EngineConfig {
    /// Generation model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional completion token cap.
    pub max_tokens: Option<u32>,
    /// Total backend attempts before giving up.
    pub max_attempts: u32,
    /// When per-example label checks apply.
    pub example_checks: ExampleCheckPolicy,
}

impl EngineConfig {
    /// Defaults for `model`: temperature 0, three attempts.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            example_checks: ExampleCheckPolicy::default(),
        }
    }

    /// Set the attempt budget (at least one attempt is always made).
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the completion token cap.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the example check policy.
    #[must_use]
    pub const fn with_example_checks(mut self, policy: ExampleCheckPolicy) -> Self {
        self.example_checks = policy;
        self
    }

    fn completion_config(&self) -> CompletionConfig {
        let config = CompletionConfig::new(self.model.clone()).with_temperature(self.temperature);
        match self.max_tokens {
            Some(max_tokens) => config.with_max_tokens(max_tokens),
            None => config,
        }
    }
}

/// Loop state.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineState {
    /// Call the backend with this prompt.
    Request {
        /// Prompt for the user message.
        prompt: String,
    },
    /// Check a normalized draft.
    Validate {
        /// Draft under validation.
        draft: DraftPayload,
    },
    /// Build a repair prompt from a rejected draft.
    Repair {
        /// Rejected draft.
        draft: DraftPayload,
        /// Why it was rejected.
        issues: Vec<ValidationIssue>,
    },
    /// Terminal: payload accepted.
    Accept(ClusterPayload),
    /// Terminal: attempt budget exhausted.
    Failed {
        /// Issues from the final attempt.
        issues: Vec<ValidationIssue>,
    },
}

/// A rejected attempt kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedAttempt {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Issues found.
    pub issues: Vec<ValidationIssue>,
}

/// Result of clustering one criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterOutcome {
    /// Accepted payload (metrics not yet applied).
    pub payload: ClusterPayload,
    /// Backend calls made; 0 when short-circuited.
    pub attempts: u32,
    /// Rejected attempts, oldest first.
    pub rejected: Vec<RejectedAttempt>,
}

/// Clusters failures for one criterion at a time.
#[derive(Debug)]
pub struct ClusterEngine<B: GenerationBackend> {
    backend: B,
    config: EngineConfig,
}

impl<B: GenerationBackend> ClusterEngine<B> {
    /// Create an engine over a backend.
    #[must_use]
    pub const fn new(backend: B, config: EngineConfig) -> Self {
        Self { backend, config }
    }

    /// Engine settings.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cluster one criterion's failures.
    ///
    /// A criterion without failures returns an empty payload without
    /// contacting the backend.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Backend`] if a backend call fails
    /// - [`EngineError::JsonParseFailed`] if a response holds no usable JSON
    /// - [`EngineError::ValidationFailed`] once the attempt budget is spent
    pub async fn analyze(&self, ctx: &PromptContext<'_>) -> Result<ClusterOutcome, EngineError> {
        let evidence = ctx.evidence;
        if evidence.has_no_failures() {
            tracing::info!(criterion = ctx.criterion, "No failures; skipping clustering");
            return Ok(ClusterOutcome {
                payload: ClusterPayload::no_failures(
                    ctx.criterion,
                    !evidence.near_fails().is_empty(),
                ),
                attempts: 0,
                rejected: Vec::new(),
            });
        }

        let validator = Validator::new(evidence, self.config.example_checks);
        let original = cluster_prompt(ctx)?;
        let max_attempts = self.config.max_attempts.max(1);

        tracing::info!(
            criterion = ctx.criterion,
            failures = evidence.failures().len(),
            near_fails = evidence.near_fails().len(),
            mode = ?validator.mode(),
            "Clustering criterion"
        );

        let mut attempts = 0_u32;
        let mut rejected = Vec::new();
        let mut state = EngineState::Request {
            prompt: original.clone(),
        };

        loop {
            state = match state {
                EngineState::Request { prompt } => {
                    attempts += 1;
                    tracing::debug!(criterion = ctx.criterion, attempt = attempts, "Requesting clusters");
                    let mut draft = self.request(prompt).await?;
                    validator.normalize(&mut draft);
                    EngineState::Validate { draft }
                }
                EngineState::Validate { draft } => match validator.validate(ctx.criterion, &draft) {
                    Ok(payload) => EngineState::Accept(payload),
                    Err(issues) => {
                        tracing::warn!(
                            criterion = ctx.criterion,
                            attempt = attempts,
                            issues = issues.len(),
                            first = %issues[0],
                            "Cluster payload rejected"
                        );
                        rejected.push(RejectedAttempt {
                            attempt: attempts,
                            issues: issues.clone(),
                        });
                        if attempts >= max_attempts {
                            EngineState::Failed { issues }
                        } else {
                            EngineState::Repair { draft, issues }
                        }
                    }
                },
                EngineState::Repair { draft, issues } => {
                    let previous = serde_json::to_string_pretty(&draft).map_err(|e| {
                        EngineError::Serialization {
                            message: e.to_string(),
                        }
                    })?;
                    EngineState::Request {
                        prompt: repair_prompt(&original, &previous, &issues),
                    }
                }
                EngineState::Accept(payload) => {
                    tracing::info!(
                        criterion = ctx.criterion,
                        attempts,
                        clusters = payload.clusters.len(),
                        "Cluster payload accepted"
                    );
                    return Ok(ClusterOutcome {
                        payload,
                        attempts,
                        rejected,
                    });
                }
                EngineState::Failed { issues } => {
                    tracing::error!(
                        criterion = ctx.criterion,
                        attempts,
                        "Cluster validation failed; attempt budget exhausted"
                    );
                    return Err(EngineError::ValidationFailed {
                        criterion: ctx.criterion.to_string(),
                        attempts,
                        errors: issues.iter().map(ToString::to_string).collect(),
                    });
                }
            };
        }
    }

    async fn request(&self, prompt: String) -> Result<DraftPayload, EngineError> {
        let messages = vec![Message::system(SYSTEM_INSTRUCTION), Message::user(prompt)];
        let response = self
            .backend
            .complete(messages, self.config.completion_config())
            .await?;
        tracing::debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Backend response received"
        );
        parse_draft(&response.content)
    }
}
