//! Test utilities and mock factories.
//!
//! This module provides shared testing infrastructure:
//! - Mock generation backends with canned replies
//! - Evaluation entry and record fixtures
//!
//! Only compiled for tests (`#[cfg(test)]`).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use crate::error::BackendError;
use crate::evaluation::{EvalRecord, EvaluationEntry, ExecutionId};
use crate::traits::{CompletionResponse, MockGenerationBackend, MockTimeProvider, Usage};

/// Create a mock backend that always returns `response`.
///
/// # Example
///
/// ```ignore
/// let mock = mock_backend_success(r#"{"clusters": []}"#);
/// let result = mock.complete(messages, config).await;
/// ```
#[must_use]
pub fn mock_backend_success(response: impl Into<String>) -> MockGenerationBackend {
    let response = response.into();
    let mut mock = MockGenerationBackend::new();
    mock.expect_complete().returning(move |_msgs, _config| {
        Ok(CompletionResponse::new(response.clone(), Usage::new(100, 50)))
    });
    mock
}

/// Create a mock backend that always fails with `error`.
#[must_use]
pub fn mock_backend_error(error: BackendError) -> MockGenerationBackend {
    let mut mock = MockGenerationBackend::new();
    mock.expect_complete()
        .returning(move |_msgs, _config| Err(error.clone()));
    mock
}

/// Create a mock backend that must never be called.
#[must_use]
pub fn mock_backend_unused() -> MockGenerationBackend {
    let mut mock = MockGenerationBackend::new();
    mock.expect_complete().never();
    mock
}

/// A fixed instant used for rendered dates.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
}

/// Create a mock time provider pinned to [`fixed_now`].
#[must_use]
pub fn mock_time_provider() -> MockTimeProvider {
    let mut mock = MockTimeProvider::new();
    mock.expect_now().returning(fixed_now);
    mock
}

/// An entry with threshold 3: failures score 1, passes sit exactly on the
/// threshold and so are near-fails.
#[must_use]
pub fn entry(id: ExecutionId, passed: bool, explanation: &str) -> EvaluationEntry {
    EvaluationEntry {
        execution_id: id,
        score: Some(if passed { 3.0 } else { 1.0 }),
        pass_threshold: 3.0,
        passed: Some(passed),
        explanation: explanation.to_string(),
        output: format!("output {id}"),
        input: serde_json::Value::Null,
    }
}

/// A record with one judgment per `(criterion, passed, score)` triple.
#[must_use]
pub fn record(id: ExecutionId, judgments: &[(&str, bool, f64)]) -> EvalRecord {
    let evals: Vec<_> = judgments
        .iter()
        .map(|(name, passed, score)| {
            json!({
                "eval_name": name,
                "score": score,
                "explanation": if *passed { "" } else { "Judge disliked it." },
                "pass_threshold": 3.0,
                "passed": passed,
            })
        })
        .collect();
    serde_json::from_value(json!({
        "execution_id": id,
        "output": format!("output {id}"),
        "input": {},
        "evals": evals,
    }))
    .expect("fixture record")
}
