//! Repair loop workflow tests.
//!
//! Tests the request → validate → repair cycle against a scripted backend:
//! acceptance, bounded retries, short circuit and fatal parse errors.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use pretty_assertions::assert_eq;

use eval_meta_analysis::clusters::{
    ClusterEngine, EngineConfig, ExampleCheckPolicy, NO_EXPLANATION, NO_FAILURES_NOTE,
};
use eval_meta_analysis::error::{BackendError, EngineError};
use eval_meta_analysis::evaluation::{EvaluationEntry, EvidenceSet};
use eval_meta_analysis::prompts::{PromptContext, SYSTEM_INSTRUCTION};

use super::support::{cluster_json, entry, missing_pattern_json, ScriptedBackend};

const CRITERION: &str = "relevance";

fn explained_failures() -> Vec<EvaluationEntry> {
    vec![
        entry(1, false, "Answer is off-topic."),
        entry(2, false, "Does not address the refund question."),
        entry(3, true, "Borderline but relevant."),
    ]
}

fn context(evidence: &EvidenceSet) -> PromptContext<'_> {
    PromptContext {
        criterion: CRITERION,
        definition: None,
        evidence,
        product_context: "A support assistant for billing questions.",
        system_prompt: "Answer the user's question.",
    }
}

fn engine(backend: &Arc<ScriptedBackend>) -> ClusterEngine<Arc<ScriptedBackend>> {
    ClusterEngine::new(Arc::clone(backend), EngineConfig::new("gpt-4o-mini"))
}

fn valid() -> String {
    cluster_json(CRITERION, &[1, 2], "Judge says answers are off-topic", "Answer is off-topic.")
}

#[tokio::test]
async fn test_valid_first_response_is_accepted() {
    let backend = Arc::new(ScriptedBackend::new([valid()]));
    let evidence = EvidenceSet::select(&explained_failures());

    let outcome = engine(&backend).analyze(&context(&evidence)).await.unwrap();

    assert_eq!(outcome.attempts, 1);
    assert!(outcome.rejected.is_empty());
    assert_eq!(backend.calls(), 1);
    assert_eq!(backend.system_prompt(0), SYSTEM_INSTRUCTION);
    assert!(backend.user_prompt(0).contains("[1, 2]"));

    let payload = outcome.payload;
    assert_eq!(payload.criterion, CRITERION);
    assert_eq!(payload.failures, 2);
    assert_eq!(payload.clusters[0].failure_execution_ids, vec![1, 2]);
}

#[tokio::test]
async fn test_rejected_response_is_repaired() {
    let backend = Arc::new(ScriptedBackend::new([
        missing_pattern_json(CRITERION, &[1, 2]),
        valid(),
    ]));
    let evidence = EvidenceSet::select(&explained_failures());

    let outcome = engine(&backend).analyze(&context(&evidence)).await.unwrap();

    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(
        outcome.rejected[0].issues[0].to_string(),
        "Cluster 1: pattern is missing or placeholder."
    );

    let repair = backend.user_prompt(1);
    assert!(repair.starts_with("Your previous JSON did not meet requirements. Fix it."));
    assert!(repair.contains("- Cluster 1: pattern is missing or placeholder."));
    assert!(repair.contains("Original instructions:\n"));
    assert!(repair.ends_with("Return corrected JSON only. Do not add extra text."));
}

#[tokio::test]
async fn test_unassigned_failure_drives_repair() {
    let backend = Arc::new(ScriptedBackend::new([
        cluster_json(CRITERION, &[1], "Judge says answers are off-topic", "Answer is off-topic."),
        valid(),
    ]));
    let evidence = EvidenceSet::select(&explained_failures());

    let outcome = engine(&backend).analyze(&context(&evidence)).await.unwrap();

    assert_eq!(outcome.attempts, 2);
    assert_eq!(
        outcome.rejected[0]
            .issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        vec!["Not all failures are assigned to a cluster: [2].".to_string()]
    );
}

#[tokio::test]
async fn test_budget_exhausted_after_exactly_three_attempts() {
    let bad = missing_pattern_json(CRITERION, &[1, 2]);
    let backend = Arc::new(ScriptedBackend::new([
        bad.clone(),
        bad.clone(),
        bad.clone(),
        valid(),
    ]));
    let evidence = EvidenceSet::select(&explained_failures());

    let err = engine(&backend).analyze(&context(&evidence)).await.unwrap_err();

    assert_eq!(backend.calls(), 3);
    assert_eq!(
        err,
        EngineError::ValidationFailed {
            criterion: CRITERION.to_string(),
            attempts: 3,
            errors: vec!["Cluster 1: pattern is missing or placeholder.".to_string()],
        }
    );
}

#[tokio::test]
async fn test_custom_attempt_budget() {
    let bad = missing_pattern_json(CRITERION, &[1, 2]);
    let backend = Arc::new(ScriptedBackend::new([bad.clone(), bad]));
    let evidence = EvidenceSet::select(&explained_failures());
    let engine = ClusterEngine::new(
        Arc::clone(&backend),
        EngineConfig::new("gpt-4o-mini").with_max_attempts(1),
    );

    let err = engine.analyze(&context(&evidence)).await.unwrap_err();

    assert_eq!(backend.calls(), 1);
    assert!(matches!(err, EngineError::ValidationFailed { attempts: 1, .. }));
}

#[tokio::test]
async fn test_no_failures_never_calls_backend() {
    let backend = Arc::new(ScriptedBackend::new([valid()]));
    let entries = vec![entry(1, true, "Fine."), entry(2, true, "")];
    let evidence = EvidenceSet::select(&entries);

    let outcome = engine(&backend).analyze(&context(&evidence)).await.unwrap();

    assert_eq!(backend.calls(), 0);
    assert_eq!(outcome.attempts, 0);
    assert!(outcome.payload.clusters.is_empty());
    assert_eq!(outcome.payload.no_issue_note.as_deref(), Some(NO_FAILURES_NOTE));
    assert!(outcome.payload.near_fail_available);
}

#[tokio::test]
async fn test_fenced_response_is_accepted() {
    let backend = Arc::new(ScriptedBackend::new([format!(
        "Here is the analysis:\n```json\n{}\n```\nLet me know if you need more.",
        valid()
    )]));
    let evidence = EvidenceSet::select(&explained_failures());

    let outcome = engine(&backend).analyze(&context(&evidence)).await.unwrap();
    assert_eq!(outcome.payload.clusters.len(), 1);
}

#[tokio::test]
async fn test_unparseable_response_is_fatal() {
    let backend = Arc::new(ScriptedBackend::new(["I could not find any clusters.", "{}"]));
    let evidence = EvidenceSet::select(&explained_failures());

    let err = engine(&backend).analyze(&context(&evidence)).await.unwrap_err();

    assert!(matches!(err, EngineError::JsonParseFailed { .. }));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_backend_error_propagates() {
    let backend = Arc::new(ScriptedBackend::failing(BackendError::Timeout {
        timeout_ms: 120_000,
    }));
    let evidence = EvidenceSet::select(&explained_failures());

    let err = engine(&backend).analyze(&context(&evidence)).await.unwrap_err();

    assert_eq!(
        err,
        EngineError::Backend(BackendError::Timeout {
            timeout_ms: 120_000
        })
    );
}

#[tokio::test]
async fn test_missing_explanations_force_sentinel() {
    let backend = Arc::new(ScriptedBackend::new([cluster_json(
        CRITERION,
        &[1, 2],
        "Judge says answers are off-topic",
        "Answer is off-topic.",
    )]));
    let entries = vec![entry(1, false, ""), entry(2, false, "   ")];
    let evidence = EvidenceSet::select(&entries);

    let outcome = engine(&backend).analyze(&context(&evidence)).await.unwrap();

    let cluster = &outcome.payload.clusters[0];
    assert_eq!(cluster.explanation_anchor, NO_EXPLANATION);
    assert!(cluster
        .examples
        .iter()
        .all(|e| e.explanation_excerpt == NO_EXPLANATION));
    assert!(backend.user_prompt(0).contains(NO_EXPLANATION));
}

#[tokio::test]
async fn test_always_policy_checks_examples_with_explanations() {
    let mut bad: serde_json::Value = serde_json::from_str(&valid()).unwrap();
    bad["clusters"][0]["examples"][0]["issue_note"] = serde_json::json!("");
    let backend = Arc::new(ScriptedBackend::new([bad.to_string(), valid()]));
    let evidence = EvidenceSet::select(&explained_failures());
    let engine = ClusterEngine::new(
        Arc::clone(&backend),
        EngineConfig::new("gpt-4o-mini").with_example_checks(ExampleCheckPolicy::Always),
    );

    let outcome = engine.analyze(&context(&evidence)).await.unwrap();

    assert_eq!(outcome.attempts, 2);
    assert_eq!(
        outcome.rejected[0].issues[0].to_string(),
        "Cluster 1 example 1: issue_note is missing or placeholder."
    );
}
