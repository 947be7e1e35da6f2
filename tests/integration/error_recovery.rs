//! Error recovery and edge case tests.
//!
//! Tests that bad inputs and failed criteria abort a run cleanly, naming
//! the cause and leaving no partial report behind.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::sync::Arc;

use eval_meta_analysis::clusters::{ClusterEngine, EngineConfig};
use eval_meta_analysis::error::{AppError, BackendError, EngineError, InputError};
use eval_meta_analysis::pipeline::MetaAnalysis;
use eval_meta_analysis::traits::FixedTimeProvider;

use super::support::{
    cluster_json, missing_pattern_json, project, record_line, report_date, write_run,
    ScriptedBackend,
};

fn lines() -> Vec<String> {
    vec![
        record_line(1, &[("relevance", false, 1.0, "Off-topic."), ("tone", false, 2.0, "Rude.")]),
        record_line(2, &[("relevance", false, 2.0, "Vague."), ("tone", true, 4.0, "Fine.")]),
    ]
}

fn analysis(
    backend: &Arc<ScriptedBackend>,
) -> MetaAnalysis<Arc<ScriptedBackend>, FixedTimeProvider> {
    MetaAnalysis::new(
        ClusterEngine::new(Arc::clone(backend), EngineConfig::new("gpt-4o-mini")),
        FixedTimeProvider(report_date()),
    )
}

#[tokio::test]
async fn test_validation_failure_aborts_whole_run() {
    let root = project();
    let options = write_run(root.path(), "07", &lines());
    let bad = missing_pattern_json("relevance", &[1, 2]);
    let backend = Arc::new(ScriptedBackend::new([bad.clone(), bad.clone(), bad]));

    let err = analysis(&backend).run(&options).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Engine(EngineError::ValidationFailed { ref criterion, attempts: 3, .. })
            if criterion == "relevance"
    ));
    // tone is never attempted after relevance fails
    assert_eq!(backend.calls(), 3);
    assert!(!options.output_path.exists());
}

#[tokio::test]
async fn test_malformed_record_names_line() {
    let root = project();
    let mut records = lines();
    records.insert(1, "{not json".to_string());
    let options = write_run(root.path(), "07", &records);
    let backend = Arc::new(ScriptedBackend::new(Vec::<String>::new()));

    let err = analysis(&backend).run(&options).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Input(InputError::MalformedRecord { line: 2, .. })
    ));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_blank_lines_are_skipped() {
    let root = project();
    let mut records = lines();
    records.insert(1, String::new());
    records.insert(0, "   ".to_string());
    let options = write_run(root.path(), "07", &records);
    let backend = Arc::new(ScriptedBackend::failing(BackendError::AuthenticationFailed));

    let err = analysis(&backend).run(&options).await.unwrap_err();

    // loading succeeded; the run got as far as the backend
    assert!(matches!(
        err,
        AppError::Engine(EngineError::Backend(BackendError::AuthenticationFailed))
    ));
}

#[tokio::test]
async fn test_missing_product_context_is_fatal() {
    let root = project();
    let options = write_run(root.path(), "07", &lines());
    fs::remove_file(root.path().join("context").join("feature_context.md")).unwrap();
    let backend = Arc::new(ScriptedBackend::new(Vec::<String>::new()));

    let err = analysis(&backend).run(&options).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Input(InputError::MissingFile { ref description, .. })
            if description == "Product context"
    ));
}

#[tokio::test]
async fn test_missing_results_is_fatal() {
    let root = project();
    let options = write_run(root.path(), "07", &lines());
    fs::remove_file(options.run_dir.join("07_eval_results_slim.jsonl")).unwrap();
    let backend = Arc::new(ScriptedBackend::new(Vec::<String>::new()));

    let err = analysis(&backend).run(&options).await.unwrap_err();

    assert!(err.to_string().contains("Slim eval results not found"));
}

#[tokio::test]
async fn test_malformed_catalog_is_fatal() {
    let root = project();
    let options = write_run(root.path(), "07", &lines());
    fs::write(root.path().join("prompts").join("Evals.json"), "{\"name\": 1").unwrap();
    let backend = Arc::new(ScriptedBackend::new(Vec::<String>::new()));

    let err = analysis(&backend).run(&options).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Input(InputError::MalformedCatalog { .. })
    ));
}

#[tokio::test]
async fn test_unwritable_output_is_io_error() {
    let root = project();
    let mut options = write_run(root.path(), "07", &lines());
    options.output_path = root.path().join("missing-dir").join("report.md");
    let reply = cluster_json("relevance", &[1, 2], "Judge flags vagueness", "Vague.");
    let tone = cluster_json("tone", &[1], "Judge flags rudeness", "Rude.");
    let backend = Arc::new(ScriptedBackend::new([reply, tone]));

    let err = analysis(&backend).run(&options).await.unwrap_err();

    assert!(matches!(err, AppError::Input(InputError::Io { .. })));
}
