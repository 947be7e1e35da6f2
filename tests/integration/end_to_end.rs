//! End-to-end report generation from a run directory on disk.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use eval_meta_analysis::clusters::{ClusterEngine, EngineConfig};
use eval_meta_analysis::pipeline::{MetaAnalysis, RunOptions};
use eval_meta_analysis::traits::FixedTimeProvider;

use super::support::{cluster_json, project, record_line, report_date, write_run, ScriptedBackend};

fn run_lines() -> Vec<String> {
    vec![
        record_line(
            1,
            &[("relevance", false, 1.0, "Answer is off-topic."), ("tone", true, 4.0, "Polite.")],
        ),
        record_line(
            2,
            &[("relevance", false, 1.0, "Ignores the refund question."), ("tone", true, 5.0, "Warm.")],
        ),
        record_line(3, &[("relevance", true, 3.0, "Borderline."), ("tone", true, 4.0, "")]),
        record_line(4, &[("relevance", true, 5.0, "Spot on."), ("tone", true, 5.0, "")]),
    ]
}

fn relevance_reply() -> String {
    cluster_json(
        "relevance",
        &[1, 2],
        "Judge says answers are off-topic",
        "Answer is off-topic.",
    )
}

fn analysis(
    backend: &Arc<ScriptedBackend>,
) -> MetaAnalysis<Arc<ScriptedBackend>, FixedTimeProvider> {
    MetaAnalysis::new(
        ClusterEngine::new(Arc::clone(backend), EngineConfig::new("gpt-4o-mini")),
        FixedTimeProvider(report_date()),
    )
}

const EXPECTED_REPORT: &str = "\
# Meta-Analysis Report
*Generated: 2026-03-14*  \n\
*Eval Run: 4 executions*

## Executive Summary
- **Off-topic answers** (relevance): 2 failures, severity High

## Overall Statistics
| Criterion | Avg Score | Pass Rate | Failures |
|---|---|---|---|
| relevance | 2.50 | 50.0% | 2 |
| tone | 4.50 | 100.0% | 0 |

## Criterion Analysis
### relevance
**Pass Rate**: 50.0% | **Avg Score**: 2.50 | **Failures**: 2

#### 1. Off-topic answers (100.0% of failures)
- **Severity**: High
- **Root Cause**: prompt
- **Pattern**: Answers drift away from the question
- **Explanation Signal**: Judge says answers are off-topic
- **Why It Matters**: Users do not get what they asked for
- **Examples**:
  - Exec #1 (failure)
    - Output:
      ```
output 1
      ```
    - Explanation: Answer is off-topic.
    - Issue: Misses the point.
  - Exec #2 (failure)
    - Output:
      ```
output 2
      ```
    - Explanation: Answer is off-topic.
    - Issue: Misses the point.
  - Exec #3 (near_fail)
    - Output:
      ```
output 3
      ```
    - Explanation: Borderline.
    - Issue: Supplemental example aligned with this cluster; see output and explanation.
- **Recommendation**: Restate the question first
- **Risk**: Slightly longer answers

### tone
**Pass Rate**: 100.0% | **Avg Score**: 4.50 | **Failures**: 0

No failures detected for this criterion.
";

#[tokio::test]
async fn test_full_run_writes_expected_report() {
    let root = project();
    let options = write_run(root.path(), "07", &run_lines());
    let backend = Arc::new(ScriptedBackend::new([relevance_reply()]));

    let path = analysis(&backend).run(&options).await.unwrap();

    assert_eq!(path, options.output_path);
    assert_eq!(fs::read_to_string(&path).unwrap(), EXPECTED_REPORT);
    // tone has no failures and is never sent to the backend
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_prompt_carries_run_context() {
    let root = project();
    let options = write_run(root.path(), "07", &run_lines());
    let backend = Arc::new(ScriptedBackend::new([relevance_reply()]));

    analysis(&backend).run(&options).await.unwrap();

    let prompt = backend.user_prompt(0);
    assert!(prompt.contains("A support assistant for billing questions."));
    assert!(prompt.contains("Answer the user's question."));
    assert!(prompt.contains("\"model\": \"gpt-4o\""));
    assert!(prompt.contains("Ignores the refund question."));
    assert!(prompt.contains("[1, 2]"));
}

#[tokio::test]
async fn test_run_local_files_take_precedence() {
    let root = project();
    let options = write_run(root.path(), "07", &run_lines());
    fs::write(
        options.run_dir.join("07_system_prompt.md"),
        "Run-specific prompt: answer briefly.",
    )
    .unwrap();
    let backend = Arc::new(ScriptedBackend::new([relevance_reply()]));

    analysis(&backend).run(&options).await.unwrap();

    let prompt = backend.user_prompt(0);
    assert!(prompt.contains("Run-specific prompt: answer briefly."));
    assert!(!prompt.contains("Answer the user's question."));
}

#[tokio::test]
async fn test_results_found_by_suffix_when_prefix_differs() {
    let root = project();
    let options = write_run(root.path(), "07", &run_lines());
    fs::rename(
        options.run_dir.join("07_eval_results_slim.jsonl"),
        options.run_dir.join("legacy_eval_results_slim.jsonl"),
    )
    .unwrap();
    let backend = Arc::new(ScriptedBackend::new([relevance_reply()]));

    let path = analysis(&backend).run(&options).await.unwrap();
    assert!(fs::read_to_string(path)
        .unwrap()
        .contains("| relevance | 2.50 | 50.0% | 2 |"));
}

#[tokio::test]
async fn test_repeated_runs_are_byte_identical() {
    let root = project();
    let options = write_run(root.path(), "07", &run_lines());
    let second = RunOptions::new(&options.run_dir, "07", root.path().join("again.md"))
        .with_base_dir(root.path());
    let backend = Arc::new(ScriptedBackend::new([relevance_reply(), relevance_reply()]));
    let analysis = analysis(&backend);

    let first = analysis.run(&options).await.unwrap();
    let again = analysis.run(&second).await.unwrap();

    assert_eq!(
        fs::read_to_string(first).unwrap(),
        fs::read_to_string(again).unwrap()
    );
}
