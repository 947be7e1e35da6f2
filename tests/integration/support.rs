//! Shared fixtures: a scripted backend and on-disk run directories.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;

use eval_meta_analysis::error::BackendError;
use eval_meta_analysis::evaluation::{EvaluationEntry, ExecutionId};
use eval_meta_analysis::pipeline::RunOptions;
use eval_meta_analysis::traits::{
    CompletionConfig, CompletionResponse, GenerationBackend, Message, Usage,
};

/// Backend that replays canned replies in order and records requests.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedBackend {
    /// Replay `replies` as successful completions.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail the first call with `error`.
    pub fn failing(error: BackendError) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(error)])),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of completed calls.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The user message of call `index`.
    pub fn user_prompt(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index]
            .iter()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .expect("user message")
    }

    /// The system message of call `index`.
    pub fn system_prompt(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index][0].content.clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn complete(
        &self,
        messages: Vec<Message>,
        _config: CompletionConfig,
    ) -> Result<CompletionResponse, BackendError> {
        self.requests.lock().unwrap().push(messages);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(CompletionResponse::new(text, Usage::new(100, 50))),
            Some(Err(e)) => Err(e),
            None => Err(BackendError::UnexpectedResponse {
                message: "script exhausted".into(),
            }),
        }
    }
}

/// Fixed report date.
pub fn report_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

/// Entry with threshold 3; failures score 1, passes sit on the threshold.
pub fn entry(id: ExecutionId, passed: bool, explanation: &str) -> EvaluationEntry {
    EvaluationEntry {
        execution_id: id,
        score: Some(if passed { 3.0 } else { 1.0 }),
        pass_threshold: 3.0,
        passed: Some(passed),
        explanation: explanation.to_string(),
        output: format!("output {id}"),
        input: Value::Null,
    }
}

/// A single-cluster payload covering `ids`, one example per id.
pub fn cluster_json(criterion: &str, ids: &[ExecutionId], anchor: &str, excerpt: &str) -> String {
    let examples: Vec<Value> = ids
        .iter()
        .take(3)
        .map(|id| {
            json!({
                "execution_id": id,
                "example_type": "failure",
                "output_full": format!("output {id}"),
                "explanation_excerpt": excerpt,
                "issue_note": "Misses the point."
            })
        })
        .collect();
    json!({
        "criterion": criterion,
        "failures": ids.len(),
        "clusters": [{
            "cluster_name": "Off-topic answers",
            "severity": "High",
            "root_cause": "prompt",
            "pattern": "Answers drift away from the question",
            "explanation_anchor": anchor,
            "why_it_matters": "Users do not get what they asked for",
            "failure_execution_ids": ids,
            "examples": examples,
            "recommendation": {"type": "prompt", "action": "Restate the question first", "risk": "Slightly longer answers"}
        }]
    })
    .to_string()
}

/// A payload whose only cluster lacks a pattern.
pub fn missing_pattern_json(criterion: &str, ids: &[ExecutionId]) -> String {
    let mut value: Value =
        serde_json::from_str(&cluster_json(criterion, ids, "Judge says off-topic", "Off-topic.")).unwrap();
    value["clusters"][0].as_object_mut().unwrap().remove("pattern");
    value.to_string()
}

/// One JSONL record: `(criterion, passed, score, explanation)` per judgment.
pub fn record_line(id: ExecutionId, judgments: &[(&str, bool, f64, &str)]) -> String {
    let evals: Vec<Value> = judgments
        .iter()
        .map(|(name, passed, score, explanation)| {
            json!({
                "eval_name": name,
                "score": score,
                "explanation": explanation,
                "pass_threshold": 3,
                "passed": passed,
                "range": [1, 5]
            })
        })
        .collect();
    json!({"execution_id": id, "output": format!("output {id}"), "input": {"q": id}, "evals": evals})
        .to_string()
}

/// Lay out a run directory plus project-level prompt and context files.
pub fn write_run(root: &Path, run_id: &str, lines: &[String]) -> RunOptions {
    let run_dir = root.join("runs").join(run_id);
    fs::create_dir_all(&run_dir).unwrap();
    fs::create_dir_all(root.join("prompts")).unwrap();
    fs::create_dir_all(root.join("context")).unwrap();

    fs::write(
        run_dir.join(format!("{run_id}_eval_results_slim.jsonl")),
        lines.join("\n") + "\n",
    )
    .unwrap();
    fs::write(
        root.join("prompts").join("Evals.json"),
        json!([
            {"name": "relevance", "model": "gpt-4o", "type": "score", "pass_threshold": 3, "range": [1, 5]},
            {"name": "tone", "model": "gpt-4o", "type": "score", "pass_threshold": 3, "range": [1, 5]}
        ])
        .to_string(),
    )
    .unwrap();
    fs::write(root.join("prompts").join("system_prompt.md"), "Answer the user's question.").unwrap();
    fs::write(
        root.join("context").join("feature_context.md"),
        "A support assistant for billing questions.",
    )
    .unwrap();

    RunOptions::new(&run_dir, run_id, run_dir.join(format!("{run_id}_meta_analysis_report.md")))
        .with_base_dir(root)
}

/// Temp project root.
pub fn project() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}
