//! Evaluation Source and Criterion Catalog data types.

#![allow(clippy::derive_partial_eq_without_eq)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Execution identifier. Unique per execution, shared across criteria.
pub type ExecutionId = i64;

/// One execution from the slim results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRecord {
    /// Execution identifier.
    pub execution_id: ExecutionId,
    /// Generated output under evaluation.
    #[serde(default)]
    pub output: Option<String>,
    /// Input the output was generated from.
    #[serde(default)]
    pub input: serde_json::Value,
    /// One judgment per criterion.
    #[serde(default)]
    pub evals: Vec<EvalJudgment>,
}

/// A judge's verdict on one criterion for one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalJudgment {
    /// Criterion name.
    pub eval_name: String,
    /// Judged score, if the judge produced one.
    #[serde(default)]
    pub score: Option<f64>,
    /// Judge explanation; may be absent or empty.
    #[serde(default)]
    pub explanation: Option<String>,
    /// Threshold the score was compared against.
    #[serde(default)]
    pub pass_threshold: Option<f64>,
    /// Pass/fail verdict. `None` counts as not passed in statistics.
    #[serde(default)]
    pub passed: Option<bool>,
    /// Scoring range, carried through untouched.
    #[serde(default)]
    pub range: Option<serde_json::Value>,
}

/// A single judgment flattened together with its execution.
///
/// Serialized field order is the order the model sees in prompts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationEntry {
    /// Execution identifier.
    pub execution_id: ExecutionId,
    /// Judged score.
    pub score: Option<f64>,
    /// Pass threshold for this criterion.
    pub pass_threshold: f64,
    /// Pass/fail verdict.
    pub passed: Option<bool>,
    /// Judge explanation, empty when absent.
    pub explanation: String,
    /// Full generated output.
    pub output: String,
    /// Generation input.
    pub input: serde_json::Value,
}

impl EvaluationEntry {
    /// Build an entry from an execution and one of its judgments.
    #[must_use]
    pub fn from_judgment(record: &EvalRecord, judgment: &EvalJudgment) -> Self {
        Self {
            execution_id: record.execution_id,
            score: judgment.score,
            pass_threshold: judgment.pass_threshold.unwrap_or_default(),
            passed: judgment.passed,
            explanation: judgment.explanation.clone().unwrap_or_default(),
            output: record.output.clone().unwrap_or_default(),
            input: record.input.clone(),
        }
    }

    /// Whether the judge left a usable explanation.
    ///
    /// Whitespace-only explanations count as absent.
    #[must_use]
    pub fn has_explanation(&self) -> bool {
        !self.explanation.trim().is_empty()
    }

    /// Whether this entry is an explicit failure (`passed == false`).
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.passed, Some(false))
    }

    /// Whether this entry passed with a score exactly at its threshold.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_near_fail(&self) -> bool {
        matches!(self.passed, Some(true))
            && self.score.is_some_and(|score| score == self.pass_threshold)
    }
}

/// One entry of the criterion catalog (`Evals.json`).
///
/// Only `name` is required. Unknown keys are kept so the prompt can show
/// the definition as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionDefinition {
    /// Criterion name; the catalog key.
    pub name: String,
    /// Judge model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Judgment type (e.g. "score").
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Pass threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_threshold: Option<f64>,
    /// Scoring range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<serde_json::Value>,
    /// Judge prompt template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
    /// Any other keys.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Criterion definitions keyed by name, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriterionCatalog {
    definitions: IndexMap<String, CriterionDefinition>,
}

impl CriterionCatalog {
    /// Build a catalog. Later duplicates replace earlier ones.
    #[must_use]
    pub fn new(definitions: Vec<CriterionDefinition>) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
        }
    }

    /// Look up a definition by criterion name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CriterionDefinition> {
        self.definitions.get(name)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Per-criterion summary statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CriterionStats {
    /// Mean of non-null scores, 0 when there are none.
    pub avg_score: f64,
    /// Passed / total, 0 when total is 0.
    pub pass_rate: f64,
    /// Judgments that did not pass.
    pub failures: usize,
    /// Judgments seen.
    pub total: usize,
}
