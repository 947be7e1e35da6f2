//! Cluster payload types.
//!
//! Model output is first decoded into lenient *draft* types where every
//! field may be missing or mistyped, so structural problems surface as
//! validation issues that drive repair rather than as decode errors. Only
//! an accepted draft is converted into the typed [`ClusterPayload`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::evaluation::ExecutionId;

/// Sentinel substituted wherever a judge explanation is absent.
pub const NO_EXPLANATION: &str = "No explanation provided by judge.";

/// Note attached to criteria with no failures.
pub const NO_FAILURES_NOTE: &str = "No failures detected for this criterion.";

/// Issue note for locally backfilled examples.
pub const SUPPLEMENTAL_NOTE: &str =
    "Supplemental example aligned with this cluster; see output and explanation.";

/// Values treated as unfilled schema text, compared trimmed and lowercased.
pub const PLACEHOLDER_VALUES: [&str; 6] = [
    "short, specific",
    "what is happening",
    "tbd",
    "n/a",
    "none",
    "unknown",
];

/// Whether `value` is schema placeholder text.
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    PLACEHOLDER_VALUES.contains(&normalized.as_str())
}

/// Cluster severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Weight 3.
    High,
    /// Weight 2.
    Medium,
    /// Weight 1.
    Low,
}

impl Severity {
    /// Ranking weight.
    #[must_use]
    pub const fn weight(self) -> usize {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    /// Parse the exact literal `High`, `Medium` or `Low`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "High" => Some(Self::High),
            "Medium" => Some(Self::Medium),
            "Low" => Some(Self::Low),
            _ => None,
        }
    }

    /// The literal name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which evidence set an example was drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExampleType {
    /// A failing execution.
    Failure,
    /// A borderline pass.
    NearFail,
    /// Any other label the model used; only reachable when example checks
    /// are not enforced.
    Other(String),
}

impl ExampleType {
    /// Parse a label, keeping unknown text as [`ExampleType::Other`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "failure" => Self::Failure,
            "near_fail" => Self::NearFail,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ExampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failure => f.write_str("failure"),
            Self::NearFail => f.write_str("near_fail"),
            Self::Other(label) => f.write_str(label),
        }
    }
}

// ============================================================================
// Draft (untrusted) types
// ============================================================================

/// Top-level payload exactly as the model returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftPayload {
    /// Criterion echoed by the model.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub criterion: Value,
    /// Failure count echoed by the model.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub failures: Value,
    /// Proposed clusters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub clusters: Vec<DraftCluster>,
    /// Note for criteria without failures.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub no_issue_note: Value,
    /// Unrecognized keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One proposed cluster. Field names mirror the requested schema.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftCluster {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub cluster_name: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub severity: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub root_cause: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub pattern: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub explanation_anchor: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub why_it_matters: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub failure_execution_ids: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub examples: Vec<DraftExample>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub recommendation: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DraftCluster {
    /// Raw assigned IDs; empty unless the field is an array.
    #[must_use]
    pub fn raw_failure_ids(&self) -> &[Value] {
        self.failure_execution_ids
            .as_array()
            .map_or(&[], Vec::as_slice)
    }
}

/// One proposed example.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftExample {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub execution_id: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub example_type: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub output_full: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub explanation_excerpt: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub issue_note: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DraftExample {
    /// Execution ID, if it is an integer.
    #[must_use]
    pub fn id(&self) -> Option<ExecutionId> {
        as_id(&self.execution_id)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Trimmed text of a loosely typed field. Null reads as empty.
#[must_use]
pub fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Integer execution ID of a loosely typed field.
#[must_use]
pub fn as_id(value: &Value) -> Option<ExecutionId> {
    value.as_i64()
}

// ============================================================================
// Accepted (typed) types
// ============================================================================

/// Remediation proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recommendation {
    /// Where the fix lands (prompt, data, eval, model).
    pub kind: String,
    /// Concrete change.
    pub action: String,
    /// Side effects or trade-offs.
    pub risk: String,
}

/// Supporting example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    /// Execution shown.
    pub execution_id: Option<ExecutionId>,
    /// Evidence set it came from.
    pub example_type: ExampleType,
    /// Complete output text.
    pub output_full: String,
    /// Judge explanation excerpt or [`NO_EXPLANATION`].
    pub explanation_excerpt: String,
    /// Short description of the issue.
    pub issue_note: String,
}

/// Accepted cluster with metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Short descriptive name.
    pub cluster_name: String,
    /// Severity.
    pub severity: Severity,
    /// Free text; commonly prompt, data, eval, model or mixed.
    pub root_cause: String,
    /// What is happening.
    pub pattern: String,
    /// Judge explanation pattern defining the cluster, or the sentinel.
    pub explanation_anchor: String,
    /// Product impact.
    pub why_it_matters: String,
    /// Assigned failures.
    pub failure_execution_ids: Vec<ExecutionId>,
    /// Supporting examples.
    pub examples: Vec<Example>,
    /// Proposed fix.
    pub recommendation: Recommendation,
    /// Number of assigned failures.
    pub prevalence_count: usize,
    /// Share of the criterion's failures, one decimal.
    pub prevalence_pct: f64,
    /// 1-based position within the criterion.
    pub priority_rank: usize,
}

impl Cluster {
    /// Whether any example came from the near-fail set.
    #[must_use]
    pub fn has_near_fail_example(&self) -> bool {
        self.examples
            .iter()
            .any(|e| e.example_type == ExampleType::NearFail)
    }
}

/// Accepted payload for one criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterPayload {
    /// Criterion name.
    pub criterion: String,
    /// Number of failures clustered.
    pub failures: usize,
    /// Clusters, in priority order once metrics are applied.
    pub clusters: Vec<Cluster>,
    /// Note shown when there is nothing to cluster.
    pub no_issue_note: Option<String>,
    /// Whether the criterion had any near-fails.
    pub near_fail_available: bool,
}

impl ClusterPayload {
    /// Trivial payload for a criterion without failures.
    #[must_use]
    pub fn no_failures(criterion: impl Into<String>, near_fail_available: bool) -> Self {
        Self {
            criterion: criterion.into(),
            failures: 0,
            clusters: Vec::new(),
            no_issue_note: Some(NO_FAILURES_NOTE.to_string()),
            near_fail_available,
        }
    }
}
