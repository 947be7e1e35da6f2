//! Failure/Near-Fail Selector.

use std::collections::HashMap;

use super::types::{EvaluationEntry, ExecutionId};

/// Maximum number of near-fails kept as supplemental evidence.
pub const NEAR_FAIL_LIMIT: usize = 3;

/// Whether any judge explanation exists in a criterion's evidence.
///
/// Decides which explanation rules the validator enforces and which
/// instruction branch the prompt carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationMode {
    /// At least one failure or near-fail carries an explanation.
    WithExplanations,
    /// No explanation anywhere; the sentinel is mandatory.
    WithoutExplanations,
}

impl ExplanationMode {
    /// Mode for a given availability flag.
    #[must_use]
    pub const fn from_available(available: bool) -> Self {
        if available {
            Self::WithExplanations
        } else {
            Self::WithoutExplanations
        }
    }

    /// Whether explanations are available.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::WithExplanations)
    }
}

/// Failures and near-fails for one criterion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceSet {
    failures: Vec<EvaluationEntry>,
    near_fails: Vec<EvaluationEntry>,
}

impl EvidenceSet {
    /// Partition a criterion's entries.
    ///
    /// Failures keep entry order. Near-fails are passes scored exactly at
    /// their own threshold, stably sorted by score and capped at
    /// [`NEAR_FAIL_LIMIT`].
    #[must_use]
    pub fn select(entries: &[EvaluationEntry]) -> Self {
        let failures = entries.iter().filter(|e| e.is_failure()).cloned().collect();

        let mut near_fails: Vec<EvaluationEntry> =
            entries.iter().filter(|e| e.is_near_fail()).cloned().collect();
        near_fails.sort_by(|a, b| {
            a.score
                .unwrap_or_default()
                .total_cmp(&b.score.unwrap_or_default())
        });
        near_fails.truncate(NEAR_FAIL_LIMIT);

        Self {
            failures,
            near_fails,
        }
    }

    /// Failing entries.
    #[must_use]
    pub fn failures(&self) -> &[EvaluationEntry] {
        &self.failures
    }

    /// Borderline passes.
    #[must_use]
    pub fn near_fails(&self) -> &[EvaluationEntry] {
        &self.near_fails
    }

    /// Whether there is nothing to cluster.
    #[must_use]
    pub fn has_no_failures(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failure IDs in entry order.
    #[must_use]
    pub fn failure_ids(&self) -> Vec<ExecutionId> {
        self.failures.iter().map(|e| e.execution_id).collect()
    }

    /// Near-fail IDs in selection order.
    #[must_use]
    pub fn near_fail_ids(&self) -> Vec<ExecutionId> {
        self.near_fails.iter().map(|e| e.execution_id).collect()
    }

    /// Look up a failure by execution ID.
    #[must_use]
    pub fn failure(&self, id: ExecutionId) -> Option<&EvaluationEntry> {
        self.failures.iter().find(|e| e.execution_id == id)
    }

    /// Whether `id` belongs to the failure set.
    #[must_use]
    pub fn is_failure_id(&self, id: ExecutionId) -> bool {
        self.failures.iter().any(|e| e.execution_id == id)
    }

    /// Whether `id` belongs to the near-fail set.
    #[must_use]
    pub fn is_near_fail_id(&self, id: ExecutionId) -> bool {
        self.near_fails.iter().any(|e| e.execution_id == id)
    }

    /// Explanation availability across failures and near-fails.
    #[must_use]
    pub fn explanation_mode(&self) -> ExplanationMode {
        ExplanationMode::from_available(self.all().any(EvaluationEntry::has_explanation))
    }

    /// Map of known execution IDs to whether each has an explanation.
    ///
    /// IDs outside the evidence are absent from the map.
    #[must_use]
    pub fn explanation_index(&self) -> HashMap<ExecutionId, bool> {
        self.all()
            .map(|e| (e.execution_id, e.has_explanation()))
            .collect()
    }

    fn all(&self) -> impl Iterator<Item = &EvaluationEntry> {
        self.failures.iter().chain(self.near_fails.iter())
    }
}
