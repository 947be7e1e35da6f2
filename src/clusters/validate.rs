//! Normalization and validation of draft cluster payloads.
//!
//! The [`Validator`] is built once per criterion from its evidence. It
//! carries the explanation mode and the explanation index so every rule
//! that depends on explanation availability reads from one place.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use thiserror::Error;

use super::types::{
    as_id, is_placeholder, text, Cluster, ClusterPayload, DraftCluster, DraftExample,
    DraftPayload, Example, ExampleType, Recommendation, Severity, NO_EXPLANATION,
};
use crate::evaluation::{EvidenceSet, ExecutionId, ExplanationMode};

/// When per-example `issue_note` and `example_type` checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExampleCheckPolicy {
    /// Only when the criterion has no judge explanations.
    #[default]
    WithoutExplanationsOnly,
    /// For every criterion.
    Always,
}

impl ExampleCheckPolicy {
    /// Whether the checks apply under `mode`.
    #[must_use]
    pub const fn applies(self, mode: ExplanationMode) -> bool {
        match self {
            Self::Always => true,
            Self::WithoutExplanationsOnly => !mode.is_available(),
        }
    }
}

impl std::str::FromStr for ExampleCheckPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Self::Always),
            "without-explanations" => Ok(Self::WithoutExplanationsOnly),
            other => Err(format!(
                "unknown example check policy '{other}' (expected 'always' or 'without-explanations')"
            )),
        }
    }
}

/// A single validation finding. `Display` is the text sent back in the
/// repair prompt. Cluster and example positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// Failures exist but no clusters were returned.
    #[error("No clusters provided for failures.")]
    NoClusters,

    /// Empty or placeholder cluster name.
    #[error("Cluster {cluster}: cluster_name is missing or placeholder.")]
    ClusterName {
        /// Cluster position.
        cluster: usize,
    },

    /// Empty or placeholder pattern.
    #[error("Cluster {cluster}: pattern is missing or placeholder.")]
    Pattern {
        /// Cluster position.
        cluster: usize,
    },

    /// Empty explanation anchor.
    #[error("Cluster {cluster}: explanation_anchor is missing.")]
    AnchorMissing {
        /// Cluster position.
        cluster: usize,
    },

    /// Empty or placeholder rationale.
    #[error("Cluster {cluster}: why_it_matters is missing or placeholder.")]
    WhyItMatters {
        /// Cluster position.
        cluster: usize,
    },

    /// Severity outside the allowed literals.
    #[error("Cluster {cluster}: severity must be High, Medium, or Low (got \"{found}\").")]
    Severity {
        /// Cluster position.
        cluster: usize,
        /// Value supplied.
        found: String,
    },

    /// No assigned failures.
    #[error("Cluster {cluster}: failure_execution_ids missing.")]
    NoFailureIds {
        /// Cluster position.
        cluster: usize,
    },

    /// Assigned ID that is not a failure of this criterion.
    #[error("Cluster {cluster}: failure_execution_ids includes unknown ID {id}.")]
    UnknownFailureId {
        /// Cluster position.
        cluster: usize,
        /// Offending value as written.
        id: String,
    },

    /// Empty or placeholder output.
    #[error("Cluster {cluster} example {example}: output_full is missing or placeholder.")]
    OutputMissing {
        /// Cluster position.
        cluster: usize,
        /// Example position.
        example: usize,
    },

    /// Explanation exists but the excerpt does not use it.
    #[error("Cluster {cluster} example {example}: explanation_excerpt must use judge explanation.")]
    ExcerptMustUseExplanation {
        /// Cluster position.
        cluster: usize,
        /// Example position.
        example: usize,
    },

    /// No explanation exists but the excerpt is not the sentinel.
    #[error("Cluster {cluster} example {example}: explanation_excerpt must be \"No explanation provided by judge.\" when the judge gave no explanation.")]
    ExcerptMustBeSentinel {
        /// Cluster position.
        cluster: usize,
        /// Example position.
        example: usize,
    },

    /// Explanations exist but the anchor is placeholder or sentinel.
    #[error("Cluster {cluster}: explanation_anchor must use judge explanations.")]
    AnchorMustUseExplanations {
        /// Cluster position.
        cluster: usize,
    },

    /// No explanations exist but the anchor is not the sentinel.
    #[error("Cluster {cluster}: explanation_anchor must be \"No explanation provided by judge.\" when no explanations exist.")]
    AnchorMustBeSentinel {
        /// Cluster position.
        cluster: usize,
    },

    /// Empty or placeholder issue note.
    #[error("Cluster {cluster} example {example}: issue_note is missing or placeholder.")]
    IssueNote {
        /// Cluster position.
        cluster: usize,
        /// Example position.
        example: usize,
    },

    /// Example type outside `failure`/`near_fail`.
    #[error("Cluster {cluster} example {example}: example_type must be failure or near_fail (got \"{found}\").")]
    ExampleType {
        /// Cluster position.
        cluster: usize,
        /// Example position.
        example: usize,
        /// Value supplied.
        found: String,
    },

    /// Example labelled failure with an ID outside the failure set.
    #[error("Cluster {cluster} example {example}: marked failure but execution_id {id} is not in failures.")]
    NotAFailure {
        /// Cluster position.
        cluster: usize,
        /// Example position.
        example: usize,
        /// Execution ID as written.
        id: String,
    },

    /// Example labelled near_fail with an ID outside the near-fail set.
    #[error("Cluster {cluster} example {example}: marked near_fail but execution_id {id} is not in near-fails.")]
    NotANearFail {
        /// Cluster position.
        cluster: usize,
        /// Example position.
        example: usize,
        /// Execution ID as written.
        id: String,
    },

    /// Failures not assigned to any cluster.
    #[error("Not all failures are assigned to a cluster: {}.", format_ids(.ids))]
    Unassigned {
        /// Missing failure IDs, in failure order.
        ids: Vec<ExecutionId>,
    },

    /// Failures assigned more than once.
    #[error("Failures assigned to multiple clusters: {}.", format_ids(.ids))]
    DuplicateAssignment {
        /// Repeated IDs, ascending.
        ids: Vec<ExecutionId>,
    },
}

fn format_ids(ids: &[ExecutionId]) -> String {
    let joined = ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}

/// Validates drafts for one criterion.
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    evidence: &'a EvidenceSet,
    failure_ids: Vec<ExecutionId>,
    explanations: HashMap<ExecutionId, bool>,
    mode: ExplanationMode,
    example_checks: ExampleCheckPolicy,
}

impl<'a> Validator<'a> {
    /// Build a validator for a criterion's evidence.
    #[must_use]
    pub fn new(evidence: &'a EvidenceSet, example_checks: ExampleCheckPolicy) -> Self {
        Self {
            evidence,
            failure_ids: evidence.failure_ids(),
            explanations: evidence.explanation_index(),
            mode: evidence.explanation_mode(),
            example_checks,
        }
    }

    /// Explanation mode in force.
    #[must_use]
    pub const fn mode(&self) -> ExplanationMode {
        self.mode
    }

    /// Force sentinel values where no explanation can exist.
    ///
    /// Without explanations every anchor becomes the sentinel. Any example
    /// whose ID is known to lack an explanation gets the sentinel excerpt.
    pub fn normalize(&self, draft: &mut DraftPayload) {
        for cluster in &mut draft.clusters {
            if !self.mode.is_available() {
                cluster.explanation_anchor = Value::String(NO_EXPLANATION.to_string());
            }
            for example in &mut cluster.examples {
                let lacks_explanation = example
                    .id()
                    .and_then(|id| self.explanations.get(&id))
                    .is_some_and(|has| !has);
                if lacks_explanation {
                    example.explanation_excerpt = Value::String(NO_EXPLANATION.to_string());
                }
            }
        }
    }

    /// Collect every issue in a draft, in a stable order.
    #[must_use]
    pub fn check(&self, draft: &DraftPayload) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if !self.failure_ids.is_empty() && draft.clusters.is_empty() {
            issues.push(ValidationIssue::NoClusters);
        }

        let mut covered: Vec<ExecutionId> = Vec::new();
        for (idx, cluster) in draft.clusters.iter().enumerate() {
            self.check_cluster(idx + 1, cluster, &mut covered, &mut issues);
        }

        if !self.failure_ids.is_empty() {
            self.check_coverage(&covered, &mut issues);
        }

        issues
    }

    /// Validate and, if clean, convert into a typed payload.
    ///
    /// # Errors
    ///
    /// Returns the non-empty issue list when the draft is rejected.
    pub fn validate(
        &self,
        criterion: &str,
        draft: &DraftPayload,
    ) -> Result<ClusterPayload, Vec<ValidationIssue>> {
        let issues = self.check(draft);
        if !issues.is_empty() {
            return Err(issues);
        }
        Ok(self.convert(criterion, draft))
    }

    fn check_cluster(
        &self,
        position: usize,
        cluster: &DraftCluster,
        covered: &mut Vec<ExecutionId>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let name = text(&cluster.cluster_name);
        let pattern = text(&cluster.pattern);
        let anchor = text(&cluster.explanation_anchor);
        let why = text(&cluster.why_it_matters);
        let severity = text(&cluster.severity);

        if is_blank_or_placeholder(&name) {
            issues.push(ValidationIssue::ClusterName { cluster: position });
        }
        if is_blank_or_placeholder(&pattern) {
            issues.push(ValidationIssue::Pattern { cluster: position });
        }
        if anchor.is_empty() {
            issues.push(ValidationIssue::AnchorMissing { cluster: position });
        } else if self.mode.is_available() {
            if is_placeholder(&anchor) || anchor == NO_EXPLANATION {
                issues.push(ValidationIssue::AnchorMustUseExplanations { cluster: position });
            }
        } else if anchor != NO_EXPLANATION {
            issues.push(ValidationIssue::AnchorMustBeSentinel { cluster: position });
        }
        if is_blank_or_placeholder(&why) {
            issues.push(ValidationIssue::WhyItMatters { cluster: position });
        }
        if Severity::parse(&severity).is_none() {
            issues.push(ValidationIssue::Severity {
                cluster: position,
                found: severity,
            });
        }

        let raw_ids = cluster.raw_failure_ids();
        if raw_ids.is_empty() {
            issues.push(ValidationIssue::NoFailureIds { cluster: position });
        }
        for raw in raw_ids {
            match as_id(raw) {
                Some(id) => {
                    if !self.evidence.is_failure_id(id) {
                        issues.push(ValidationIssue::UnknownFailureId {
                            cluster: position,
                            id: id.to_string(),
                        });
                    }
                    covered.push(id);
                }
                None => issues.push(ValidationIssue::UnknownFailureId {
                    cluster: position,
                    id: raw.to_string(),
                }),
            }
        }

        for (idx, example) in cluster.examples.iter().enumerate() {
            self.check_example(position, idx + 1, example, issues);
        }
    }

    fn check_example(
        &self,
        cluster: usize,
        position: usize,
        example: &DraftExample,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let output = text(&example.output_full);
        let excerpt = text(&example.explanation_excerpt);
        let id = example.id();

        if is_blank_or_placeholder(&output) {
            issues.push(ValidationIssue::OutputMissing {
                cluster,
                example: position,
            });
        }

        let has_explanation = id
            .and_then(|id| self.explanations.get(&id))
            .copied()
            .unwrap_or(false);
        if has_explanation {
            if is_blank_or_placeholder(&excerpt) || excerpt == NO_EXPLANATION {
                issues.push(ValidationIssue::ExcerptMustUseExplanation {
                    cluster,
                    example: position,
                });
            }
        } else if excerpt != NO_EXPLANATION {
            issues.push(ValidationIssue::ExcerptMustBeSentinel {
                cluster,
                example: position,
            });
        }

        if !self.example_checks.applies(self.mode) {
            return;
        }

        if is_blank_or_placeholder(&text(&example.issue_note)) {
            issues.push(ValidationIssue::IssueNote {
                cluster,
                example: position,
            });
        }

        let label = text(&example.example_type);
        let shown_id = || {
            id.map_or_else(|| example.execution_id.to_string(), |id| id.to_string())
        };
        match ExampleType::parse(&label) {
            ExampleType::Failure => {
                if !id.is_some_and(|id| self.evidence.is_failure_id(id)) {
                    issues.push(ValidationIssue::NotAFailure {
                        cluster,
                        example: position,
                        id: shown_id(),
                    });
                }
            }
            ExampleType::NearFail => {
                if !id.is_some_and(|id| self.evidence.is_near_fail_id(id)) {
                    issues.push(ValidationIssue::NotANearFail {
                        cluster,
                        example: position,
                        id: shown_id(),
                    });
                }
            }
            ExampleType::Other(found) => issues.push(ValidationIssue::ExampleType {
                cluster,
                example: position,
                found,
            }),
        }
    }

    fn check_coverage(&self, covered: &[ExecutionId], issues: &mut Vec<ValidationIssue>) {
        let covered_set: HashSet<ExecutionId> = covered.iter().copied().collect();
        let missing: Vec<ExecutionId> = self
            .failure_ids
            .iter()
            .copied()
            .filter(|id| !covered_set.contains(id))
            .collect();
        if !missing.is_empty() {
            issues.push(ValidationIssue::Unassigned { ids: missing });
        }

        let mut seen = HashSet::new();
        let mut duplicates: Vec<ExecutionId> = covered
            .iter()
            .copied()
            .filter(|id| !seen.insert(*id))
            .collect();
        duplicates.sort_unstable();
        duplicates.dedup();
        if !duplicates.is_empty() {
            issues.push(ValidationIssue::DuplicateAssignment { ids: duplicates });
        }
    }

    fn convert(&self, criterion: &str, draft: &DraftPayload) -> ClusterPayload {
        let clusters = draft
            .clusters
            .iter()
            .filter_map(|cluster| {
                Some(Cluster {
                    cluster_name: text(&cluster.cluster_name),
                    severity: Severity::parse(&text(&cluster.severity))?,
                    root_cause: text(&cluster.root_cause),
                    pattern: text(&cluster.pattern),
                    explanation_anchor: text(&cluster.explanation_anchor),
                    why_it_matters: text(&cluster.why_it_matters),
                    failure_execution_ids: cluster.raw_failure_ids().iter().filter_map(as_id).collect(),
                    examples: cluster.examples.iter().map(convert_example).collect(),
                    recommendation: convert_recommendation(&cluster.recommendation),
                    prevalence_count: 0,
                    prevalence_pct: 0.0,
                    priority_rank: 0,
                })
            })
            .collect();

        let note = text(&draft.no_issue_note);
        ClusterPayload {
            criterion: criterion.to_string(),
            failures: self.failure_ids.len(),
            clusters,
            no_issue_note: (!note.is_empty()).then_some(note),
            near_fail_available: !self.evidence.near_fails().is_empty(),
        }
    }
}

fn is_blank_or_placeholder(value: &str) -> bool {
    value.is_empty() || is_placeholder(value)
}

fn convert_example(example: &DraftExample) -> Example {
    Example {
        execution_id: example.id(),
        example_type: ExampleType::parse(&text(&example.example_type)),
        // Full text is kept untrimmed; only validation trims.
        output_full: match &example.output_full {
            Value::String(s) => s.clone(),
            other => text(other),
        },
        explanation_excerpt: text(&example.explanation_excerpt),
        issue_note: text(&example.issue_note),
    }
}

fn convert_recommendation(value: &Value) -> Recommendation {
    let field = |key: &str| value.get(key).map(text).unwrap_or_default();
    Recommendation {
        kind: field("type"),
        action: field("action"),
        risk: field("risk"),
    }
}
