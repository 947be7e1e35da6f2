//! Metrics, ranking and example backfill for accepted payloads.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::types::{Cluster, ClusterPayload, Example, ExampleType, NO_EXPLANATION, SUPPLEMENTAL_NOTE};
use crate::evaluation::{EvaluationEntry, EvidenceSet};

/// Number of cross-criterion issues in the executive summary.
pub const TOP_ISSUES: usize = 5;

/// Examples each cluster should show.
pub const TARGET_EXAMPLES: usize = 3;

/// Annotate prevalence and order clusters by priority.
///
/// Clusters are stably sorted by severity weight, then prevalence count,
/// both descending; `priority_rank` is the 1-based position afterwards.
#[allow(clippy::cast_precision_loss)]
pub fn apply_cluster_metrics(payload: &mut ClusterPayload) {
    let total = payload.failures;
    for cluster in &mut payload.clusters {
        cluster.prevalence_count = cluster.failure_execution_ids.len();
        cluster.prevalence_pct = if total == 0 {
            0.0
        } else {
            round_one_decimal(cluster.prevalence_count as f64 / total as f64 * 100.0)
        };
    }

    payload.clusters.sort_by(|a, b| {
        (b.severity.weight(), b.prevalence_count).cmp(&(a.severity.weight(), a.prevalence_count))
    });

    for (idx, cluster) in payload.clusters.iter_mut().enumerate() {
        cluster.priority_rank = idx + 1;
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// A cluster placed in the cross-criterion ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedIssue<'a> {
    /// Owning criterion.
    pub criterion: &'a str,
    /// The cluster.
    pub cluster: &'a Cluster,
    /// Severity weight × prevalence count.
    pub priority_score: usize,
}

/// Rank every cluster across criteria by `severity weight × prevalence`.
///
/// The sort is stable: ties keep criterion order, then cluster order.
#[must_use]
pub fn rank_all_clusters(payloads: &IndexMap<String, ClusterPayload>) -> Vec<RankedIssue<'_>> {
    let mut ranked: Vec<RankedIssue<'_>> = payloads
        .iter()
        .flat_map(|(criterion, payload)| {
            payload.clusters.iter().map(move |cluster| RankedIssue {
                criterion: criterion.as_str(),
                cluster,
                priority_score: cluster.severity.weight() * cluster.prevalence_count,
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
    ranked
}

/// The first [`TOP_ISSUES`] entries of [`rank_all_clusters`].
#[must_use]
pub fn top_issues(payloads: &IndexMap<String, ClusterPayload>) -> Vec<RankedIssue<'_>> {
    let mut ranked = rank_all_clusters(payloads);
    ranked.truncate(TOP_ISSUES);
    ranked
}

/// Top up each cluster to `target` examples from local evidence.
///
/// The cluster's own unused failures are appended first, in assignment
/// order, then unused near-fails. Existing examples are never touched, so
/// running this on a full cluster is a no-op.
pub fn ensure_cluster_examples(payload: &mut ClusterPayload, evidence: &EvidenceSet, target: usize) {
    for cluster in &mut payload.clusters {
        let mut used: HashSet<_> = cluster.examples.iter().filter_map(|e| e.execution_id).collect();

        let own_failures: Vec<&EvaluationEntry> = cluster
            .failure_execution_ids
            .iter()
            .filter_map(|id| evidence.failure(*id))
            .collect();
        let candidates = own_failures
            .into_iter()
            .map(|entry| (entry, ExampleType::Failure))
            .chain(
                evidence
                    .near_fails()
                    .iter()
                    .map(|entry| (entry, ExampleType::NearFail)),
            );

        for (entry, example_type) in candidates {
            if cluster.examples.len() >= target {
                break;
            }
            if !used.insert(entry.execution_id) {
                continue;
            }
            cluster.examples.push(supplemental_example(entry, example_type));
        }
    }
}

fn supplemental_example(entry: &EvaluationEntry, example_type: ExampleType) -> Example {
    Example {
        execution_id: Some(entry.execution_id),
        example_type,
        output_full: entry.output.clone(),
        explanation_excerpt: if entry.has_explanation() {
            entry.explanation.clone()
        } else {
            NO_EXPLANATION.to_string()
        },
        issue_note: SUPPLEMENTAL_NOTE.to_string(),
    }
}
