//! Markdown report rendering.
//!
//! Rendering is a pure function of its inputs. The generation date is
//! passed in (see [`crate::traits::TimeProvider`]) so output is
//! byte-identical for identical inputs.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::clusters::{top_issues, Cluster, ClusterPayload};
use crate::evaluation::CriterionStats;

/// Note shown for a criterion with no clusters and no note of its own.
pub const DEFAULT_NO_ISSUE_NOTE: &str = "No issues found for this criterion.";

/// Render the overall statistics table; empty when there are no criteria.
#[must_use]
pub fn stats_table(stats: &IndexMap<String, CriterionStats>) -> String {
    if stats.is_empty() {
        return String::new();
    }
    let mut lines = vec![
        "| Criterion | Avg Score | Pass Rate | Failures |".to_string(),
        "|---|---|---|---|".to_string(),
    ];
    lines.extend(stats.iter().map(|(name, s)| {
        format!(
            "| {name} | {:.2} | {:.1}% | {} |",
            s.avg_score,
            s.pass_rate * 100.0,
            s.failures
        )
    }));
    lines.join("\n")
}

/// Render the full report.
///
/// `stats` drives the statistics table and execution count; `payloads`
/// drives the summary and per-criterion sections, in their own order.
#[must_use]
pub fn render_markdown(
    stats: &IndexMap<String, CriterionStats>,
    payloads: &IndexMap<String, ClusterPayload>,
    generated: DateTime<Utc>,
) -> String {
    let total_executions = stats.values().next().map_or(0, |s| s.total);

    let mut lines = vec![
        "# Meta-Analysis Report".to_string(),
        format!("*Generated: {}*  ", generated.format("%Y-%m-%d")),
        format!("*Eval Run: {total_executions} executions*"),
        String::new(),
        "## Executive Summary".to_string(),
    ];

    let top = top_issues(payloads);
    if top.is_empty() {
        lines.push("- No failures detected across criteria.".to_string());
    }
    for issue in &top {
        lines.push(format!(
            "- **{}** ({}): {} failures, severity {}",
            issue.cluster.cluster_name,
            issue.criterion,
            issue.cluster.prevalence_count,
            issue.cluster.severity
        ));
    }

    lines.extend([
        String::new(),
        "## Overall Statistics".to_string(),
        stats_table(stats),
        String::new(),
        "## Criterion Analysis".to_string(),
    ]);

    for (criterion, payload) in payloads {
        let s = stats.get(criterion).copied().unwrap_or_default();
        lines.push(format!("### {criterion}"));
        lines.push(format!(
            "**Pass Rate**: {:.1}% | **Avg Score**: {:.2} | **Failures**: {}",
            s.pass_rate * 100.0,
            s.avg_score,
            s.failures
        ));

        if payload.clusters.is_empty() {
            lines.push(String::new());
            lines.push(
                payload
                    .no_issue_note
                    .clone()
                    .unwrap_or_else(|| DEFAULT_NO_ISSUE_NOTE.to_string()),
            );
            lines.push(String::new());
            continue;
        }

        for cluster in &payload.clusters {
            render_cluster(&mut lines, cluster, payload.near_fail_available);
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn render_cluster(lines: &mut Vec<String>, cluster: &Cluster, near_fail_available: bool) {
    lines.push(String::new());
    lines.push(format!(
        "#### {}. {} ({:.1}% of failures)",
        cluster.priority_rank, cluster.cluster_name, cluster.prevalence_pct
    ));
    lines.push(format!("- **Severity**: {}", cluster.severity));
    lines.push(format!("- **Root Cause**: {}", cluster.root_cause));
    lines.push(format!("- **Pattern**: {}", cluster.pattern));
    lines.push(format!("- **Explanation Signal**: {}", cluster.explanation_anchor));
    lines.push(format!("- **Why It Matters**: {}", cluster.why_it_matters));
    lines.push("- **Examples**:".to_string());

    for example in &cluster.examples {
        let id = example
            .execution_id
            .map_or_else(|| "unknown".to_string(), |id| id.to_string());
        lines.push(format!("  - Exec #{id} ({})", example.example_type));
        lines.push("    - Output:".to_string());
        lines.push("      ```".to_string());
        lines.push(example.output_full.clone());
        lines.push("      ```".to_string());
        lines.push(format!("    - Explanation: {}", example.explanation_excerpt));
        lines.push(format!("    - Issue: {}", example.issue_note));
    }

    if !cluster.has_near_fail_example() && !near_fail_available {
        lines.push("- **Near-fail evidence**: None available (no borderline passes).".to_string());
    }
    lines.push(format!("- **Recommendation**: {}", cluster.recommendation.action));
    lines.push(format!("- **Risk**: {}", cluster.recommendation.risk));
}
