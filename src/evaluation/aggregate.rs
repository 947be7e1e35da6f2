//! Entry Aggregator: per-criterion statistics and entry grouping.

use indexmap::IndexMap;

use super::types::{CriterionStats, EvalRecord, EvaluationEntry};

/// Compute statistics for every criterion judged in the first record.
///
/// Criteria appear in the order of the first record's judgments.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_stats(records: &[EvalRecord]) -> IndexMap<String, CriterionStats> {
    let Some(first) = records.first() else {
        return IndexMap::new();
    };

    let mut stats = IndexMap::new();
    for criterion in first.evals.iter().map(|j| j.eval_name.as_str()) {
        if stats.contains_key(criterion) {
            continue;
        }

        let mut score_sum = 0.0;
        let mut scored = 0_usize;
        let mut passed = 0_usize;
        let mut total = 0_usize;

        for judgment in records
            .iter()
            .flat_map(|r| r.evals.iter())
            .filter(|j| j.eval_name == criterion)
        {
            if let Some(score) = judgment.score {
                score_sum += score;
                scored += 1;
            }
            if judgment.passed == Some(true) {
                passed += 1;
            }
            total += 1;
        }

        let avg_score = if scored == 0 {
            0.0
        } else {
            score_sum / scored as f64
        };
        let pass_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        };

        stats.insert(
            criterion.to_string(),
            CriterionStats {
                avg_score,
                pass_rate,
                failures: total - passed,
                total,
            },
        );
    }
    stats
}

/// Group judgments into entries per criterion, preserving execution order.
///
/// Criteria appear in order of first occurrence across all records.
#[must_use]
pub fn collect_entries(records: &[EvalRecord]) -> IndexMap<String, Vec<EvaluationEntry>> {
    let mut entries: IndexMap<String, Vec<EvaluationEntry>> = IndexMap::new();
    for record in records {
        for judgment in &record.evals {
            entries
                .entry(judgment.eval_name.clone())
                .or_default()
                .push(EvaluationEntry::from_judgment(record, judgment));
        }
    }
    entries
}
