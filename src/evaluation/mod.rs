//! Evaluation inputs and their first two processing stages.
//!
//! - [`types`]: slim results records, catalog definitions, flattened entries
//! - [`loader`]: run file discovery and fatal-on-error loading
//! - [`aggregate`]: per-criterion statistics and entry grouping
//! - [`select`]: failure and near-fail partitioning

pub mod aggregate;
pub mod loader;
pub mod select;
pub mod types;

pub use aggregate::{collect_entries, compute_stats};
pub use loader::{find_run_file, RunInputs, RunPaths};
pub use select::{EvidenceSet, ExplanationMode, NEAR_FAIL_LIMIT};
pub use types::{
    CriterionCatalog, CriterionDefinition, CriterionStats, EvalJudgment, EvalRecord,
    EvaluationEntry, ExecutionId,
};
