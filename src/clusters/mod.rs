//! Cluster Validation & Repair Engine and post-acceptance processing.
//!
//! # Architecture
//!
//! - [`types`]: lenient drafts decoded from model output and the typed
//!   payload they become once accepted
//! - [`json`]: JSON recovery from free-form response text
//! - [`validate`]: sentinel normalization and the invariant checks
//! - [`engine`]: the request/validate/repair state machine
//! - [`metrics`]: prevalence, priority ranking and example backfill
//!
//! # Example
//!
//! ```
//! use eval_meta_analysis::clusters::{is_placeholder, Severity};
//!
//! assert!(is_placeholder("  Short, Specific "));
//! assert_eq!(Severity::High.weight(), 3);
//! ```

pub mod engine;
pub mod json;
pub mod metrics;
pub mod types;
pub mod validate;

pub use engine::{
    ClusterEngine, ClusterOutcome, EngineConfig, EngineState, RejectedAttempt,
    DEFAULT_MAX_ATTEMPTS,
};
pub use json::{extract_json, parse_draft};
pub use metrics::{
    apply_cluster_metrics, ensure_cluster_examples, rank_all_clusters, top_issues, RankedIssue,
    TARGET_EXAMPLES, TOP_ISSUES,
};
pub use types::{
    is_placeholder, Cluster, ClusterPayload, DraftCluster, DraftExample, DraftPayload, Example,
    ExampleType, Recommendation, Severity, NO_EXPLANATION, NO_FAILURES_NOTE, PLACEHOLDER_VALUES,
    SUPPLEMENTAL_NOTE,
};
pub use validate::{ExampleCheckPolicy, ValidationIssue, Validator};
