//! Eval Meta-Analysis
//!
//! Turns LLM-as-judge pass/fail judgments into a prioritized,
//! evidence-backed report of failure clusters per evaluation criterion.
//!
//! # Features
//!
//! - Per-criterion statistics and failure / near-fail selection
//! - Model-driven clustering with strict structural validation
//! - Bounded repair loop that re-prompts with enumerated errors
//! - Deterministic prevalence and priority metrics
//! - Reproducible markdown report rendering
//!
//! # Quick Start
//!
//! ```bash
//! OPENAI_API_KEY=sk-xxx ./eval-meta-analysis \
//!     --run-dir runs/07 --run-id 07 --output-path runs/07/07_meta_analysis_report.md
//! ```
//!
//! # Architecture
//!
//! ```text
//! slim results ─┐
//! catalog ──────┼─▶ evaluation ─▶ clusters::ClusterEngine ◀──▶ backend (chat completions)
//! prompts ──────┘        │                 │
//!                        ▼                 ▼
//!                   statistics ──▶ report ◀── metrics + backfill
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod clusters;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod traits;

#[cfg(test)]
mod test_utils;
