//! Prompt templates.
//!
//! - [`cluster_prompt`]: the per-criterion clustering request
//! - [`repair_prompt`]: follow-up request listing validation errors
//! - [`SYSTEM_INSTRUCTION`]: system message sent with every request
//!
//! # Example
//!
//! ```
//! use eval_meta_analysis::prompts::repair_prompt;
//!
//! let prompt = repair_prompt("Cluster these.", "{}", &["Cluster name is missing or placeholder."]);
//! assert!(prompt.starts_with("Your previous JSON did not meet requirements."));
//! ```

mod cluster;
mod repair;

pub use cluster::{cluster_prompt, explanation_note, PromptContext};
pub use repair::repair_prompt;

/// System instruction constraining output to bare JSON.
pub const SYSTEM_INSTRUCTION: &str = "Return only JSON. No markdown.";
