//! Run input discovery and loading.

use std::path::{Path, PathBuf};

use super::types::{CriterionCatalog, CriterionDefinition, EvalRecord};
use crate::error::InputError;

/// Suffix of the slim results file.
pub const RESULTS_SUFFIX: &str = "eval_results_slim.jsonl";
/// Suffix of the run-local generation system prompt.
pub const SYSTEM_PROMPT_SUFFIX: &str = "system_prompt.md";
/// Suffix of the run-local criterion catalog.
pub const CATALOG_SUFFIX: &str = "Evals.json";

/// Locate `{run_id}_{suffix}` in `run_dir`, falling back to any `*_{suffix}`.
///
/// Fallback candidates are sorted by file name so the choice is stable.
#[must_use]
pub fn find_run_file(run_dir: &Path, run_id: &str, suffix: &str) -> Option<PathBuf> {
    let preferred = run_dir.join(format!("{run_id}_{suffix}"));
    if preferred.is_file() {
        return Some(preferred);
    }

    let pattern = format!("_{suffix}");
    let mut matches: Vec<PathBuf> = std::fs::read_dir(run_dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(&pattern))
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Resolved locations of every input a run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// Slim results JSONL.
    pub results: PathBuf,
    /// Generation system prompt.
    pub system_prompt: PathBuf,
    /// Criterion catalog.
    pub catalog: PathBuf,
    /// Product context document.
    pub product_context: PathBuf,
}

impl RunPaths {
    /// Resolve inputs for a run.
    ///
    /// Run-local files win; the system prompt and catalog fall back to
    /// `{base_dir}/prompts/`. Only the results file must be found here;
    /// the rest are checked when read.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::MissingFile`] when no results file exists.
    pub fn resolve(run_dir: &Path, run_id: &str, base_dir: &Path) -> Result<Self, InputError> {
        let results = find_run_file(run_dir, run_id, RESULTS_SUFFIX).ok_or_else(|| {
            InputError::MissingFile {
                description: "Slim eval results".to_string(),
                path: run_dir.join(format!("{run_id}_{RESULTS_SUFFIX}")),
            }
        })?;

        let system_prompt = find_run_file(run_dir, run_id, SYSTEM_PROMPT_SUFFIX)
            .unwrap_or_else(|| base_dir.join("prompts").join("system_prompt.md"));
        let catalog = find_run_file(run_dir, run_id, CATALOG_SUFFIX)
            .unwrap_or_else(|| base_dir.join("prompts").join("Evals.json"));
        let product_context = base_dir.join("context").join("feature_context.md");

        Ok(Self {
            results,
            system_prompt,
            catalog,
            product_context,
        })
    }
}

/// Everything loaded from disk for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInputs {
    /// Executions with their judgments.
    pub records: Vec<EvalRecord>,
    /// Criterion definitions.
    pub catalog: CriterionCatalog,
    /// Generation system prompt text.
    pub system_prompt: String,
    /// Product context text.
    pub product_context: String,
}

impl RunInputs {
    /// Load all inputs. Any missing or malformed file is fatal.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] naming the offending file.
    pub async fn load(paths: &RunPaths) -> Result<Self, InputError> {
        let records = load_jsonl(&paths.results).await?;
        let catalog = load_catalog(&paths.catalog).await?;
        let system_prompt = read_required(&paths.system_prompt, "System prompt").await?;
        let product_context = read_required(&paths.product_context, "Product context").await?;

        tracing::info!(
            records = records.len(),
            criteria = catalog.len(),
            results = %paths.results.display(),
            "Loaded run inputs"
        );

        Ok(Self {
            records,
            catalog,
            system_prompt,
            product_context,
        })
    }
}

/// Read a required text file.
///
/// # Errors
///
/// [`InputError::MissingFile`] if it does not exist, [`InputError::Io`] otherwise.
pub async fn read_required(path: &Path, description: &str) -> Result<String, InputError> {
    tokio::fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            InputError::MissingFile {
                description: description.to_string(),
                path: path.to_path_buf(),
            }
        } else {
            InputError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Load a slim results JSONL file.
///
/// # Errors
///
/// Returns [`InputError`] if the file is missing or any line is malformed.
pub async fn load_jsonl(path: &Path) -> Result<Vec<EvalRecord>, InputError> {
    let text = read_required(path, "Slim eval results").await?;
    parse_jsonl(&text, path)
}

/// Parse JSONL text, skipping blank lines.
///
/// # Errors
///
/// Returns [`InputError::MalformedRecord`] with the 1-based line number.
pub fn parse_jsonl(text: &str, path: &Path) -> Result<Vec<EvalRecord>, InputError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| InputError::MalformedRecord {
                path: path.to_path_buf(),
                line: idx + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Load the criterion catalog (a JSON array of definitions).
///
/// # Errors
///
/// Returns [`InputError`] if the file is missing or not a definition array.
pub async fn load_catalog(path: &Path) -> Result<CriterionCatalog, InputError> {
    let text = read_required(path, "Criterion catalog").await?;
    let definitions: Vec<CriterionDefinition> =
        serde_json::from_str(&text).map_err(|e| InputError::MalformedCatalog {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(CriterionCatalog::new(definitions))
}
