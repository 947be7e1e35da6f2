//! One meta-analysis run, from files on disk to a written report.
//!
//! Criteria are processed strictly one at a time. A criterion whose
//! clustering cannot be validated aborts the whole run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use indexmap::IndexMap;

use crate::clusters::{
    apply_cluster_metrics, ensure_cluster_examples, ClusterEngine, ClusterPayload,
    TARGET_EXAMPLES,
};
use crate::error::{AppError, EngineError, InputError};
use crate::evaluation::{collect_entries, compute_stats, EvidenceSet, RunInputs, RunPaths};
use crate::prompts::PromptContext;
use crate::report::render_markdown;
use crate::traits::{GenerationBackend, TimeProvider};

/// Where to read a run from and where to write its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Directory holding the run's files.
    pub run_dir: PathBuf,
    /// Run identifier used as the file name prefix.
    pub run_id: String,
    /// Report destination.
    pub output_path: PathBuf,
    /// Project root holding `prompts/` and `context/` fallbacks.
    pub base_dir: PathBuf,
}

impl RunOptions {
    /// Create options with `base_dir` set to the current directory.
    #[must_use]
    pub fn new(
        run_dir: impl Into<PathBuf>,
        run_id: impl Into<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            run_dir: run_dir.into(),
            run_id: run_id.into(),
            output_path: output_path.into(),
            base_dir: PathBuf::from("."),
        }
    }

    /// Override the project root.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }
}

/// Meta-analysis over a generation backend and a clock.
///
/// # Example
///
/// ```ignore
/// use eval_meta_analysis::pipeline::{MetaAnalysis, RunOptions};
///
/// let analysis = MetaAnalysis::new(engine, RealTimeProvider);
/// let path = analysis.run(&RunOptions::new("runs/07", "07", "report.md")).await?;
/// ```
#[derive(Debug)]
pub struct MetaAnalysis<B, T>
where
    B: GenerationBackend,
    T: TimeProvider,
{
    engine: ClusterEngine<B>,
    clock: T,
}

impl<B, T> MetaAnalysis<B, T>
where
    B: GenerationBackend,
    T: TimeProvider,
{
    /// Create a pipeline.
    #[must_use]
    pub const fn new(engine: ClusterEngine<B>, clock: T) -> Self {
        Self { engine, clock }
    }

    /// Load a run, analyze every criterion, and write the report.
    ///
    /// Returns the path the report was written to.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Input`] for missing or malformed inputs or a failed
    /// write, and [`AppError::Engine`] if any criterion fails clustering.
    pub async fn run(&self, options: &RunOptions) -> Result<PathBuf, AppError> {
        let start = Instant::now();
        let paths = RunPaths::resolve(&options.run_dir, &options.run_id, &options.base_dir)?;
        let inputs = RunInputs::load(&paths).await?;

        let report = self.build_report(&inputs).await?;
        write_report(&options.output_path, &report).await?;

        tracing::info!(
            run_id = %options.run_id,
            output = %options.output_path.display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Meta-analysis complete"
        );
        Ok(options.output_path.clone())
    }

    /// Analyze already loaded inputs and render the report text.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Engine`] if any criterion fails clustering.
    pub async fn build_report(&self, inputs: &RunInputs) -> Result<String, AppError> {
        let stats = compute_stats(&inputs.records);
        let cluster_sets = self.analyze_criteria(inputs).await?;
        Ok(render_markdown(&stats, &cluster_sets, self.clock.now()))
    }

    /// Cluster every criterion in entry order.
    ///
    /// # Errors
    ///
    /// Returns the first [`EngineError`]; later criteria are not attempted.
    pub async fn analyze_criteria(
        &self,
        inputs: &RunInputs,
    ) -> Result<IndexMap<String, ClusterPayload>, EngineError> {
        let entries = collect_entries(&inputs.records);
        let mut cluster_sets = IndexMap::with_capacity(entries.len());

        for (criterion, criterion_entries) in &entries {
            let evidence = EvidenceSet::select(criterion_entries);
            let ctx = PromptContext {
                criterion,
                definition: inputs.catalog.get(criterion),
                evidence: &evidence,
                product_context: &inputs.product_context,
                system_prompt: &inputs.system_prompt,
            };

            let outcome = self.engine.analyze(&ctx).await.inspect_err(|e| {
                tracing::error!(criterion = %criterion, error = %e, "Criterion analysis failed");
            })?;

            let mut payload = outcome.payload;
            if !payload.clusters.is_empty() {
                apply_cluster_metrics(&mut payload);
                ensure_cluster_examples(&mut payload, &evidence, TARGET_EXAMPLES);
            }

            tracing::info!(
                criterion = %criterion,
                failures = payload.failures,
                clusters = payload.clusters.len(),
                attempts = outcome.attempts,
                "Criterion analyzed"
            );
            cluster_sets.insert(criterion.clone(), payload);
        }

        Ok(cluster_sets)
    }
}

async fn write_report(path: &Path, report: &str) -> Result<(), InputError> {
    tokio::fs::write(path, report)
        .await
        .map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })
}
