//! Eval meta-analysis binary entry point.
//!
//! Reads one evaluation run, clusters each criterion's failures through the
//! generation backend, and writes a markdown report. All logs go to stderr;
//! stdout carries only the final "report saved" line.
//!
//! Coverage is excluded because the main function needs a live backend.

// Enable the coverage attribute when running with nightly for llvm-cov exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::path::PathBuf;

use clap::Parser;

use eval_meta_analysis::backend::OpenAiClient;
use eval_meta_analysis::clusters::{ClusterEngine, EngineConfig, ExampleCheckPolicy};
use eval_meta_analysis::config::Config;
use eval_meta_analysis::error::AppError;
use eval_meta_analysis::pipeline::{MetaAnalysis, RunOptions};
use eval_meta_analysis::traits::RealTimeProvider;

/// Generate a meta-analysis report.
#[derive(Debug, Parser)]
#[command(name = "eval-meta-analysis", version, about)]
struct Args {
    /// Run directory path.
    #[arg(long)]
    run_dir: PathBuf,

    /// Run ID used as the file name prefix.
    #[arg(long)]
    run_id: String,

    /// Path to write the meta-analysis report markdown.
    #[arg(long)]
    output_path: PathBuf,

    /// Model used for clustering (overrides META_ANALYSIS_MODEL).
    #[arg(long)]
    model: Option<String>,

    /// Project root holding prompts/ and context/.
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// When to enforce example checks: always | without-explanations.
    #[arg(long, default_value = "without-explanations")]
    example_checks: ExampleCheckPolicy,
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Config first so a LOG_LEVEL from .env reaches the filter
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize logging to stderr only (stdout is for the result line)
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    match run(args, config).await {
        Ok(path) => println!("Meta-analysis report saved to {}", path.display()),
        Err(e) => {
            tracing::error!("Meta-analysis failed: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
async fn run(args: Args, mut config: Config) -> Result<PathBuf, AppError> {
    if let Some(model) = args.model {
        config = config.with_model(model);
    }

    tracing::info!(
        model = %config.model,
        base_url = %config.base_url,
        timeout_ms = config.request_timeout_ms,
        "Configuration loaded"
    );

    let client = OpenAiClient::from_config(&config)?;
    let engine_config =
        EngineConfig::new(config.model.clone()).with_example_checks(args.example_checks);
    let analysis = MetaAnalysis::new(ClusterEngine::new(client, engine_config), RealTimeProvider);

    let options = RunOptions::new(args.run_dir, args.run_id, args.output_path)
        .with_base_dir(args.base_dir);
    analysis.run(&options).await
}
