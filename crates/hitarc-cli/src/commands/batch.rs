//! The `hitarc batch` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use hitarc_core::config::load_config_from;
use hitarc_core::engine::{BatchConfig, BatchEngine, ProgressReporter};
use hitarc_core::grader::Grader;

use super::write_json;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_job_start(&self, label: &str) {
        eprintln!("  Starting: {label}");
    }

    fn on_job_complete(&self, label: &str, elapsed: Duration) {
        eprintln!("  Done: {label} ({}ms)", elapsed.as_millis());
    }

    fn on_job_error(&self, label: &str, error: &str) {
        eprintln!("  ERROR: {label}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} succeeded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    seeds: Option<String>,
    count: Option<usize>,
    prefix: String,
    parallelism: Option<usize>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let seeds: Vec<String> = match (seeds, count) {
        (Some(list), _) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        (None, Some(n)) => (1..=n).map(|i| format!("{prefix}-{i}")).collect(),
        (None, None) => anyhow::bail!("pass --seeds or --count"),
    };
    anyhow::ensure!(!seeds.is_empty(), "no seeds given");

    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    let engine = BatchEngine::new(
        Arc::new(config.load_banks()?),
        Grader::default(),
        BatchConfig {
            parallelism,
            plan_options: config.plan_options(),
        },
    );

    eprintln!(
        "hitarc v{} - Generating {} plans ({} at a time)",
        env!("CARGO_PKG_VERSION"),
        seeds.len(),
        parallelism
    );
    let outcome = engine
        .generate_plans(&seeds, Utc::now(), &ConsoleReporter)
        .await?;

    tracing::debug!(output = %output.display(), "writing plans");
    std::fs::create_dir_all(&output)?;
    for plan in &outcome.results {
        let path = output.join(format!("plan-{}.json", sanitize(&plan.seed)));
        write_json(&path, plan)?;
    }
    eprintln!(
        "{} plan(s) written to {}",
        outcome.results.len(),
        output.display()
    );

    anyhow::ensure!(
        outcome.failures.is_empty(),
        "{} seed(s) failed",
        outcome.failures.len()
    );
    Ok(())
}

/// Seeds are free text; keep file names portable.
fn sanitize(seed: &str) -> String {
    seed.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
