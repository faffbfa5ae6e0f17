//! The `hitarc compare` command.

use std::path::PathBuf;

use anyhow::Result;

use hitarc_core::config::load_config;
use hitarc_core::report::GradeReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: Option<f64>,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let threshold = match threshold {
        Some(t) => t,
        None => load_config()?.regression_threshold,
    };
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = GradeReport::load_json(&baseline_path)?;
    let current = GradeReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged (overall {:+.1}%)",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged,
                report.overall_delta * 100.0
            );

            for (title, changes) in [
                ("Regressions", &report.regressions),
                ("Improvements", &report.improvements),
            ] {
                if changes.is_empty() {
                    continue;
                }
                println!("\n{title}:");
                for c in changes {
                    println!(
                        "  {} {} {:.1}% -> {:.1}% ({:+.1}%)",
                        c.code,
                        c.code.label(),
                        c.baseline_score * 100.0,
                        c.current_score * 100.0,
                        c.delta * 100.0
                    );
                }
            }

            if report.new_sections > 0 {
                println!("\n{} new section(s)", report.new_sections);
            }
            if report.removed_sections > 0 {
                println!("{} removed section(s)", report.removed_sections);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
