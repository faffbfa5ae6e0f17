//! The `hitarc stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use hitarc_core::report::GradeReport;
use hitarc_core::statistics::{compute_cohort_stats, CohortStats, HISTOGRAM_BUCKETS};

pub fn execute(reports_dir: PathBuf, format: String) -> Result<()> {
    anyhow::ensure!(
        reports_dir.is_dir(),
        "not a directory: {}",
        reports_dir.display()
    );
    let reports = GradeReport::load_directory(&reports_dir)?;
    anyhow::ensure!(
        !reports.is_empty(),
        "no grade reports found in {}",
        reports_dir.display()
    );

    let stats = compute_cohort_stats(&reports);
    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => print_stats(&stats),
    }
    Ok(())
}

fn print_stats(stats: &CohortStats) {
    println!(
        "Reports: {}  Mean overall: {:.1}%",
        stats.reports,
        stats.mean_overall * 100.0
    );

    let mut sections = Table::new();
    sections.set_header(vec!["Section", "Label", "Attempts", "Mean", "Min", "Max"]);
    for summary in stats.per_section.values() {
        sections.add_row(vec![
            Cell::new(summary.code),
            Cell::new(summary.code.label()),
            Cell::new(summary.attempts),
            Cell::new(format!("{:.1}%", summary.mean * 100.0)),
            Cell::new(format!("{:.1}%", summary.min * 100.0)),
            Cell::new(format!("{:.1}%", summary.max * 100.0)),
        ]);
    }
    println!("\n{sections}");

    if let (Some(weak), Some(strong)) = (stats.weakest_section, stats.strongest_section) {
        println!("Weakest: {weak} ({})  Strongest: {strong} ({})", weak.label(), strong.label());
    }

    let mut distribution = Table::new();
    distribution.set_header(vec!["Range", "Reports"]);
    for (bucket, count) in stats.histogram.iter().enumerate() {
        let low = bucket * 100 / HISTOGRAM_BUCKETS;
        let high = (bucket + 1) * 100 / HISTOGRAM_BUCKETS;
        distribution.add_row(vec![Cell::new(format!("{low}-{high}%")), Cell::new(count)]);
    }
    println!("\n{distribution}");

    let verdicts: Vec<String> = stats
        .verdicts
        .iter()
        .map(|(band, count)| format!("{band}: {count}"))
        .collect();
    println!("Verdicts: {}", verdicts.join(", "));

    let mut kinds = Table::new();
    kinds.set_header(vec!["Item kind", "Mean correctness"]);
    for (kind, mean) in &stats.per_kind {
        kinds.add_row(vec![Cell::new(kind), Cell::new(format!("{:.1}%", mean * 100.0))]);
    }
    println!("\n{kinds}");
}
