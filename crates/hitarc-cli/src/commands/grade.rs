//! The `hitarc grade` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Table};

use hitarc_core::grader::Grader;
use hitarc_core::report::GradeReport;
use hitarc_core::results::Submission;

use super::{load_plan, read_json};

pub fn execute(
    plan_path: PathBuf,
    responses_path: PathBuf,
    output: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let plan = load_plan(&plan_path)?;
    let submission: Submission = read_json(&responses_path, "responses")?;

    anyhow::ensure!(
        plan.items().any(|item| item.answer_key.is_some()),
        "plan {} has no answer keys; grade against the full plan, not its public view",
        plan.id
    );
    let now = Utc::now();
    if plan.is_expired(now) {
        eprintln!(
            "Warning: plan {} expired at {}",
            plan.id,
            plan.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    tracing::debug!(
        plan_id = %plan.id,
        responses = submission.responses.len(),
        "grading submission"
    );
    let grade = Grader::default().grade_plan(&plan, &submission);
    let report = GradeReport::from_grade(grade, now);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_summary(&report),
    }

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &GradeReport) {
    let mut table = Table::new();
    table.set_header(vec!["Section", "Label", "Items", "Correct", "Score"]);

    for section in &report.sections {
        let correct = section.items.iter().filter(|g| g.is_correct()).count();
        table.add_row(vec![
            Cell::new(section.code),
            Cell::new(section.code.label()),
            Cell::new(section.items.len()),
            Cell::new(correct),
            Cell::new(format!("{:.1}%", section.overall * 100.0)),
        ]);
    }

    println!("{table}");
    println!(
        "Overall: {:.1}% (verdict {})",
        report.overall * 100.0,
        report.verdict
    );
}
