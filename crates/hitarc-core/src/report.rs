//! Grade reports with JSON persistence and regression detection.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::SectionCode;
use crate::results::{PlanGrade, SectionGrade};
use crate::statistics::VerdictBand;

/// A persisted grading outcome for one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// Plan the submission was graded against.
    pub plan_id: Uuid,
    pub seed: String,
    pub created_at: DateTime<Utc>,
    pub sections: Vec<SectionGrade>,
    pub overall: f64,
    pub verdict: VerdictBand,
}

impl GradeReport {
    /// Wrap a plan grade in a new report stamped at `now`.
    pub fn from_grade(grade: PlanGrade, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan_id: grade.plan_id,
            seed: grade.seed,
            created_at: now,
            sections: grade.sections,
            overall: grade.overall,
            verdict: grade.verdict,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Load every `*.json` report in a directory, sorted by file name.
    ///
    /// Files that do not parse as reports are skipped with a warning.
    pub fn load_directory(dir: &Path) -> Result<Vec<Self>> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read report directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut reports = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::load_json(&path) {
                Ok(report) => reports.push(report),
                Err(e) => tracing::warn!("skipping {}: {e:#}", path.display()),
            }
        }
        Ok(reports)
    }

    pub fn section(&self, code: SectionCode) -> Option<&SectionGrade> {
        self.sections.iter().find(|s| s.code == code)
    }

    /// Compare this report against a baseline, section by section.
    pub fn compare(&self, baseline: &GradeReport, threshold: f64) -> RegressionReport {
        let scores = |report: &GradeReport| -> BTreeMap<SectionCode, f64> {
            report.sections.iter().map(|s| (s.code, s.overall)).collect()
        };
        let baseline_scores = scores(baseline);
        let current_scores = scores(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_sections = 0usize;

        for (&code, &current) in &current_scores {
            let Some(&baseline_score) = baseline_scores.get(&code) else {
                new_sections += 1;
                continue;
            };
            let delta = current - baseline_score;
            let change = SectionChange {
                code,
                baseline_score,
                current_score: current,
                delta,
            };
            if delta < -threshold {
                regressions.push(change);
            } else if delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_sections = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(k))
            .count();

        RegressionReport {
            overall_delta: self.overall - baseline.overall,
            regressions,
            improvements,
            unchanged,
            new_sections,
            removed_sections,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    pub overall_delta: f64,
    /// Sections whose score went down by more than the threshold.
    pub regressions: Vec<SectionChange>,
    /// Sections whose score went up by more than the threshold.
    pub improvements: Vec<SectionChange>,
    pub unchanged: usize,
    /// Sections in current but not baseline.
    pub new_sections: usize,
    /// Sections in baseline but not current.
    pub removed_sections: usize,
}

/// A section score that moved between two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionChange {
    pub code: SectionCode,
    pub baseline_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

impl RegressionReport {
    /// Format the regression report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged (overall {:+.1}%)\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.overall_delta * 100.0
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Section | Baseline | Current | Delta |\n");
            md.push_str("|---------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} ({}) | {:.1}% | {:.1}% | {:+.1}% |\n",
                    c.code,
                    c.code.label(),
                    c.baseline_score * 100.0,
                    c.current_score * 100.0,
                    c.delta * 100.0
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
