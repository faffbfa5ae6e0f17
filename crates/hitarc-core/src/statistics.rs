//! Score aggregation, verdict bands and cohort statistics.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{ItemKind, SectionCode};
use crate::report::GradeReport;

/// Number of buckets in the overall-score histogram.
pub const HISTOGRAM_BUCKETS: usize = 10;

/// Letter band for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerdictBand {
    A,
    B,
    C,
    D,
    F,
}

impl VerdictBand {
    pub const ALL: [VerdictBand; 5] = [
        VerdictBand::A,
        VerdictBand::B,
        VerdictBand::C,
        VerdictBand::D,
        VerdictBand::F,
    ];

    /// A ≥ 0.8, B ≥ 0.6, C ≥ 0.4, D ≥ 0.2, otherwise F.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.8 => VerdictBand::A,
            s if s >= 0.6 => VerdictBand::B,
            s if s >= 0.4 => VerdictBand::C,
            s if s >= 0.2 => VerdictBand::D,
            _ => VerdictBand::F,
        }
    }
}

impl fmt::Display for VerdictBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            VerdictBand::A => "A",
            VerdictBand::B => "B",
            VerdictBand::C => "C",
            VerdictBand::D => "D",
            VerdictBand::F => "F",
        };
        write!(f, "{letter}")
    }
}

/// One section's correctness, as fed into [`aggregate_scores`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    pub code: SectionCode,
    pub correctness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedScore {
    /// Mean of the clamped section scores; 0 when there are none.
    pub overall: f64,
    pub sections: Vec<SectionScore>,
}

/// Clamp every section score to `[0, 1]` and average them.
pub fn aggregate_scores(inputs: &[SectionScore]) -> AggregatedScore {
    if inputs.is_empty() {
        return AggregatedScore {
            overall: 0.0,
            sections: Vec::new(),
        };
    }
    let sections: Vec<SectionScore> = inputs
        .iter()
        .map(|s| SectionScore {
            code: s.code,
            correctness: clamp_unit(s.correctness),
        })
        .collect();
    let overall = sections.iter().map(|s| s.correctness).sum::<f64>() / sections.len() as f64;
    AggregatedScore { overall, sections }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Histogram bucket for a score: `[0, 0.1)` is 0, …, `[0.9, 1]` is 9.
pub fn histogram_bucket(score: f64) -> usize {
    ((clamp_unit(score) * HISTOGRAM_BUCKETS as f64).floor() as usize).min(HISTOGRAM_BUCKETS - 1)
}

/// Summary of one section across a cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub code: SectionCode,
    pub attempts: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Statistics over many grade reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    pub reports: usize,
    pub mean_overall: f64,
    pub per_section: BTreeMap<SectionCode, SectionSummary>,
    /// Count of reports per overall-score decile.
    pub histogram: [usize; HISTOGRAM_BUCKETS],
    pub verdicts: BTreeMap<VerdictBand, usize>,
    pub weakest_section: Option<SectionCode>,
    pub strongest_section: Option<SectionCode>,
    /// Mean item correctness per item kind.
    pub per_kind: BTreeMap<ItemKind, f64>,
}

/// Compute cohort statistics from a set of grade reports.
pub fn compute_cohort_stats(reports: &[GradeReport]) -> CohortStats {
    let mut histogram = [0usize; HISTOGRAM_BUCKETS];
    let mut verdicts: BTreeMap<VerdictBand, usize> = BTreeMap::new();
    let mut section_scores: BTreeMap<SectionCode, Vec<f64>> = BTreeMap::new();
    let mut kind_scores: BTreeMap<ItemKind, (f64, usize)> = BTreeMap::new();

    for report in reports {
        histogram[histogram_bucket(report.overall)] += 1;
        *verdicts.entry(report.verdict).or_default() += 1;
        for section in &report.sections {
            section_scores
                .entry(section.code)
                .or_default()
                .push(clamp_unit(section.overall));
            for item in &section.items {
                let entry = kind_scores.entry(item.kind).or_insert((0.0, 0));
                entry.0 += item.correctness;
                entry.1 += 1;
            }
        }
    }

    let per_section: BTreeMap<SectionCode, SectionSummary> = section_scores
        .into_iter()
        .map(|(code, scores)| {
            let mean = scores.iter().sum::<f64>() / scores.len().max(1) as f64;
            let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (
                code,
                SectionSummary {
                    code,
                    attempts: scores.len(),
                    mean,
                    min,
                    max,
                },
            )
        })
        .collect();

    // Ties resolve to the earliest section.
    let weakest_section = per_section
        .values()
        .fold(None::<&SectionSummary>, |best, s| match best {
            Some(b) if b.mean <= s.mean => Some(b),
            _ => Some(s),
        })
        .map(|s| s.code);
    let strongest_section = per_section
        .values()
        .fold(None::<&SectionSummary>, |best, s| match best {
            Some(b) if b.mean >= s.mean => Some(b),
            _ => Some(s),
        })
        .map(|s| s.code);

    let mean_overall = if reports.is_empty() {
        0.0
    } else {
        reports.iter().map(|r| clamp_unit(r.overall)).sum::<f64>() / reports.len() as f64
    };

    CohortStats {
        reports: reports.len(),
        mean_overall,
        per_section,
        histogram,
        verdicts,
        weakest_section,
        strongest_section,
        per_kind: kind_scores
            .into_iter()
            .map(|(kind, (sum, n))| (kind, sum / n.max(1) as f64))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{ItemGrade, SectionGrade};
    use chrono::Utc;
    use uuid::Uuid;

    fn report(sections: &[(SectionCode, f64)]) -> GradeReport {
        let sections: Vec<SectionGrade> = sections
            .iter()
            .map(|&(code, overall)| SectionGrade {
                code,
                overall,
                items: vec![ItemGrade {
                    item_id: format!("{code}-0-test"),
                    kind: if code == SectionCode::B {
                        ItemKind::Arithmetic
                    } else {
                        ItemKind::Grid
                    },
                    correctness: overall,
                    feedback: String::new(),
                    details: None,
                }],
            })
            .collect();
        let aggregate = aggregate_scores(
            &sections
                .iter()
                .map(|s| SectionScore {
                    code: s.code,
                    correctness: s.overall,
                })
                .collect::<Vec<_>>(),
        );
        GradeReport {
            id: Uuid::nil(),
            plan_id: Uuid::nil(),
            seed: "s".into(),
            created_at: Utc::now(),
            overall: aggregate.overall,
            verdict: VerdictBand::from_score(aggregate.overall),
            sections,
        }
    }

    #[test]
    fn verdict_bands() {
        assert_eq!(VerdictBand::from_score(1.0), VerdictBand::A);
        assert_eq!(VerdictBand::from_score(0.8), VerdictBand::A);
        assert_eq!(VerdictBand::from_score(0.79), VerdictBand::B);
        assert_eq!(VerdictBand::from_score(0.4), VerdictBand::C);
        assert_eq!(VerdictBand::from_score(0.2), VerdictBand::D);
        assert_eq!(VerdictBand::from_score(0.19), VerdictBand::F);
        assert_eq!(VerdictBand::from_score(f64::NAN), VerdictBand::F);
    }

    #[test]
    fn aggregate_clamps_and_averages() {
        let agg = aggregate_scores(&[
            SectionScore {
                code: SectionCode::A,
                correctness: 1.4,
            },
            SectionScore {
                code: SectionCode::B,
                correctness: -0.2,
            },
            SectionScore {
                code: SectionCode::C,
                correctness: 0.5,
            },
        ]);
        assert!((agg.overall - 0.5).abs() < f64::EPSILON);
        assert_eq!(agg.sections[0].correctness, 1.0);
        assert_eq!(agg.sections[1].correctness, 0.0);
        assert_eq!(aggregate_scores(&[]).overall, 0.0);
    }

    #[test]
    fn histogram_edges() {
        assert_eq!(histogram_bucket(0.0), 0);
        assert_eq!(histogram_bucket(0.09), 0);
        assert_eq!(histogram_bucket(0.1), 1);
        assert_eq!(histogram_bucket(0.95), 9);
        assert_eq!(histogram_bucket(1.0), 9);
        assert_eq!(histogram_bucket(-3.0), 0);
    }

    #[test]
    fn cohort_statistics() {
        let reports = vec![
            report(&[(SectionCode::B, 1.0), (SectionCode::C, 0.2)]),
            report(&[(SectionCode::B, 0.6), (SectionCode::C, 0.4)]),
        ];
        let stats = compute_cohort_stats(&reports);
        assert_eq!(stats.reports, 2);
        assert!((stats.mean_overall - 0.55).abs() < 1e-9);
        let b = &stats.per_section[&SectionCode::B];
        assert!((b.mean - 0.8).abs() < 1e-9);
        assert_eq!(b.min, 0.6);
        assert_eq!(b.max, 1.0);
        assert_eq!(stats.weakest_section, Some(SectionCode::C));
        assert_eq!(stats.strongest_section, Some(SectionCode::B));
        assert_eq!(stats.histogram[6], 1);
        assert_eq!(stats.histogram[5], 1);
        assert_eq!(stats.verdicts[&VerdictBand::B], 1);
        assert_eq!(stats.verdicts[&VerdictBand::C], 1);
        assert!((stats.per_kind[&ItemKind::Grid] - 0.3).abs() < 1e-9);
    }

    #[test]
    fn empty_cohort() {
        let stats = compute_cohort_stats(&[]);
        assert_eq!(stats.reports, 0);
        assert_eq!(stats.mean_overall, 0.0);
        assert!(stats.weakest_section.is_none());
        assert_eq!(stats.histogram.iter().sum::<usize>(), 0);
    }
}
