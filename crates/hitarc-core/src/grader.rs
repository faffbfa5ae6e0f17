//! Response grading.
//!
//! [`Grader::score`] maps one item and an optional response to an
//! [`ItemGrade`]. It never fails: a missing, malformed or mismatched response
//! scores 0 with feedback explaining why.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::json;

use crate::coherence::{words, LexicalCoherence};
use crate::digest::{matches, Sha256Digest};
use crate::model::{
    AnswerKey, AnswerShape, Item, KeywordPolicy, Normalization, Section, TestPlan, WritingLimit,
};
use crate::results::{Answer, ItemGrade, PlanGrade, Response, SectionGrade, Submission};
use crate::statistics::{aggregate_scores, SectionScore, VerdictBand};
use crate::traits::{AnswerDigest, CoherenceScorer};

/// Scores at or above this snap to full credit.
const SNAP_TO_FULL: f64 = 0.999;
/// Absorbs binary representation error at the tolerance boundary.
const FLOAT_SLACK: f64 = 1e-9;

const OVER_LIMIT_SCORE: f64 = 0.25;
const ONE_GATE_SCORE: f64 = 0.5;
const NO_GATE_SCORE: f64 = 0.2;

/// Scores responses against answer keys.
///
/// Cheap to clone; the digest and coherence scorer are shared.
#[derive(Clone)]
pub struct Grader {
    digest: Arc<dyn AnswerDigest>,
    coherence: Arc<dyn CoherenceScorer>,
}

impl Default for Grader {
    fn default() -> Self {
        Self::new(Arc::new(Sha256Digest), Arc::new(LexicalCoherence))
    }
}

impl fmt::Debug for Grader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grader")
            .field("digest", &self.digest.name())
            .field("coherence", &self.coherence.name())
            .finish()
    }
}

/// Intermediate result before the item id and kind are attached.
struct Outcome {
    correctness: f64,
    feedback: String,
    details: Option<serde_json::Value>,
}

impl Outcome {
    fn new(correctness: f64, feedback: impl Into<String>) -> Self {
        Self {
            correctness,
            feedback: feedback.into(),
            details: None,
        }
    }

    fn zero(feedback: impl Into<String>) -> Self {
        Self::new(0.0, feedback)
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl Grader {
    pub fn new(digest: Arc<dyn AnswerDigest>, coherence: Arc<dyn CoherenceScorer>) -> Self {
        Self { digest, coherence }
    }

    pub fn digest(&self) -> &dyn AnswerDigest {
        self.digest.as_ref()
    }

    /// Score one item.
    pub fn score(&self, item: &Item, response: Option<&Response>) -> ItemGrade {
        let outcome = match (item.answer_key.as_ref(), response) {
            (None, _) => Outcome::zero("Item carries no answer key; grade against the full plan."),
            (Some(_), None) => Outcome::zero("No response submitted."),
            (Some(key), Some(response)) => self.score_key(key, &response.answer),
        };
        ItemGrade {
            item_id: item.id.clone(),
            kind: item.kind,
            correctness: outcome.correctness.clamp(0.0, 1.0),
            feedback: outcome.feedback,
            details: outcome.details,
        }
    }

    fn score_key(&self, key: &AnswerKey, answer: &Answer) -> Outcome {
        match (key, answer) {
            (
                AnswerKey::Numeric {
                    expected,
                    tolerance,
                },
                Answer::Numeric { value } | Answer::Text { text: value },
            ) => score_numeric(*expected, *tolerance, value),

            (AnswerKey::Choice { correct_index }, Answer::Choice { selected_index }) => {
                if selected_index == correct_index {
                    Outcome::new(1.0, "Correct option selected.")
                } else {
                    Outcome::zero("Incorrect option selected.")
                }
            }

            (
                AnswerKey::MultiChoice { correct_indices },
                Answer::MultiChoice { selected_indices },
            ) => score_multi_choice(correct_indices, selected_indices),

            (AnswerKey::Sequence { expected }, Answer::Sequence { values }) => {
                score_sequence(expected, values)
            }
            (AnswerKey::Sequence { expected }, Answer::Text { text })
                if expected.iter().all(|e| e.chars().count() == 1) =>
            {
                let values: Vec<String> = text
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != ',')
                    .map(String::from)
                    .collect();
                score_sequence(expected, &values)
            }

            (AnswerKey::MultiPart { expected }, Answer::MultiPart { parts }) => {
                score_multi_part(expected, parts)
            }

            (
                AnswerKey::Text {
                    canonical,
                    alternatives,
                    keywords,
                    keyword_policy,
                },
                Answer::Text { text },
            ) => score_text(canonical, alternatives, keywords, *keyword_policy, text),

            (
                AnswerKey::Writing {
                    limit,
                    must_include,
                    min_coherence,
                },
                Answer::Text { text },
            ) => self.score_writing(*limit, must_include, *min_coherence, text),

            (
                AnswerKey::Hashed {
                    digest,
                    normalization,
                    decimal_places,
                    answer_shape,
                },
                answer,
            ) => {
                if !sealed_shape_admits(*answer_shape, answer) {
                    return Outcome::zero(format!(
                        "Response shape '{}' does not fit this sealed item.",
                        answer.shape()
                    ));
                }
                let raw = match normalization {
                    Normalization::NumericRounded => sanitize_numeric(&answer.as_text()),
                    _ => answer.as_text(),
                };
                if matches(&raw, digest, *normalization, *decimal_places, self.digest.as_ref()) {
                    Outcome::new(1.0, "Answer matches the sealed key.")
                } else {
                    Outcome::zero("Answer does not match the sealed key.")
                }
            }

            (key, answer) => Outcome::zero(format!(
                "Response shape '{}' does not fit a {} item.",
                answer.shape(),
                key.shape()
            )),
        }
    }

    fn score_writing(
        &self,
        limit: WritingLimit,
        must_include: &[String],
        min_coherence: f64,
        text: &str,
    ) -> Outcome {
        let cleaned = text.trim();
        if cleaned.is_empty() {
            return Outcome::zero("No writing provided.");
        }

        let report = self.coherence.score(cleaned);
        let lower = cleaned.to_lowercase();
        let missing: Vec<&str> = must_include
            .iter()
            .filter(|token| !lower.contains(&token.to_lowercase()))
            .map(String::as_str)
            .collect();
        let details = json!({
            "word_count": report.word_count,
            "sentence_count": report.sentence_count,
            "coherence": report.score,
            "scorer": self.coherence.name(),
            "missing_tokens": missing,
        });

        let over_limit = match limit {
            WritingLimit::MaxWords(max) => {
                (report.word_count > max as usize).then(|| format!("word limit ({}/{max})", report.word_count))
            }
            WritingLimit::MaxSentences(max) => (report.sentence_count > max as usize)
                .then(|| format!("sentence limit ({}/{max})", report.sentence_count)),
        };
        if let Some(which) = over_limit {
            return Outcome::new(OVER_LIMIT_SCORE, format!("Exceeded {which}.")).with_details(details);
        }

        let tokens_met = missing.is_empty();
        let coherent = report.score >= min_coherence;
        let outcome = match (tokens_met, coherent) {
            (true, true) => Outcome::new(1.0, "Constraints satisfied with coherent phrasing."),
            (false, true) => Outcome::new(
                ONE_GATE_SCORE,
                format!("Missing required tokens: {}.", missing.join(", ")),
            ),
            (true, false) => Outcome::new(
                ONE_GATE_SCORE,
                "Required terms present, but coherence is below the threshold.",
            ),
            (false, false) => Outcome::new(
                NO_GATE_SCORE,
                format!(
                    "Missing required tokens ({}) and coherence is below the threshold.",
                    missing.join(", ")
                ),
            ),
        };
        outcome.with_details(details)
    }

    /// Grade every item of a section. An empty section scores 0.
    pub fn grade_section(&self, section: &Section, responses: &HashMap<&str, &Response>) -> SectionGrade {
        let items: Vec<ItemGrade> = section
            .items
            .iter()
            .map(|item| self.score(item, responses.get(item.id.as_str()).copied()))
            .collect();
        let overall = if items.is_empty() {
            0.0
        } else {
            items.iter().map(|g| g.correctness).sum::<f64>() / items.len() as f64
        };
        SectionGrade {
            code: section.code,
            overall,
            items,
        }
    }

    /// Grade a whole submission. The first response per item id counts.
    pub fn grade_plan(&self, plan: &TestPlan, submission: &Submission) -> PlanGrade {
        if let Some(id) = submission.plan_id {
            if id != plan.id {
                tracing::warn!(plan_id = %plan.id, submitted_for = %id, "submission targets a different plan");
            }
        }

        let mut responses: HashMap<&str, &Response> = HashMap::new();
        for response in &submission.responses {
            responses.entry(response.item_id.as_str()).or_insert(response);
        }
        let unknown = responses
            .keys()
            .filter(|id| plan.find_item(id).is_none())
            .count();
        if unknown > 0 {
            tracing::debug!(unknown, "ignoring responses for items not in the plan");
        }

        let sections: Vec<SectionGrade> = plan
            .sections
            .iter()
            .map(|section| self.grade_section(section, &responses))
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

        PlanGrade {
            plan_id: plan.id,
            seed: plan.seed.clone(),
            sections,
            overall: aggregate.overall,
            verdict: VerdictBand::from_score(aggregate.overall),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-shape scoring
// ---------------------------------------------------------------------------

/// Strip a trailing `%` and every character outside `0-9 . + -`.
pub fn sanitize_numeric(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed);
    trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-'))
        .collect()
}

/// Parse a numeric response; anything unparseable is `+∞`.
pub fn parse_numeric(raw: &str) -> f64 {
    sanitize_numeric(raw)
        .parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .unwrap_or(f64::INFINITY)
}

/// Tolerance-aware numeric credit.
pub fn numeric_correctness(expected: f64, tolerance: f64, actual: f64) -> f64 {
    let diff = (actual - expected).abs();
    if diff <= tolerance + FLOAT_SLACK {
        return 1.0;
    }
    let score = (1.0 - diff / expected.abs().max(1.0)).clamp(0.0, 1.0);
    if score >= SNAP_TO_FULL {
        1.0
    } else if score.is_nan() {
        0.0
    } else {
        score
    }
}

fn score_numeric(expected: f64, tolerance: f64, raw: &str) -> Outcome {
    let actual = parse_numeric(raw);
    let correctness = numeric_correctness(expected, tolerance, actual);
    let feedback = if actual.is_infinite() {
        "Response is not a number.".to_string()
    } else if correctness >= 1.0 {
        "Within tolerance.".to_string()
    } else {
        format!("Off by {}.", (actual - expected).abs())
    };
    let details = if actual.is_finite() {
        json!({ "parsed": actual, "difference": (actual - expected).abs() })
    } else {
        json!({ "parsed": null })
    };
    Outcome::new(correctness, feedback).with_details(details)
}

fn score_multi_choice(correct: &[usize], selected: &[usize]) -> Outcome {
    if selected.len() != correct.len() || correct.is_empty() {
        return Outcome::zero("Incomplete response: every blank needs a selection.");
    }
    let hits = correct.iter().zip(selected).filter(|(c, s)| c == s).count();
    if hits == correct.len() {
        Outcome::new(1.0, "Every blank filled correctly.")
    } else {
        Outcome::new(
            hits as f64 / correct.len() as f64,
            format!("{hits} of {} blanks correct.", correct.len()),
        )
    }
}

/// Shapes a sealed key grades, mirroring the plaintext key it replaced.
fn sealed_shape_admits(shape: Option<AnswerShape>, answer: &Answer) -> bool {
    match (shape, answer) {
        (Some(AnswerShape::Choice), Answer::Choice { .. }) => true,
        (Some(AnswerShape::Text), Answer::Text { .. }) => true,
        (Some(AnswerShape::Numeric), Answer::Numeric { .. } | Answer::Text { .. }) => true,
        (None, Answer::Numeric { .. } | Answer::Choice { .. } | Answer::Text { .. }) => true,
        _ => false,
    }
}

fn same_token(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn score_sequence(expected: &[String], values: &[String]) -> Outcome {
    if expected.is_empty() {
        return Outcome::zero("Item has an empty sequence key.");
    }
    let hits = expected
        .iter()
        .zip(values)
        .filter(|(e, v)| same_token(e, v))
        .count();
    Outcome::new(
        hits as f64 / expected.len() as f64,
        format!("{hits} of {} positions recalled.", expected.len()),
    )
}

fn score_multi_part(expected: &[String], parts: &[String]) -> Outcome {
    if expected.is_empty() {
        return Outcome::zero("Item has an empty multi-part key.");
    }
    let hits = expected
        .iter()
        .enumerate()
        .filter(|(idx, want)| {
            let Some(got) = parts.get(*idx) else {
                return false;
            };
            match (want.trim().parse::<f64>(), got.trim().parse::<f64>()) {
                (Ok(a), Ok(b)) => (a - b).abs() <= FLOAT_SLACK,
                _ => same_token(want, got),
            }
        })
        .count();
    Outcome::new(
        hits as f64 / expected.len() as f64,
        format!("{hits} of {} parts correct.", expected.len()),
    )
}

fn score_text(
    canonical: &str,
    alternatives: &[String],
    keywords: &[String],
    policy: KeywordPolicy,
    text: &str,
) -> Outcome {
    let answer = text.trim().to_lowercase();
    if answer.is_empty() {
        return Outcome::zero("No answer provided.");
    }
    if std::iter::once(canonical)
        .chain(alternatives.iter().map(String::as_str))
        .any(|accepted| same_token(accepted, &answer))
    {
        return Outcome::new(1.0, "Matches the expected answer.");
    }
    if keywords.is_empty() {
        return Outcome::zero(format!("Expected '{canonical}'."));
    }

    let found = keywords
        .iter()
        .filter(|k| answer.contains(&k.to_lowercase()))
        .count();
    let correctness = match policy {
        KeywordPolicy::Any if found > 0 => 1.0,
        KeywordPolicy::Any => 0.0,
        KeywordPolicy::Fraction => found as f64 / keywords.len() as f64,
    };
    let outcome = if correctness >= 1.0 {
        Outcome::new(correctness, "Key concept identified.")
    } else if correctness > 0.0 {
        Outcome::new(
            correctness,
            format!("{found} of {} key concepts present.", keywords.len()),
        )
    } else {
        Outcome::zero(format!("Expected something like '{canonical}'."))
    };
    outcome.with_details(json!({ "keywords_found": found, "word_count": words(text).len() }))
}
