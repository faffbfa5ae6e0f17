//! Lexical coherence heuristic for writing items.
//!
//! This is pattern counting, not language understanding: it rewards varied
//! vocabulary and sentences of a reasonable length.

use crate::traits::{CoherenceReport, CoherenceScorer};

/// Sentence length at which the length component saturates.
const TARGET_SENTENCE_LENGTH: f64 = 18.0;
const VARIETY_WEIGHT: f64 = 0.6;
const LENGTH_WEIGHT: f64 = 0.4;

/// Default scorer: `variety * 0.6 + min(1, avg_len / 18) * 0.4`, capped at 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalCoherence;

impl CoherenceScorer for LexicalCoherence {
    fn name(&self) -> &str {
        "lexical"
    }

    fn score(&self, text: &str) -> CoherenceReport {
        let words = words(text);
        let sentence_count = sentences(text).max(1);
        let word_count = words.len();

        let lexical_variety = if word_count == 0 {
            0.0
        } else {
            let mut unique = words.clone();
            unique.sort_unstable();
            unique.dedup();
            unique.len() as f64 / word_count as f64
        };
        let average_sentence_length = word_count as f64 / sentence_count as f64;
        let score = (lexical_variety * VARIETY_WEIGHT
            + (average_sentence_length / TARGET_SENTENCE_LENGTH).min(1.0) * LENGTH_WEIGHT)
            .min(1.0);

        CoherenceReport {
            score,
            word_count,
            sentence_count,
            lexical_variety,
            average_sentence_length,
        }
    }
}

/// Lowercased words with everything outside `[a-z0-9']` removed.
pub fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '\'')
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Count of non-blank fragments between runs of `.`, `!` or `?`.
pub fn sentences(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}
