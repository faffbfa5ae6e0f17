//! Collaborator traits the grader and plan assembler call through.
//!
//! Implementations live in [`crate::digest`] and [`crate::coherence`]; callers
//! can substitute their own without touching the grading contract.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Answer digests
// ---------------------------------------------------------------------------

/// Turns a normalised answer into an opaque digest.
///
/// The grader and the plan sealer call the same implementation, so a sealed
/// key matches exactly the responses that normalise to the sealed value.
pub trait AnswerDigest: Send + Sync {
    /// Short algorithm name (e.g. "sha256").
    fn name(&self) -> &str;

    /// Digest an already normalised answer.
    fn digest(&self, canonical: &str) -> String;
}

// ---------------------------------------------------------------------------
// Coherence scoring
// ---------------------------------------------------------------------------

/// Heuristic measure of how well-formed a piece of writing is.
pub trait CoherenceScorer: Send + Sync {
    /// Human-readable scorer name.
    fn name(&self) -> &str;

    /// Score `text`. The result must depend on `text` alone.
    fn score(&self, text: &str) -> CoherenceReport;
}

/// Output of a [`CoherenceScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceReport {
    /// Combined score in `[0, 1]`.
    pub score: f64,
    /// Words after punctuation stripping.
    pub word_count: usize,
    /// Non-empty sentences, at least 1 for non-empty text.
    pub sentence_count: usize,
    /// Unique words over total words.
    pub lexical_variety: f64,
    pub average_sentence_length: f64,
}
