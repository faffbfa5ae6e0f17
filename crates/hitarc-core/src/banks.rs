//! Content banks consumed by the generators.
//!
//! Banks are typed templates loaded from TOML. A default bank is embedded at
//! compile time; callers can replace it with their own file through
//! [`crate::parser`].

use serde::{Deserialize, Serialize};

use crate::error::AssessmentError;
use crate::model::{AnswerKey, InputType, ItemKind, SectionCode, WritingLimit};

/// Built-in bank shipped with the crate.
pub const DEFAULT_BANK_TOML: &str = include_str!("../banks/default.toml");

// ---------------------------------------------------------------------------
// Standard-plan banks
// ---------------------------------------------------------------------------

/// A multiple-choice template: one correct value and its decoys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceEntry {
    pub prompt: String,
    pub correct: String,
    pub distractors: Vec<String>,
    /// Explanation revealed after grading.
    #[serde(default)]
    pub rationale: String,
    /// Code, listing or passage shown verbatim.
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// A sentence with numbered blanks, each with its own option list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClozeEntry {
    pub prompt: String,
    /// Text with `[1]`, `[2]`, … markers.
    pub text: String,
    pub options_per_blank: Vec<Vec<String>>,
    /// Correct index into each blank's list, before shuffling.
    pub correct_indices: Vec<usize>,
    #[serde(default)]
    pub explanation: String,
}

/// `stem[0] : stem[1] :: correct[0] : correct[1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogyEntry {
    pub prompt: String,
    pub stem: [String; 2],
    pub correct: [String; 2],
    pub distractors: Vec<[String; 2]>,
    #[serde(default)]
    pub explanation: String,
}

/// A constrained writing task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingEntry {
    pub prompt: String,
    pub limit: WritingLimit,
    #[serde(default)]
    pub must_include: Vec<String>,
    #[serde(default)]
    pub style_hint: String,
    pub min_coherence: f64,
}

/// A proof with exactly one flawed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofEntry {
    pub title: String,
    pub steps: Vec<String>,
    pub error_explanation: String,
    pub distractor_explanations: Vec<String>,
}

/// A recursive function to trace for a given input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub code: String,
    pub language: String,
    pub input: i64,
    pub expected: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    pub event: String,
    pub year: i32,
}

/// A constant stored with more decimals than any prompt asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantEntry {
    pub name: String,
    pub symbol: String,
    pub value: String,
}

/// A concept whose structural analogue in another field is asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsomorphismEntry {
    pub source_field: String,
    pub source_concept: String,
    pub source_description: String,
    pub target_field: String,
    pub answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A centre-embedded sentence with a parsing question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingEntry {
    pub text: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// Every bank the standard-plan generators draw from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBanks {
    #[serde(default)]
    pub spelling: Vec<ChoiceEntry>,
    #[serde(default)]
    pub cloze: Vec<ClozeEntry>,
    #[serde(default)]
    pub analogy: Vec<AnalogyEntry>,
    #[serde(default)]
    pub micro_writing: Vec<WritingEntry>,
    /// Prompt holds the sentence; `correct` names the violation.
    #[serde(default)]
    pub grammar: Vec<ChoiceEntry>,
    #[serde(default)]
    pub fermi: Vec<ChoiceEntry>,
    #[serde(default)]
    pub units: Vec<ChoiceEntry>,
    #[serde(default)]
    pub causal: Vec<ChoiceEntry>,
    #[serde(default)]
    pub generative: Vec<WritingEntry>,
    #[serde(default)]
    pub proofs: Vec<ProofEntry>,
    #[serde(default)]
    pub bugs: Vec<ChoiceEntry>,
    #[serde(default)]
    pub recursion: Vec<TraceEntry>,
    #[serde(default)]
    pub assembly: Vec<ChoiceEntry>,
    #[serde(default)]
    pub science_facts: Vec<ChoiceEntry>,
    #[serde(default)]
    pub geography_facts: Vec<ChoiceEntry>,
    #[serde(default)]
    pub historical_events: Vec<HistoricalEvent>,
    #[serde(default)]
    pub constants: Vec<ConstantEntry>,
    #[serde(default)]
    pub isomorphisms: Vec<IsomorphismEntry>,
    #[serde(default)]
    pub embeddings: Vec<EmbeddingEntry>,
}

/// Minimum entries each generator needs to fill its section.
const REQUIREMENTS: &[(&str, SectionCode, usize)] = &[
    ("spelling", SectionCode::A, 3),
    ("cloze", SectionCode::A, 3),
    ("analogy", SectionCode::A, 2),
    ("micro_writing", SectionCode::A, 1),
    ("grammar", SectionCode::A, 1),
    ("fermi", SectionCode::E, 2),
    ("units", SectionCode::E, 2),
    ("causal", SectionCode::E, 2),
    ("generative", SectionCode::F, 3),
    ("proofs", SectionCode::G, 1),
    ("bugs", SectionCode::H, 1),
    ("recursion", SectionCode::H, 1),
    ("assembly", SectionCode::H, 1),
    ("science_facts", SectionCode::J, 1),
    ("geography_facts", SectionCode::J, 1),
    ("historical_events", SectionCode::J, 1),
    ("constants", SectionCode::J, 1),
    ("isomorphisms", SectionCode::J, 1),
    ("embeddings", SectionCode::J, 1),
];

impl ContentBanks {
    /// The embedded default bank.
    pub fn builtin() -> Result<Self, AssessmentError> {
        toml::from_str(DEFAULT_BANK_TOML).map_err(|e| AssessmentError::InvalidEntry {
            id: "builtin".into(),
            message: e.to_string(),
        })
    }

    /// Number of entries in a named category.
    pub fn category_len(&self, name: &str) -> usize {
        match name {
            "spelling" => self.spelling.len(),
            "cloze" => self.cloze.len(),
            "analogy" => self.analogy.len(),
            "micro_writing" => self.micro_writing.len(),
            "grammar" => self.grammar.len(),
            "fermi" => self.fermi.len(),
            "units" => self.units.len(),
            "causal" => self.causal.len(),
            "generative" => self.generative.len(),
            "proofs" => self.proofs.len(),
            "bugs" => self.bugs.len(),
            "recursion" => self.recursion.len(),
            "assembly" => self.assembly.len(),
            "science_facts" => self.science_facts.len(),
            "geography_facts" => self.geography_facts.len(),
            "historical_events" => self.historical_events.len(),
            "constants" => self.constants.len(),
            "isomorphisms" => self.isomorphisms.len(),
            "embeddings" => self.embeddings.len(),
            _ => 0,
        }
    }

    /// Check that every category `section` draws from is deep enough.
    pub fn check_section(&self, section: SectionCode) -> Result<(), AssessmentError> {
        for &(name, code, min) in REQUIREMENTS {
            if code == section && self.category_len(name) < min {
                return Err(AssessmentError::EmptyBankCategory(name));
            }
        }
        Ok(())
    }

    /// Categories that fall short of what their generator needs.
    pub fn shortfalls(&self) -> Vec<(&'static str, usize, usize)> {
        REQUIREMENTS
            .iter()
            .filter(|(name, _, min)| self.category_len(name) < *min)
            .map(|&(name, _, min)| (name, self.category_len(name), min))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tiered banks
// ---------------------------------------------------------------------------

/// One pre-authored item tagged with a section and difficulty tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredEntry {
    pub id: String,
    pub section: SectionCode,
    pub kind: ItemKind,
    pub tier: u8,
    pub prompt: String,
    pub input_type: InputType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub display: Option<String>,
    pub answer_key: AnswerKey,
}

/// A flat bank of tiered entries across sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TieredBank {
    /// Recorded in plans so they can be re-verified against the same bank.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entries: Vec<TieredEntry>,
}

impl TieredBank {
    /// All entries for one section, in bank order.
    pub fn section(&self, code: SectionCode) -> Vec<&TieredEntry> {
        self.entries.iter().filter(|e| e.section == code).collect()
    }

    /// Entries for one section and tier, in bank order.
    pub fn tier(&self, code: SectionCode, tier: u8) -> Vec<&TieredEntry> {
        self.entries
            .iter()
            .filter(|e| e.section == code && e.tier == tier)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bank_parses_and_is_complete() {
        let banks = ContentBanks::builtin().unwrap();
        assert!(banks.shortfalls().is_empty(), "{:?}", banks.shortfalls());
        for code in SectionCode::ALL {
            banks.check_section(code).unwrap();
        }
    }

    #[test]
    fn builtin_choice_entries_have_distinct_options() {
        let banks = ContentBanks::builtin().unwrap();
        let all = banks
            .spelling
            .iter()
            .chain(&banks.grammar)
            .chain(&banks.fermi)
            .chain(&banks.units)
            .chain(&banks.causal)
            .chain(&banks.bugs)
            .chain(&banks.assembly)
            .chain(&banks.science_facts)
            .chain(&banks.geography_facts);
        for entry in all {
            assert!(
                !entry.distractors.contains(&entry.correct),
                "correct answer repeated as distractor: {}",
                entry.prompt
            );
        }
    }

    #[test]
    fn empty_bank_reports_category() {
        let banks = ContentBanks::default();
        let err = banks.check_section(SectionCode::A).unwrap_err();
        assert!(matches!(err, AssessmentError::EmptyBankCategory("spelling")));
        // Parametric sections need nothing.
        banks.check_section(SectionCode::B).unwrap();
        banks.check_section(SectionCode::I).unwrap();
    }

    #[test]
    fn tier_filtering() {
        let entry = |id: &str, section, tier| TieredEntry {
            id: id.into(),
            section,
            kind: ItemKind::ScienceFact,
            tier,
            prompt: "q".into(),
            input_type: InputType::Text,
            options: vec![],
            display: None,
            answer_key: AnswerKey::text("a"),
        };
        let bank = TieredBank {
            name: "t".into(),
            entries: vec![
                entry("a", SectionCode::J, 1),
                entry("b", SectionCode::J, 2),
                entry("c", SectionCode::G, 1),
            ],
        };
        assert_eq!(bank.section(SectionCode::J).len(), 2);
        assert_eq!(bank.tier(SectionCode::J, 2)[0].id, "b");
        assert!(bank.tier(SectionCode::G, 3).is_empty());
    }
}
