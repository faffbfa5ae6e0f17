//! Core data model types for hitarc.
//!
//! These are the fundamental types that the whole system uses to represent
//! items, answer keys, sections and test plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::rng::to_base36;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Assessment section codes, in plan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionCode {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
}

impl SectionCode {
    /// Every section in standard plan order.
    pub const ALL: [SectionCode; 10] = [
        SectionCode::A,
        SectionCode::B,
        SectionCode::C,
        SectionCode::D,
        SectionCode::E,
        SectionCode::F,
        SectionCode::G,
        SectionCode::H,
        SectionCode::I,
        SectionCode::J,
    ];

    /// Seed prefix that decorrelates this section's stream from its siblings.
    pub fn namespace(self) -> &'static str {
        match self {
            SectionCode::A => "lang-",
            SectionCode::B => "arith-",
            SectionCode::C => "grid-",
            SectionCode::D => "perception-",
            SectionCode::E => "science-",
            SectionCode::F => "gen-",
            SectionCode::G => "math-",
            SectionCode::H => "coding-",
            SectionCode::I => "memory-",
            SectionCode::J => "knowledge-",
        }
    }

    /// Short machine name, accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            SectionCode::A => "language",
            SectionCode::B => "arithmetic",
            SectionCode::C => "grid",
            SectionCode::D => "perception",
            SectionCode::E => "science",
            SectionCode::F => "generative",
            SectionCode::G => "math",
            SectionCode::H => "coding",
            SectionCode::I => "memory",
            SectionCode::J => "knowledge",
        }
    }

    /// Human-readable section label.
    pub fn label(self) -> &'static str {
        match self {
            SectionCode::A => "Language as Statistical Mastery",
            SectionCode::B => "Arithmetic Reliability",
            SectionCode::C => "Abstraction & Reasoning",
            SectionCode::D => "Perception & Memory",
            SectionCode::E => "Science & Quantitative Reasoning",
            SectionCode::F => "Generative Constraints & Calibration",
            SectionCode::G => "Mathematical Precision",
            SectionCode::H => "Code Comprehension",
            SectionCode::I => "Working Memory",
            SectionCode::J => "Knowledge & Structure",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SectionCode::A => {
                "Assesses spelling robustness, grammatical reasoning, analogies, and concise constrained writing."
            }
            SectionCode::B => {
                "Exact arithmetic under time pressure. Focus on carries, multi-step order, and precise rounding."
            }
            SectionCode::C => "Infer transformation rules from sparse grid examples.",
            SectionCode::D => "Recall high-entropy visual details from compressed descriptions.",
            SectionCode::E => "Fermi estimates, dimensional analysis, and causal traps.",
            SectionCode::F => "Produce concise textual outputs under strict constraints.",
            SectionCode::G => "Decimal precision, operator precedence, closed-form evaluation and proof auditing.",
            SectionCode::H => "Locate bugs, trace recursion and read low-level listings.",
            SectionCode::I => "Hold digits, facts and colour sequences across a short flash.",
            SectionCode::J => "Recall facts and map structures across domains.",
        }
    }

    /// Time allowance for the section.
    pub fn duration_seconds(self) -> u32 {
        match self {
            SectionCode::A
            | SectionCode::B
            | SectionCode::C
            | SectionCode::D
            | SectionCode::E
            | SectionCode::F => 150,
            SectionCode::G | SectionCode::H => 180,
            SectionCode::I => 120,
            SectionCode::J => 150,
        }
    }
}

impl fmt::Display for SectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            SectionCode::A => "A",
            SectionCode::B => "B",
            SectionCode::C => "C",
            SectionCode::D => "D",
            SectionCode::E => "E",
            SectionCode::F => "F",
            SectionCode::G => "G",
            SectionCode::H => "H",
            SectionCode::I => "I",
            SectionCode::J => "J",
        };
        write!(f, "{letter}")
    }
}

impl FromStr for SectionCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        SectionCode::ALL
            .into_iter()
            .find(|code| code.to_string().to_lowercase() == needle || code.name() == needle)
            .ok_or_else(|| format!("unknown section: {s}"))
    }
}

/// Parse a comma-separated section list such as `"A,B,math"`.
pub fn parse_section_list(list: &str) -> Result<Vec<SectionCode>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Every item type the generators can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    // Language
    Spelling,
    Cloze,
    Analogy,
    MicroWriting,
    GrammarRule,
    // Arithmetic
    Arithmetic,
    // Grid
    Grid,
    // Perception
    Perception,
    // Science
    Fermi,
    Units,
    Causal,
    // Generative
    ConstrainedWriting,
    // Math
    DecimalArithmetic,
    OrderOfOperations,
    TrigLog,
    DefiniteIntegral,
    ProofError,
    // Coding
    BugFinding,
    RecursiveTrace,
    AssemblyReading,
    LongFunction,
    // Memory
    DigitSpan,
    FactRetention,
    SequenceRecall,
    SpeedArithmetic,
    // Knowledge
    ScienceFact,
    GeographyFact,
    HistoricalDate,
    MathConstant,
    CrossDomainMapping,
    CenterEmbedding,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // serde's kebab-case rendering is the canonical name.
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default();
        write!(f, "{name}")
    }
}

/// How the test-taker answers an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    Numeric,
    MultipleChoice,
    MultiSelect,
    Text,
    Sequence,
    MultiPart,
    Writing,
}

/// Verbatim content shown alongside the prompt (code, proofs, expressions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayBlock {
    pub content: String,
    /// Syntax hint for renderers, e.g. `python` or `x86asm`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// What a memory item flashes before the question appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Digits,
    Facts,
    Colors,
    Expression,
}

/// Content shown for a limited time before the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashContent {
    pub kind: FlashKind,
    pub items: Vec<String>,
    pub display_ms: u64,
}

/// One input/output example pair for a grid item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridExample {
    pub input: Vec<Vec<u8>>,
    pub output: Vec<Vec<u8>>,
}

/// Word or sentence ceiling for writing items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingLimit {
    MaxWords(u32),
    MaxSentences(u32),
}

/// Constraints shown to the test-taker for a writing item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingConstraints {
    pub limit: WritingLimit,
    #[serde(default)]
    pub must_include: Vec<String>,
    #[serde(default)]
    pub style_hint: String,
}

/// How keyword lists on free-text keys award credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeywordPolicy {
    /// Any single keyword present scores 1.
    #[default]
    Any,
    /// Correctness is the fraction of keywords present.
    Fraction,
}

/// Canonicalisation applied to a raw answer before it is digested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    /// Surrounding whitespace removed, otherwise verbatim.
    #[default]
    Exact,
    TrimmedLowercase,
    /// Lowercased with any `0x` prefix removed.
    HexLowercase,
    /// Parsed and printed with a fixed number of decimals.
    NumericRounded,
}

/// Response shape a sealed key was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerShape {
    Numeric,
    Choice,
    Text,
}

/// Ground truth for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnswerKey {
    Numeric {
        expected: f64,
        #[serde(default)]
        tolerance: f64,
    },
    Choice {
        correct_index: usize,
    },
    MultiChoice {
        correct_indices: Vec<usize>,
    },
    Sequence {
        expected: Vec<String>,
    },
    MultiPart {
        expected: Vec<String>,
    },
    Text {
        canonical: String,
        #[serde(default)]
        alternatives: Vec<String>,
        #[serde(default)]
        keywords: Vec<String>,
        #[serde(default)]
        keyword_policy: KeywordPolicy,
    },
    Writing {
        limit: WritingLimit,
        #[serde(default)]
        must_include: Vec<String>,
        min_coherence: f64,
    },
    Hashed {
        digest: String,
        #[serde(default)]
        normalization: Normalization,
        #[serde(default)]
        decimal_places: Option<u32>,
        /// Only this response shape can match; unset admits any scalar answer.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        answer_shape: Option<AnswerShape>,
    },
}

impl AnswerKey {
    /// Plain-text key with no alternatives or keywords.
    pub fn text(canonical: impl Into<String>) -> Self {
        AnswerKey::Text {
            canonical: canonical.into(),
            alternatives: Vec::new(),
            keywords: Vec::new(),
            keyword_policy: KeywordPolicy::Any,
        }
    }

    /// Restrict a sealed key to one response shape. Other keys are unchanged.
    pub fn for_shape(mut self, shape: AnswerShape) -> Self {
        if let AnswerKey::Hashed { answer_shape, .. } = &mut self {
            *answer_shape = Some(shape);
        }
        self
    }

    /// Short name of the key shape, used in feedback and validation.
    pub fn shape(&self) -> &'static str {
        match self {
            AnswerKey::Numeric { .. } => "numeric",
            AnswerKey::Choice { .. } => "choice",
            AnswerKey::MultiChoice { .. } => "multi-choice",
            AnswerKey::Sequence { .. } => "sequence",
            AnswerKey::MultiPart { .. } => "multi-part",
            AnswerKey::Text { .. } => "text",
            AnswerKey::Writing { .. } => "writing",
            AnswerKey::Hashed { .. } => "hashed",
        }
    }
}

/// One question plus its embedded ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Plan-unique identifier, `{section}-{index}-{fragment}`.
    pub id: String,
    pub section: SectionCode,
    /// Position within the section, assigned at assembly.
    pub index: u32,
    pub kind: ItemKind,
    pub prompt: String,
    pub input_type: InputType,
    /// Already shuffled; the key records the position of the correct one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Per-blank options for cloze items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blank_options: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash: Option<FlashContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub train: Vec<GridExample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<WritingConstraints>,
    /// Explanation revealed after grading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Absent in public views of a plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_key: Option<AnswerKey>,
}

impl Item {
    /// Create an item. `fragment` becomes part of the final id when the
    /// item is placed into a section.
    pub fn new(
        fragment: impl Into<String>,
        kind: ItemKind,
        prompt: impl Into<String>,
        input_type: InputType,
        answer_key: AnswerKey,
    ) -> Self {
        Self {
            id: fragment.into(),
            section: SectionCode::A,
            index: 0,
            kind,
            prompt: prompt.into(),
            input_type,
            options: Vec::new(),
            blank_options: Vec::new(),
            display: None,
            flash: None,
            train: Vec::new(),
            sub_questions: Vec::new(),
            constraints: None,
            rationale: None,
            answer_key: Some(answer_key),
        }
    }

    /// Multiple-choice item whose key points at `options[correct_index]`.
    pub fn choice(
        fragment: impl Into<String>,
        kind: ItemKind,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Self {
        let mut item = Self::new(
            fragment,
            kind,
            prompt,
            InputType::MultipleChoice,
            AnswerKey::Choice { correct_index },
        );
        item.options = options;
        item
    }

    pub fn with_display(mut self, content: impl Into<String>, language: Option<&str>) -> Self {
        self.display = Some(DisplayBlock {
            content: content.into(),
            language: language.map(str::to_owned),
        });
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn with_flash(mut self, flash: FlashContent) -> Self {
        self.flash = Some(flash);
        self
    }

    pub fn with_constraints(mut self, constraints: WritingConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// The same item with the answer key and rationale removed.
    pub fn public(&self) -> Item {
        Item {
            answer_key: None,
            rationale: None,
            ..self.clone()
        }
    }
}

/// A named, timed group of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub code: SectionCode,
    pub label: String,
    pub duration_seconds: u32,
    pub description: String,
    pub items: Vec<Item>,
}

impl Section {
    /// Assemble a section, assigning indices and final item ids in order.
    pub fn new(code: SectionCode, items: Vec<Item>) -> Self {
        let items = items
            .into_iter()
            .enumerate()
            .map(|(index, mut item)| {
                item.section = code;
                item.index = index as u32;
                item.id = format!("{code}-{}-{}", to_base36(index as u64), item.id);
                item
            })
            .collect();
        Self {
            code,
            label: code.label().to_string(),
            duration_seconds: code.duration_seconds(),
            description: code.description().to_string(),
            items,
        }
    }
}

/// How a plan was assembled, so it can be regenerated for verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum PlanSource {
    /// Fixed section generators with namespaced streams.
    Standard { sections: Vec<SectionCode> },
    /// One stream drawing one entry per declared tier.
    Tiered {
        policy: Vec<TierRequest>,
        bank_name: String,
    },
}

/// Tiers requested for one section of a tiered plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRequest {
    pub section: SectionCode,
    pub tiers: Vec<u8>,
}

/// Whether answer keys travel in plaintext or sealed as digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPolicy {
    #[default]
    Plaintext,
    Hashed,
}

impl FromStr for KeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plaintext" | "plain" => Ok(KeyPolicy::Plaintext),
            "hashed" | "hash" | "sealed" => Ok(KeyPolicy::Hashed),
            other => Err(format!("unknown key policy: {other}")),
        }
    }
}

/// A complete, immutable assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    pub id: Uuid,
    pub seed: String,
    pub source: PlanSource,
    #[serde(default)]
    pub key_policy: KeyPolicy,
    pub sections: Vec<Section>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TestPlan {
    /// Copy of the plan safe to show the test-taker.
    pub fn public_view(&self) -> TestPlan {
        TestPlan {
            sections: self
                .sections
                .iter()
                .map(|s| Section {
                    items: s.items.iter().map(Item::public).collect(),
                    ..s.clone()
                })
                .collect(),
            ..self.clone()
        }
    }

    /// Iterate over every item in section order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn find_item(&self, id: &str) -> Option<&Item> {
        self.items().find(|item| item.id == id)
    }

    /// Whether the plan has passed its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Same questions, same options, same keys. Ignores id and timestamps.
    pub fn same_content(&self, other: &TestPlan) -> bool {
        self.seed == other.seed && self.sections == other.sections
    }
}

/// Locate the correct option after a shuffle.
///
/// # Panics
///
/// Panics when `correct` is absent from `options`: the content that produced
/// the item is broken and the key would be corrupt.
pub fn locate<T: PartialEq + fmt::Debug>(options: &[T], correct: &T) -> usize {
    match options.iter().position(|o| o == correct) {
        Some(idx) => idx,
        None => panic!("correct option {correct:?} missing from shuffled options {options:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_code_display_and_parse() {
        assert_eq!(SectionCode::A.to_string(), "A");
        assert_eq!("b".parse::<SectionCode>().unwrap(), SectionCode::B);
        assert_eq!("math".parse::<SectionCode>().unwrap(), SectionCode::G);
        assert_eq!(" Knowledge ".parse::<SectionCode>().unwrap(), SectionCode::J);
        assert!("Z".parse::<SectionCode>().is_err());
    }

    #[test]
    fn section_list_parsing() {
        assert_eq!(
            parse_section_list("A, c,memory").unwrap(),
            vec![SectionCode::A, SectionCode::C, SectionCode::I]
        );
        assert!(parse_section_list("A,nope").is_err());
        assert!(parse_section_list("").unwrap().is_empty());
    }

    #[test]
    fn namespaces_are_distinct() {
        let mut seen: Vec<&str> = SectionCode::ALL.iter().map(|c| c.namespace()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), SectionCode::ALL.len());
    }

    #[test]
    fn item_kind_display_is_kebab_case() {
        assert_eq!(ItemKind::MicroWriting.to_string(), "micro-writing");
        assert_eq!(ItemKind::CrossDomainMapping.to_string(), "cross-domain-mapping");
    }

    #[test]
    fn section_assigns_ids_and_indices() {
        let items = (0..12)
            .map(|i| {
                Item::new(
                    format!("f{i:03}"),
                    ItemKind::Arithmetic,
                    "q",
                    InputType::Numeric,
                    AnswerKey::Numeric {
                        expected: 1.0,
                        tolerance: 0.0,
                    },
                )
            })
            .collect();
        let section = Section::new(SectionCode::B, items);
        assert_eq!(section.items[0].id, "B-0-f000");
        assert_eq!(section.items[11].id, "B-b-f011");
        assert!(section.items.iter().enumerate().all(|(i, it)| it.index as usize == i));
        assert!(section.items.iter().all(|it| it.section == SectionCode::B));
        assert_eq!(section.label, "Arithmetic Reliability");
    }

    #[test]
    fn public_view_strips_keys() {
        let item = Item::choice("x", ItemKind::Spelling, "pick", vec!["a".into(), "b".into()], 1)
            .with_rationale("because");
        let plan = TestPlan {
            id: Uuid::new_v4(),
            seed: "s".into(),
            source: PlanSource::Standard {
                sections: vec![SectionCode::A],
            },
            key_policy: KeyPolicy::Plaintext,
            sections: vec![Section::new(SectionCode::A, vec![item])],
            created_at: Utc::now(),
            expires_at: Utc::now(),
        };
        let public = plan.public_view();
        let only = public.items().next().unwrap();
        assert!(only.answer_key.is_none());
        assert!(only.rationale.is_none());
        assert_eq!(only.options.len(), 2);
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("correct_index"));
        assert!(!json.contains("because"));
    }

    #[test]
    fn answer_key_serde_is_tagged() {
        let key = AnswerKey::Numeric {
            expected: 10.0,
            tolerance: 0.01,
        };
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["kind"], "numeric");
        let back: AnswerKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, key);

        let writing: AnswerKey = serde_json::from_str(
            r#"{"kind":"writing","limit":{"max_words":30},"must_include":["a"],"min_coherence":0.6}"#,
        )
        .unwrap();
        assert!(matches!(
            writing,
            AnswerKey::Writing {
                limit: WritingLimit::MaxWords(30),
                ..
            }
        ));
    }

    #[test]
    fn key_policy_parse() {
        assert_eq!("hashed".parse::<KeyPolicy>().unwrap(), KeyPolicy::Hashed);
        assert_eq!("Plaintext".parse::<KeyPolicy>().unwrap(), KeyPolicy::Plaintext);
        assert!("rot13".parse::<KeyPolicy>().is_err());
    }

    #[test]
    fn locate_finds_after_shuffle() {
        let opts = vec!["b", "c", "a"];
        assert_eq!(locate(&opts, &"a"), 2);
    }

    #[test]
    #[should_panic(expected = "missing from shuffled options")]
    fn locate_panics_on_missing_correct() {
        locate(&["x", "y"], &"z");
    }
}
