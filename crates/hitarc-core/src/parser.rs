//! TOML content-bank parser.
//!
//! Loads standard and tiered banks from files and directories, and validates
//! them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::banks::{ChoiceEntry, ContentBanks, TieredBank, WritingEntry};
use crate::model::{AnswerKey, InputType, SectionCode, WritingLimit};

/// Parse a standard bank file.
pub fn parse_banks(path: &Path) -> Result<ContentBanks> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank file: {}", path.display()))?;

    parse_banks_str(&content, path)
}

/// Parse a standard bank from a TOML string (useful for testing).
pub fn parse_banks_str(content: &str, source_path: &Path) -> Result<ContentBanks> {
    toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
}

/// Parse a tiered bank file. An unnamed bank takes the file stem as its name.
pub fn parse_tiered_bank(path: &Path) -> Result<TieredBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tiered bank: {}", path.display()))?;

    parse_tiered_bank_str(&content, path)
}

/// Parse a tiered bank from a TOML string (useful for testing).
pub fn parse_tiered_bank_str(content: &str, source_path: &Path) -> Result<TieredBank> {
    let mut bank: TieredBank = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    if bank.name.is_empty() {
        bank.name = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(bank)
}

/// Recursively load all `.toml` tiered banks from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_tiered_directory(dir: &Path) -> Result<Vec<TieredBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    // Directory order is platform dependent; bank order feeds the RNG.
    paths.sort();

    for path in paths {
        if path.is_dir() {
            banks.extend(load_tiered_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_tiered_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Category and position, or tiered entry id (if applicable).
    pub entry_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(entry_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entry_id: Some(entry_id.into()),
            message: message.into(),
        }
    }
}

fn check_choice(
    category: &str,
    entries: &[ChoiceEntry],
    warnings: &mut Vec<ValidationWarning>,
) {
    for (i, entry) in entries.iter().enumerate() {
        let id = format!("{category}[{i}]");
        if entry.prompt.trim().is_empty() {
            warnings.push(ValidationWarning::new(&id, "prompt is empty"));
        }
        if entry.distractors.is_empty() {
            warnings.push(ValidationWarning::new(&id, "no distractors"));
        }
        if entry.distractors.contains(&entry.correct) {
            warnings.push(ValidationWarning::new(
                &id,
                format!("correct answer '{}' repeated as a distractor", entry.correct),
            ));
        }
        let unique: HashSet<&String> = entry.distractors.iter().collect();
        if unique.len() != entry.distractors.len() {
            warnings.push(ValidationWarning::new(&id, "duplicate distractors"));
        }
    }
}

fn check_writing(
    category: &str,
    entries: &[WritingEntry],
    warnings: &mut Vec<ValidationWarning>,
) {
    for (i, entry) in entries.iter().enumerate() {
        let id = format!("{category}[{i}]");
        let limit = match entry.limit {
            WritingLimit::MaxWords(n) | WritingLimit::MaxSentences(n) => n,
        };
        if limit == 0 {
            warnings.push(ValidationWarning::new(&id, "limit of zero can never be met"));
        }
        if !(0.0..=1.0).contains(&entry.min_coherence) {
            warnings.push(ValidationWarning::new(
                &id,
                format!("min_coherence {} outside [0, 1]", entry.min_coherence),
            ));
        }
    }
}

/// Validate a standard bank for common issues.
pub fn validate_banks(banks: &ContentBanks) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for (name, have, need) in banks.shortfalls() {
        warnings.push(ValidationWarning {
            entry_id: None,
            message: format!("category '{name}' has {have} entries, generator needs {need}"),
        });
    }

    for (category, entries) in [
        ("spelling", &banks.spelling),
        ("grammar", &banks.grammar),
        ("fermi", &banks.fermi),
        ("units", &banks.units),
        ("causal", &banks.causal),
        ("bugs", &banks.bugs),
        ("assembly", &banks.assembly),
        ("science_facts", &banks.science_facts),
        ("geography_facts", &banks.geography_facts),
    ] {
        check_choice(category, entries, &mut warnings);
    }
    check_writing("micro_writing", &banks.micro_writing, &mut warnings);
    check_writing("generative", &banks.generative, &mut warnings);

    for (i, cloze) in banks.cloze.iter().enumerate() {
        let id = format!("cloze[{i}]");
        if cloze.options_per_blank.len() != cloze.correct_indices.len() {
            warnings.push(ValidationWarning::new(
                &id,
                format!(
                    "{} blanks but {} correct indices",
                    cloze.options_per_blank.len(),
                    cloze.correct_indices.len()
                ),
            ));
        }
        for (blank, (options, &idx)) in cloze
            .options_per_blank
            .iter()
            .zip(&cloze.correct_indices)
            .enumerate()
        {
            if idx >= options.len() {
                warnings.push(ValidationWarning::new(
                    &id,
                    format!("blank {} correct index {idx} out of range", blank + 1),
                ));
            }
        }
    }

    for (i, analogy) in banks.analogy.iter().enumerate() {
        if analogy.distractors.contains(&analogy.correct) {
            warnings.push(ValidationWarning::new(
                format!("analogy[{i}]"),
                "correct pair repeated as a distractor",
            ));
        }
    }

    for (i, proof) in banks.proofs.iter().enumerate() {
        if proof.steps.len() < 2 {
            warnings.push(ValidationWarning::new(
                format!("proofs[{i}]"),
                "a proof needs at least two steps",
            ));
        }
        if proof.distractor_explanations.contains(&proof.error_explanation) {
            warnings.push(ValidationWarning::new(
                format!("proofs[{i}]"),
                "error explanation repeated as a distractor",
            ));
        }
    }

    for (i, constant) in banks.constants.iter().enumerate() {
        let decimals = constant
            .value
            .split_once('.')
            .map_or(0, |(_, frac)| frac.len());
        if decimals < 15 {
            warnings.push(ValidationWarning::new(
                format!("constants[{i}]"),
                format!(
                    "'{}' stores {decimals} decimals; prompts may ask for 15",
                    constant.name
                ),
            ));
        }
    }

    for (i, mapping) in banks.isomorphisms.iter().enumerate() {
        if mapping.answer.trim().is_empty() {
            warnings.push(ValidationWarning::new(
                format!("isomorphisms[{i}]"),
                "answer is empty",
            ));
        }
    }

    warnings
}

/// Validate a tiered bank for common issues.
pub fn validate_tiered(bank: &TieredBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for entry in &bank.entries {
        if !seen_ids.insert(&entry.id) {
            warnings.push(ValidationWarning::new(
                &entry.id,
                format!("duplicate entry ID: {}", entry.id),
            ));
        }
    }

    for entry in &bank.entries {
        if entry.prompt.trim().is_empty() {
            warnings.push(ValidationWarning::new(&entry.id, "prompt is empty"));
        }
        if entry.tier == 0 {
            warnings.push(ValidationWarning::new(&entry.id, "tiers start at 1"));
        }
        match &entry.answer_key {
            AnswerKey::Choice { correct_index } if *correct_index >= entry.options.len() => {
                warnings.push(ValidationWarning::new(
                    &entry.id,
                    format!(
                        "correct_index {correct_index} out of range for {} options",
                        entry.options.len()
                    ),
                ));
            }
            AnswerKey::Numeric { tolerance, .. } if *tolerance < 0.0 => {
                warnings.push(ValidationWarning::new(&entry.id, "negative tolerance"));
            }
            _ => {}
        }
        if !shape_fits(entry.input_type, &entry.answer_key) {
            warnings.push(ValidationWarning::new(
                &entry.id,
                format!(
                    "{} key does not fit {:?} input",
                    entry.answer_key.shape(),
                    entry.input_type
                ),
            ));
        }
    }

    for code in SectionCode::ALL {
        let count = bank.section(code).len();
        if count == 1 {
            warnings.push(ValidationWarning {
                entry_id: None,
                message: format!("section {code} has a single entry; every tier falls back to it"),
            });
        }
    }

    warnings
}

fn shape_fits(input: InputType, key: &AnswerKey) -> bool {
    match key {
        // Sealed keys can stand for any scalar answer.
        AnswerKey::Hashed { .. } => !matches!(
            input,
            InputType::MultiSelect | InputType::MultiPart | InputType::Writing
        ),
        AnswerKey::Numeric { .. } => input == InputType::Numeric,
        AnswerKey::Choice { .. } => input == InputType::MultipleChoice,
        AnswerKey::MultiChoice { .. } => input == InputType::MultiSelect,
        AnswerKey::Sequence { .. } => matches!(input, InputType::Sequence | InputType::Text),
        AnswerKey::MultiPart { .. } => input == InputType::MultiPart,
        AnswerKey::Text { .. } => input == InputType::Text,
        AnswerKey::Writing { .. } => input == InputType::Writing,
    }
}
