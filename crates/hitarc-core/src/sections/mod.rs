//! One generator per assessment section.
//!
//! Generators are pure functions of a caller-owned [`SeededRng`] and the
//! content banks. Each consumes the stream in a fixed order, so the same seed
//! and the same banks always produce the same items.

pub mod arithmetic;
pub mod coding;
pub mod generative;
pub mod grid;
pub mod knowledge;
pub mod language;
pub mod math;
pub mod memory;
pub mod perception;
pub mod science;

use crate::banks::{ChoiceEntry, ContentBanks};
use crate::error::AssessmentError;
use crate::model::{locate, Item, ItemKind, Section, SectionCode};
use crate::rng::{round_dp, SeededRng};

/// Run the generator for `code`, returning the assembled section.
pub fn generate_section(
    code: SectionCode,
    rng: &mut SeededRng,
    banks: &ContentBanks,
) -> Result<Section, AssessmentError> {
    banks.check_section(code)?;
    let items = match code {
        SectionCode::A => language::generate(rng, banks),
        SectionCode::B => arithmetic::generate(rng),
        SectionCode::C => grid::generate(rng),
        SectionCode::D => perception::generate(rng),
        SectionCode::E => science::generate(rng, banks),
        SectionCode::F => generative::generate(rng, banks),
        SectionCode::G => math::generate(rng, banks),
        SectionCode::H => coding::generate(rng, banks),
        SectionCode::I => memory::generate(rng),
        SectionCode::J => knowledge::generate(rng, banks),
    };
    tracing::debug!(section = %code, items = items.len(), "generated section");
    Ok(Section::new(code, items))
}

/// Shuffle `[correct, ...distractors]` and locate the correct value.
pub(crate) fn shuffled_options(
    rng: &mut SeededRng,
    correct: String,
    distractors: Vec<String>,
) -> (Vec<String>, usize) {
    let mut pool = Vec::with_capacity(distractors.len() + 1);
    pool.push(correct.clone());
    pool.extend(distractors);
    let options = rng.shuffle(&pool);
    let idx = locate(&options, &correct);
    (options, idx)
}

/// Multiple-choice item from a bank template. Draws the shuffle, then the id.
pub(crate) fn choice_from_entry(
    rng: &mut SeededRng,
    kind: ItemKind,
    prompt: String,
    entry: &ChoiceEntry,
) -> Item {
    let (options, correct_index) =
        shuffled_options(rng, entry.correct.clone(), entry.distractors.clone());
    let mut item = Item::choice(rng.fragment(), kind, prompt, options, correct_index);
    if let Some(display) = &entry.display {
        item = item.with_display(display.clone(), entry.language.as_deref());
    }
    if !entry.rationale.is_empty() {
        item = item.with_rationale(entry.rationale.clone());
    }
    item
}

/// Render a number the way it is shown in options: shortest form, no `-0`.
pub(crate) fn render_number(value: f64) -> String {
    format!("{}", value + 0.0)
}

/// Round every value to `dp` places and nudge later duplicates upward by one
/// unit in the last place until all labels differ.
pub(crate) fn distinct_numbers(values: Vec<f64>, dp: u32) -> Vec<f64> {
    let step = 10f64.powi(-(dp as i32));
    let mut out: Vec<f64> = Vec::with_capacity(values.len());
    for value in values {
        let mut v = round_dp(value, dp);
        while out.iter().any(|&o| render_number(o) == render_number(v)) {
            v = round_dp(v + step, dp);
        }
        out.push(v);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::model::AnswerKey;

    #[test]
    fn shuffled_options_track_correct_value() {
        for seed in 0..1000 {
            let mut rng = SeededRng::new(&format!("opts-{seed}"));
            let (options, idx) = shuffled_options(
                &mut rng,
                "right".into(),
                vec!["w1".into(), "w2".into(), "w3".into()],
            );
            assert_eq!(options[idx], "right");
            assert_eq!(options.len(), 4);
        }
    }

    #[test]
    fn distinct_numbers_nudges() {
        assert_eq!(distinct_numbers(vec![1.0, 1.0, 2.0], 0), vec![1.0, 2.0, 3.0]);
        assert_eq!(
            distinct_numbers(vec![3.0, 3.001, 3.01], 2),
            vec![3.0, 3.01, 3.02]
        );
        assert_eq!(render_number(-0.0), "0");
        assert_eq!(render_number(2.5), "2.5");
    }

    #[test]
    fn every_section_generates_with_builtin_bank() {
        let banks = ContentBanks::builtin().unwrap();
        for code in SectionCode::ALL {
            let mut rng = SeededRng::namespaced(code.namespace(), "all-sections");
            let section = generate_section(code, &mut rng, &banks).unwrap();
            assert!(!section.items.is_empty(), "section {code} is empty");
            assert!(section.items.iter().all(|i| i.section == code));
        }
    }

    /// Option text the key must select, rebuilt from the bank entry or the
    /// values the generator narrates.
    fn keyed_value(item: &Item, banks: &ContentBanks) -> String {
        let offered: BTreeSet<&str> = item.options.iter().map(String::as_str).collect();
        let from_bank = |bank: &[ChoiceEntry]| {
            bank.iter()
                .find(|e| {
                    let mut set: BTreeSet<&str> =
                        e.distractors.iter().map(String::as_str).collect();
                    set.insert(&e.correct);
                    set == offered
                })
                .map(|e| e.correct.clone())
                .unwrap_or_else(|| panic!("no bank entry offers {:?}", item.options))
        };
        let rationale = item.rationale.as_deref().unwrap_or_default();
        match item.kind {
            ItemKind::Spelling => from_bank(&banks.spelling),
            ItemKind::GrammarRule => from_bank(&banks.grammar),
            ItemKind::Fermi => from_bank(&banks.fermi),
            ItemKind::Units => from_bank(&banks.units),
            ItemKind::Causal => from_bank(&banks.causal),
            ItemKind::BugFinding => from_bank(&banks.bugs),
            ItemKind::AssemblyReading => from_bank(&banks.assembly),
            ItemKind::ScienceFact => from_bank(&banks.science_facts),
            ItemKind::GeographyFact => from_bank(&banks.geography_facts),
            ItemKind::Analogy => {
                let render = |pair: &[String; 2]| format!("{} : {}", pair[0], pair[1]);
                banks
                    .analogy
                    .iter()
                    .find(|e| {
                        let mut set: BTreeSet<String> =
                            e.distractors.iter().map(render).collect();
                        set.insert(render(&e.correct));
                        set.iter().map(String::as_str).eq(offered.iter().copied())
                    })
                    .map(|e| render(&e.correct))
                    .unwrap_or_else(|| panic!("no analogy offers {:?}", item.options))
            }
            ItemKind::ProofError => banks
                .proofs
                .iter()
                .find(|p| {
                    let mut set: BTreeSet<&str> =
                        p.distractor_explanations.iter().map(String::as_str).collect();
                    set.insert(&p.error_explanation);
                    set == offered
                })
                .map(|p| p.error_explanation.clone())
                .unwrap_or_else(|| panic!("no proof offers {:?}", item.options)),
            ItemKind::Grid => grid::GridRule::ALL
                .iter()
                .find(|rule| rule.prompt() == item.prompt)
                .map(|rule| rule.descriptions()[0].to_string())
                .unwrap_or_else(|| panic!("no grid rule asks {:?}", item.prompt)),
            ItemKind::DefiniteIntegral => {
                let exact: f64 = rationale
                    .trim_start_matches("The exact value is ")
                    .trim_end_matches('.')
                    .parse()
                    .unwrap();
                render_number(round_dp(exact, 2))
            }
            ItemKind::LongFunction => rationale
                .rsplit("ends at ")
                .next()
                .unwrap()
                .trim_end_matches('.')
                .to_string(),
            ItemKind::Perception => {
                let named: Vec<&String> = item
                    .options
                    .iter()
                    .filter(|o| rationale.contains(o.as_str()))
                    .collect();
                assert_eq!(named.len(), 1, "{rationale:?} names {named:?}");
                named[0].clone()
            }
            other => panic!("unexpected multiple-choice kind {other:?}"),
        }
    }

    #[test]
    fn answer_positions_hold_over_many_seeds() {
        let banks = ContentBanks::builtin().unwrap();
        for seed in 0..1000 {
            for code in SectionCode::ALL {
                let mut rng = SeededRng::namespaced(code.namespace(), &seed.to_string());
                let section = generate_section(code, &mut rng, &banks).unwrap();
                for item in &section.items {
                    match &item.answer_key {
                        Some(AnswerKey::Choice { correct_index }) => {
                            assert_eq!(
                                item.options[*correct_index],
                                keyed_value(item, &banks),
                                "seed {seed}: {item:?}"
                            );
                        }
                        Some(AnswerKey::MultiChoice { correct_indices }) => {
                            let entry = banks
                                .cloze
                                .iter()
                                .find(|e| item.prompt.ends_with(&e.text))
                                .unwrap_or_else(|| panic!("no cloze entry for {item:?}"));
                            assert_eq!(correct_indices.len(), item.blank_options.len());
                            for (blank, (&idx, (bank_options, &bank_idx))) in
                                item.blank_options.iter().zip(
                                    correct_indices
                                        .iter()
                                        .zip(entry.options_per_blank.iter().zip(&entry.correct_indices)),
                                )
                            {
                                assert_eq!(blank[idx], bank_options[bank_idx], "seed {seed}");
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}
