//! Section A: spelling, cloze, analogies, grammar and a micro-writing task.

use super::{choice_from_entry, shuffled_options};
use crate::banks::{ClozeEntry, ContentBanks, WritingEntry};
use crate::model::{locate, AnswerKey, InputType, Item, ItemKind, WritingConstraints};
use crate::rng::SeededRng;

const SPELLING_ITEMS: usize = 3;
const CLOZE_ITEMS: usize = 3;
const ANALOGY_ITEMS: usize = 2;

pub fn generate(rng: &mut SeededRng, banks: &ContentBanks) -> Vec<Item> {
    let spelling = rng.shuffle(&banks.spelling);
    let cloze = rng.shuffle(&banks.cloze);
    let analogies = rng.shuffle(&banks.analogy);
    let micro = rng.pick(&banks.micro_writing).clone();
    let grammar = rng.pick(&banks.grammar).clone();

    let mut items = Vec::new();
    for entry in spelling.iter().take(SPELLING_ITEMS) {
        items.push(choice_from_entry(
            rng,
            ItemKind::Spelling,
            entry.prompt.clone(),
            entry,
        ));
    }
    for entry in cloze.iter().take(CLOZE_ITEMS) {
        items.push(cloze_item(rng, entry));
    }
    for entry in analogies.iter().take(ANALOGY_ITEMS) {
        let render = |pair: &[String; 2]| format!("{} : {}", pair[0], pair[1]);
        let (options, correct_index) = shuffled_options(
            rng,
            render(&entry.correct),
            entry.distractors.iter().map(render).collect(),
        );
        let prompt = format!(
            "{}\n\n{} : {} :: ?",
            entry.prompt, entry.stem[0], entry.stem[1]
        );
        items.push(
            Item::choice(rng.fragment(), ItemKind::Analogy, prompt, options, correct_index)
                .with_rationale(entry.explanation.clone()),
        );
    }
    items.push(writing_item(rng, ItemKind::MicroWriting, &micro));

    let prompt = format!(
        "Identify the grammatical violation in this sentence:\n\n\"{}\"",
        grammar.prompt
    );
    items.push(choice_from_entry(rng, ItemKind::GrammarRule, prompt, &grammar));
    items
}

/// Each blank's options are shuffled independently and its key remapped.
fn cloze_item(rng: &mut SeededRng, entry: &ClozeEntry) -> Item {
    let fragment = rng.fragment();
    let mut blank_options = Vec::with_capacity(entry.options_per_blank.len());
    let mut correct_indices = Vec::with_capacity(entry.options_per_blank.len());
    for (options, &correct) in entry.options_per_blank.iter().zip(&entry.correct_indices) {
        let shuffled = rng.shuffle(options);
        correct_indices.push(locate(&shuffled, &options[correct]));
        blank_options.push(shuffled);
    }

    let mut item = Item::new(
        fragment,
        ItemKind::Cloze,
        format!("{}\n\n{}", entry.prompt, entry.text),
        InputType::MultiSelect,
        AnswerKey::MultiChoice { correct_indices },
    )
    .with_rationale(entry.explanation.clone());
    item.blank_options = blank_options;
    item
}

/// Writing item shared with the generative section.
pub(crate) fn writing_item(rng: &mut SeededRng, kind: ItemKind, entry: &WritingEntry) -> Item {
    Item::new(
        rng.fragment(),
        kind,
        entry.prompt.clone(),
        InputType::Writing,
        AnswerKey::Writing {
            limit: entry.limit,
            must_include: entry.must_include.clone(),
            min_coherence: entry.min_coherence,
        },
    )
    .with_constraints(WritingConstraints {
        limit: entry.limit,
        must_include: entry.must_include.clone(),
        style_hint: entry.style_hint.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banks() -> ContentBanks {
        ContentBanks::builtin().unwrap()
    }

    #[test]
    fn ten_items_in_fixed_order() {
        let items = generate(&mut SeededRng::namespaced("lang-", "seed"), &banks());
        let kinds: Vec<ItemKind> = items.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ItemKind::Spelling,
                ItemKind::Spelling,
                ItemKind::Spelling,
                ItemKind::Cloze,
                ItemKind::Cloze,
                ItemKind::Cloze,
                ItemKind::Analogy,
                ItemKind::Analogy,
                ItemKind::MicroWriting,
                ItemKind::GrammarRule,
            ]
        );
    }

    #[test]
    fn spelling_key_points_at_correct_spelling() {
        let banks = banks();
        for seed in 0..300 {
            let items = generate(&mut SeededRng::new(&format!("lang-{seed}")), &banks);
            for item in items.iter().filter(|i| i.kind == ItemKind::Spelling) {
                let Some(AnswerKey::Choice { correct_index }) = item.answer_key else {
                    panic!("spelling is multiple choice");
                };
                let entry = banks.spelling.iter().find(|e| e.prompt == item.prompt).unwrap();
                assert_eq!(item.options[correct_index], entry.correct);
            }
        }
    }

    #[test]
    fn cloze_indices_are_remapped_after_shuffle() {
        let banks = banks();
        for seed in 0..300 {
            let items = generate(&mut SeededRng::new(&format!("lang-{seed}")), &banks);
            for item in items.iter().filter(|i| i.kind == ItemKind::Cloze) {
                let entry = banks
                    .cloze
                    .iter()
                    .find(|e| item.prompt.ends_with(&e.text))
                    .unwrap();
                let Some(AnswerKey::MultiChoice { correct_indices }) = &item.answer_key else {
                    panic!("cloze carries multi-choice keys");
                };
                for (blank, (&orig, &shuffled)) in entry
                    .correct_indices
                    .iter()
                    .zip(correct_indices)
                    .enumerate()
                {
                    assert_eq!(
                        item.blank_options[blank][shuffled],
                        entry.options_per_blank[blank][orig]
                    );
                }
            }
        }
    }

    #[test]
    fn spelling_items_are_distinct() {
        let items = generate(&mut SeededRng::new("lang-distinct"), &banks());
        let mut prompts: Vec<&str> = items
            .iter()
            .filter(|i| i.kind == ItemKind::Spelling)
            .map(|i| i.prompt.as_str())
            .collect();
        prompts.sort_unstable();
        prompts.dedup();
        assert_eq!(prompts.len(), 3);
    }

    #[test]
    fn micro_writing_has_constraints_and_key() {
        let items = generate(&mut SeededRng::new("lang-w"), &banks());
        let micro = items.iter().find(|i| i.kind == ItemKind::MicroWriting).unwrap();
        assert_eq!(micro.input_type, InputType::Writing);
        assert!(micro.constraints.is_some());
        assert!(matches!(micro.answer_key, Some(AnswerKey::Writing { .. })));
    }
}
