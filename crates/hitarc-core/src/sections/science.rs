//! Section E: Fermi estimates, dimensional analysis and causal traps.

use super::choice_from_entry;
use crate::banks::{ChoiceEntry, ContentBanks};
use crate::model::{Item, ItemKind};
use crate::rng::SeededRng;

const PER_CATEGORY: usize = 2;

pub fn generate(rng: &mut SeededRng, banks: &ContentBanks) -> Vec<Item> {
    let fermi = choose(rng, &banks.fermi);
    let units = choose(rng, &banks.units);
    let causal = choose(rng, &banks.causal);

    let templates = fermi
        .iter()
        .map(|e| (ItemKind::Fermi, e))
        .chain(units.iter().map(|e| (ItemKind::Units, e)))
        .chain(causal.iter().map(|e| (ItemKind::Causal, e)));
    templates
        .map(|(kind, entry)| choice_from_entry(rng, kind, entry.prompt.clone(), entry))
        .collect()
}

fn choose(rng: &mut SeededRng, bank: &[ChoiceEntry]) -> Vec<ChoiceEntry> {
    rng.shuffle(bank).into_iter().take(PER_CATEGORY).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerKey;

    #[test]
    fn two_of_each_category() {
        let banks = ContentBanks::builtin().unwrap();
        let items = generate(&mut SeededRng::namespaced("science-", "seed"), &banks);
        let kinds: Vec<ItemKind> = items.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ItemKind::Fermi,
                ItemKind::Fermi,
                ItemKind::Units,
                ItemKind::Units,
                ItemKind::Causal,
                ItemKind::Causal,
            ]
        );
        assert_ne!(items[0].prompt, items[1].prompt);
    }

    #[test]
    fn keys_point_at_bank_answer() {
        let banks = ContentBanks::builtin().unwrap();
        let all: Vec<&ChoiceEntry> = banks
            .fermi
            .iter()
            .chain(&banks.units)
            .chain(&banks.causal)
            .collect();
        for seed in 0..200 {
            for item in generate(&mut SeededRng::new(&format!("science-{seed}")), &banks) {
                let entry = all.iter().find(|e| e.prompt == item.prompt).unwrap();
                let Some(AnswerKey::Choice { correct_index }) = item.answer_key else {
                    panic!("science items are multiple choice");
                };
                assert_eq!(item.options[correct_index], entry.correct);
            }
        }
    }
}
