//! Section F: short constrained writing.

use super::language::writing_item;
use crate::banks::ContentBanks;
use crate::model::{Item, ItemKind};
use crate::rng::SeededRng;

pub fn generate(rng: &mut SeededRng, banks: &ContentBanks) -> Vec<Item> {
    let count = (rng.int(3, 5) as usize).min(banks.generative.len());
    let templates = rng.shuffle(&banks.generative);
    templates
        .iter()
        .take(count)
        .map(|entry| writing_item(rng, ItemKind::ConstrainedWriting, entry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerKey, WritingLimit};

    #[test]
    fn between_three_and_five_items() {
        let banks = ContentBanks::builtin().unwrap();
        for seed in 0..100 {
            let items = generate(&mut SeededRng::new(&format!("gen-{seed}")), &banks);
            assert!((3..=5).contains(&items.len()), "{}", items.len());
            let mut prompts: Vec<&str> = items.iter().map(|i| i.prompt.as_str()).collect();
            prompts.sort_unstable();
            prompts.dedup();
            assert_eq!(prompts.len(), items.len());
        }
    }

    #[test]
    fn small_bank_caps_count() {
        let mut banks = ContentBanks::builtin().unwrap();
        banks.generative.truncate(3);
        for seed in 0..50 {
            let items = generate(&mut SeededRng::new(&format!("gen-{seed}")), &banks);
            assert_eq!(items.len(), 3);
        }
    }

    #[test]
    fn items_carry_sentence_limits() {
        let banks = ContentBanks::builtin().unwrap();
        for item in generate(&mut SeededRng::new("gen-limits"), &banks) {
            let Some(AnswerKey::Writing { limit, .. }) = item.answer_key else {
                panic!("generative items carry writing keys");
            };
            assert!(matches!(limit, WritingLimit::MaxSentences(_)));
        }
    }
}
