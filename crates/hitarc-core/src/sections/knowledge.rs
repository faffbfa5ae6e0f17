//! Section J: recall of facts and constants, cross-domain structure and
//! centre-embedded parsing.

use super::choice_from_entry;
use crate::banks::{ConstantEntry, ContentBanks};
use crate::model::{AnswerKey, InputType, Item, ItemKind, KeywordPolicy};
use crate::rng::SeededRng;

pub fn generate(rng: &mut SeededRng, banks: &ContentBanks) -> Vec<Item> {
    let science = rng.pick(&banks.science_facts);
    let science_item = choice_from_entry(rng, ItemKind::ScienceFact, science.prompt.clone(), science);

    let geography = rng.pick(&banks.geography_facts);
    let geography_item =
        choice_from_entry(rng, ItemKind::GeographyFact, geography.prompt.clone(), geography);

    let event = rng.pick(&banks.historical_events);
    let history_item = Item::new(
        rng.fragment(),
        ItemKind::HistoricalDate,
        format!("In what year did the following event occur?\n\n\"{}\"", event.event),
        InputType::Numeric,
        AnswerKey::Numeric {
            expected: f64::from(event.year),
            tolerance: 1.0,
        },
    );

    let constant = rng.pick(&banks.constants);
    let places = rng.int(10, 15) as usize;
    let constant_item = Item::new(
        rng.fragment(),
        ItemKind::MathConstant,
        format!(
            "What is the value of {} ({}) to {places} decimal places?",
            constant.name, constant.symbol
        ),
        InputType::Text,
        AnswerKey::text(truncate_decimals(constant, places)),
    );

    let mapping = rng.pick(&banks.isomorphisms);
    let mapping_item = Item::new(
        rng.fragment(),
        ItemKind::CrossDomainMapping,
        format!(
            "In {}, \"{}\" refers to the following:\n\n{}\n\nWhat is the structurally analogous concept in {}?",
            mapping.source_field, mapping.source_concept, mapping.source_description, mapping.target_field
        ),
        InputType::Text,
        AnswerKey::Text {
            canonical: mapping.answer.clone(),
            alternatives: Vec::new(),
            keywords: mapping.keywords.clone(),
            keyword_policy: KeywordPolicy::Any,
        },
    );

    let embedding = rng.pick(&banks.embeddings);
    let embedding_item = Item::new(
        rng.fragment(),
        ItemKind::CenterEmbedding,
        format!("Read the sentence:\n\n\"{}\"\n\n{}", embedding.text, embedding.question),
        InputType::Text,
        AnswerKey::Text {
            canonical: embedding.answer.clone(),
            alternatives: embedding.alternatives.clone(),
            keywords: Vec::new(),
            keyword_policy: KeywordPolicy::Any,
        },
    );

    vec![
        science_item,
        geography_item,
        history_item,
        constant_item,
        mapping_item,
        embedding_item,
    ]
}

/// Cut a stored constant to `places` decimals without rounding.
fn truncate_decimals(constant: &ConstantEntry, places: usize) -> String {
    let value = constant.value.as_str();
    match value.find('.') {
        Some(dot) => value.get(..dot + 1 + places).unwrap_or(value).to_string(),
        None => value.to_string(),
    }
}
