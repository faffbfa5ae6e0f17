//! Section I: flash-then-recall tasks.
//!
//! Every item carries a [`FlashContent`] block that a client shows for
//! `display_ms` before revealing the prompt.

use crate::model::{AnswerKey, FlashContent, FlashKind, InputType, Item, ItemKind};
use crate::rng::SeededRng;

const PALETTE: [&str; 6] = ["red", "blue", "green", "yellow", "purple", "orange"];

const OBJECTS: [&str; 18] = [
    "book", "lamp", "chair", "key", "clock", "vase", "hat", "cup", "ring", "box", "pen", "star",
    "bell", "drum", "leaf", "gem", "coin", "mask",
];

const DIGITS: usize = 20;
const FACTS_SHOWN: usize = 18;
const FACTS_ASKED: usize = 4;
const COLOURS: usize = 14;

pub fn generate(rng: &mut SeededRng) -> Vec<Item> {
    vec![
        digit_span(rng),
        fact_retention(rng),
        sequence_recall(rng),
        speed_arithmetic(rng),
    ]
}

fn flash(kind: FlashKind, items: Vec<String>, display_ms: u64) -> FlashContent {
    FlashContent {
        kind,
        items,
        display_ms,
    }
}

fn digit_span(rng: &mut SeededRng) -> Item {
    let digits: Vec<String> = (0..DIGITS).map(|_| rng.int(0, 9).to_string()).collect();
    Item::new(
        rng.fragment(),
        ItemKind::DigitSpan,
        format!("A sequence of {DIGITS} digits will flash on screen. Memorize and type them back in order."),
        InputType::Text,
        AnswerKey::Sequence {
            expected: digits.clone(),
        },
    )
    .with_flash(flash(FlashKind::Digits, vec![digits.concat()], 3000))
}

struct Fact {
    colour: &'static str,
    number: i64,
    object: &'static str,
}

#[derive(Clone, Copy)]
enum Probe {
    Colour,
    Number,
    Object,
}

fn fact_retention(rng: &mut SeededRng) -> Item {
    let objects = rng.pick_n(&OBJECTS, FACTS_SHOWN);
    let facts: Vec<Fact> = objects
        .into_iter()
        .map(|object| Fact {
            colour: *rng.pick(&PALETTE),
            number: rng.int(1, 999),
            object,
        })
        .collect();
    let statements: Vec<String> = facts
        .iter()
        .map(|f| format!("The {} {} has the number {}.", f.colour, f.object, f.number))
        .collect();

    let asked: Vec<usize> = rng.pick_n(&(0..facts.len()).collect::<Vec<_>>(), FACTS_ASKED);
    let probes = rng.shuffle(&[Probe::Colour, Probe::Number, Probe::Object, Probe::Number]);

    let mut questions = Vec::with_capacity(FACTS_ASKED);
    let mut expected = Vec::with_capacity(FACTS_ASKED);
    for (&idx, probe) in asked.iter().zip(probes) {
        let fact = &facts[idx];
        let (question, answer) = match probe {
            Probe::Colour => (
                format!("What color was the {}?", fact.object),
                fact.colour.to_string(),
            ),
            Probe::Number => (
                format!(
                    "What number was associated with the {} {}?",
                    fact.colour, fact.object
                ),
                fact.number.to_string(),
            ),
            Probe::Object => (
                format!(
                    "Which object was {} and had the number {}?",
                    fact.colour, fact.number
                ),
                fact.object.to_string(),
            ),
        };
        questions.push(question);
        expected.push(answer);
    }

    let mut item = Item::new(
        rng.fragment(),
        ItemKind::FactRetention,
        "Study the following facts carefully. You will be asked questions about them.",
        InputType::MultiPart,
        AnswerKey::MultiPart { expected },
    )
    .with_flash(flash(FlashKind::Facts, statements, 20_000));
    item.sub_questions = questions;
    item
}

fn sequence_recall(rng: &mut SeededRng) -> Item {
    let colours: Vec<String> = (0..COLOURS)
        .map(|_| (*rng.pick(&PALETTE)).to_string())
        .collect();
    Item::new(
        rng.fragment(),
        ItemKind::SequenceRecall,
        format!("A sequence of {COLOURS} colors will flash one at a time. Recall the exact order."),
        InputType::Sequence,
        AnswerKey::Sequence {
            expected: colours.clone(),
        },
    )
    .with_flash(flash(FlashKind::Colors, colours, 14_000))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "×",
        }
    }

    fn apply(self, a: i64, b: i64) -> i64 {
        match self {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::Mul => a * b,
        }
    }
}

/// `a op1 b op2 c` with multiplication binding tighter.
fn evaluate(a: i64, op1: Op, b: i64, op2: Op, c: i64) -> i64 {
    match (op1, op2) {
        (Op::Mul, _) => op2.apply(a * b, c),
        (_, Op::Mul) => op1.apply(a, b * c),
        _ => op2.apply(op1.apply(a, b), c),
    }
}

fn speed_arithmetic(rng: &mut SeededRng) -> Item {
    const OPS: [Op; 3] = [Op::Add, Op::Sub, Op::Mul];
    let a = rng.int(10, 99);
    let b = rng.int(10, 99);
    let c = rng.int(2, 30);
    let op1 = *rng.pick(&OPS);
    let op2 = *rng.pick(&OPS);
    let expression = format!("{a} {} {b} {} {c}", op1.symbol(), op2.symbol());

    Item::new(
        rng.fragment(),
        ItemKind::SpeedArithmetic,
        "A math expression will flash briefly. Compute the answer from memory.",
        InputType::Numeric,
        AnswerKey::Numeric {
            expected: evaluate(a, op1, b, op2, c) as f64,
            tolerance: 0.0,
        },
    )
    .with_flash(flash(FlashKind::Expression, vec![expression], 1500))
}
