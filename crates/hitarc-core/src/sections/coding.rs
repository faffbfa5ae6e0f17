//! Section H: bug finding, recursion tracing, assembly reading and a
//! parametric long-function trace.

use super::{choice_from_entry, shuffled_options};
use crate::banks::ContentBanks;
use crate::model::{AnswerKey, InputType, Item, ItemKind};
use crate::rng::SeededRng;

const ASSEMBLY_PROMPT: &str = "What value will be in the EAX register after this x86 assembly executes?";

pub fn generate(rng: &mut SeededRng, banks: &ContentBanks) -> Vec<Item> {
    let bug = rng.pick(&banks.bugs);
    let bug_item = choice_from_entry(rng, ItemKind::BugFinding, bug.prompt.clone(), bug);

    let trace = rng.pick(&banks.recursion);
    let trace_item = Item::new(
        rng.fragment(),
        ItemKind::RecursiveTrace,
        format!(
            "Trace the following {} function and determine the output for f({}).",
            trace.language, trace.input
        ),
        InputType::Numeric,
        AnswerKey::Numeric {
            expected: trace.expected as f64,
            tolerance: 0.0,
        },
    )
    .with_display(trace.code.clone(), Some(trace.language.as_str()));

    let assembly = rng.pick(&banks.assembly);
    let assembly_item = choice_from_entry(
        rng,
        ItemKind::AssemblyReading,
        ASSEMBLY_PROMPT.to_string(),
        assembly,
    );

    vec![bug_item, trace_item, assembly_item, long_function(rng)]
}

/// A modular fold whose parameters are drawn per plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModularFold {
    pub start: i64,
    pub factor: i64,
    pub modulus: i64,
    pub values: Vec<i64>,
}

impl ModularFold {
    fn step(&self, acc: i64, x: i64) -> i64 {
        if x % 2 == 0 {
            acc * self.factor - x
        } else {
            acc + x * self.factor
        }
    }

    /// Result with the accumulator normalised into `[0, modulus)` each step.
    pub fn run(&self) -> i64 {
        self.values
            .iter()
            .fold(self.start, |acc, &x| self.step(acc, x).rem_euclid(self.modulus))
    }

    /// Result if the remainder kept the dividend's sign, the usual slip.
    pub fn run_truncated(&self) -> i64 {
        self.values
            .iter()
            .fold(self.start, |acc, &x| self.step(acc, x) % self.modulus)
    }

    pub fn source(&self) -> String {
        format!(
            "function fold(values, m) {{
  let acc = {start};
  for (let i = 0; i < values.length; i++) {{
    const x = values[i];
    if (x % 2 === 0) {{
      acc = acc * {factor} - x;
    }} else {{
      acc = acc + x * {factor};
    }}
    acc = ((acc % m) + m) % m;
  }}
  return acc;
}}",
            start = self.start,
            factor = self.factor,
        )
    }
}

fn long_function(rng: &mut SeededRng) -> Item {
    let fold = ModularFold {
        start: rng.int(1, 9),
        factor: rng.int(2, 5),
        modulus: rng.int(7, 19),
        values: (0..6).map(|_| rng.int(-20, 20)).collect(),
    };
    let correct = fold.run();
    let m = fold.modulus;
    let mut distractors: Vec<String> = Vec::with_capacity(3);
    for candidate in [
        fold.run_truncated(),
        (correct + 1) % m,
        (correct + m - 1) % m,
        (correct + 2) % m,
    ] {
        let label = candidate.to_string();
        if candidate != correct && !distractors.contains(&label) && distractors.len() < 3 {
            distractors.push(label);
        }
    }
    let (options, correct_index) = shuffled_options(rng, correct.to_string(), distractors);
    let values = fold
        .values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",");

    Item::choice(
        rng.fragment(),
        ItemKind::LongFunction,
        format!(
            "Given the following javascript function, what is the output when called with values = [{values}] and m = {m}?"
        ),
        options,
        correct_index,
    )
    .with_display(fold.source(), Some("javascript"))
    .with_rationale(format!(
        "The accumulator is folded back into [0, m) after every step and ends at {correct}."
    ))
}
