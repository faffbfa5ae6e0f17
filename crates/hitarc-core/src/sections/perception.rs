//! Section D: recall one detail from a dense narrated scene.
//!
//! Six scenario builders exist; five are chosen per plan. Every builder
//! derives its correct answer from the same values it narrates.

use super::shuffled_options;
use crate::model::{Item, ItemKind};
use crate::rng::SeededRng;

const ITEMS: usize = 5;

struct Scenario {
    scene: String,
    question: &'static str,
    options: Vec<String>,
    correct_index: usize,
    rationale: String,
}

type Builder = fn(&mut SeededRng) -> Scenario;

const BUILDERS: [Builder; 6] = [pulse, drone, glyph, thermal, matrix_glitch, channel];

pub fn generate(rng: &mut SeededRng) -> Vec<Item> {
    let builders = rng.shuffle(&BUILDERS);
    builders
        .into_iter()
        .take(ITEMS)
        .map(|build| {
            let scenario = build(rng);
            Item::choice(
                rng.fragment(),
                ItemKind::Perception,
                format!("{}\n\n{}", scenario.scene, scenario.question),
                scenario.options,
                scenario.correct_index,
            )
            .with_rationale(scenario.rationale)
        })
        .collect()
}

fn ordinal(index: usize) -> String {
    const WORDS: [&str; 7] = ["first", "second", "third", "fourth", "fifth", "sixth", "seventh"];
    WORDS
        .get(index)
        .map_or_else(|| format!("{}th", index + 1), |w| (*w).to_string())
}

fn coordinate(row: usize, col: usize) -> String {
    format!("({},{})", row + 1, col + 1)
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Shuffle `labels` except `skip`, keep the first three.
fn three_others(rng: &mut SeededRng, labels: &[String], skip: usize) -> Vec<String> {
    let others: Vec<String> = labels
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != skip)
        .map(|(_, l)| l.clone())
        .collect();
    rng.shuffle(&others).into_iter().take(3).collect()
}

fn pulse(rng: &mut SeededRng) -> Scenario {
    let colors = rng.shuffle(&[
        "amber",
        "cobalt",
        "cerise",
        "chartreuse",
        "ultramarine",
        "vermillion",
        "saffron",
    ]);
    let amplitudes = rng.shuffle(&["0.6 kPa", "0.8 kPa", "1.1 kPa", "1.4 kPa", "1.7 kPa", "2.1 kPa"]);
    let count = 5 + rng.index(2);
    let pulses: Vec<(String, &str, &str)> = (0..count)
        .map(|i| {
            (
                format!("τ{}", i + 1),
                colors[i % colors.len()],
                amplitudes[i % amplitudes.len()],
            )
        })
        .collect();
    let tone = rng.index(pulses.len());
    let magnitude = pulses[tone].2;
    let sequence = pulses
        .iter()
        .map(|(l, c, m)| format!("{l} {c} ({m})"))
        .collect::<Vec<_>>()
        .join(", ");
    let labels: Vec<String> = pulses.iter().map(|(l, c, _)| format!("{l} • {c}")).collect();
    let distractors = three_others(rng, &labels, tone);
    let (options, correct_index) = shuffled_options(rng, labels[tone].clone(), distractors);

    Scenario {
        scene: format!(
            "A telemetry ribbon streams {count} pulses labelled τ1–τ{count}: {sequence}. Only one pulse crosses the sync threshold, emitting the distinctive chime at {magnitude}."
        ),
        question: "Which pulse triggered the sync tone?",
        options,
        correct_index,
        rationale: format!(
            "{} alone exceeded the sync threshold, as narrated in the sequence description.",
            labels[tone]
        ),
    }
}

fn drone(rng: &mut SeededRng) -> Scenario {
    let directions = rng.shuffle(&["north", "east", "south", "west"]);
    let beacons = rng.shuffle(&["amber beacon", "violet strobe", "infrared wash", "cobalt bar"]);
    let behaviours = rng.shuffle(&[
        "holds altitude",
        "yaws 12° left",
        "drops 3 m then recovers",
        "runs a diagnostic spin",
    ]);
    let anomaly = rng.index(directions.len());
    let lines = directions
        .iter()
        .enumerate()
        .map(|(i, d)| {
            format!(
                "{} drone flashes the {} and {}.",
                capitalise(d),
                beacons[i],
                behaviours[i]
            )
        })
        .collect::<Vec<_>>()
        .join(" ");
    let labels: Vec<String> = directions
        .iter()
        .enumerate()
        .map(|(i, d)| format!("{} • {}", d.to_uppercase(), beacons[i]))
        .collect();
    // Remaining directions in order, no shuffle.
    let distractors: Vec<String> = labels
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != anomaly)
        .map(|(_, l)| l.clone())
        .take(3)
        .collect();
    let (options, correct_index) = shuffled_options(rng, labels[anomaly].clone(), distractors);

    Scenario {
        scene: format!(
            "Four drones hold a square surveillance stack. {lines} The operator flags the drone that initiated the emergency yaw routine."
        ),
        question: "Which drone executed the emergency yaw?",
        options,
        correct_index,
        rationale: format!(
            "The drone at {} alone performed the emergency yaw.",
            labels[anomaly]
        ),
    }
}

fn glyph(rng: &mut SeededRng) -> Scenario {
    let glyphs = rng.shuffle(&["triangle", "rhombus", "pentagon", "spiral", "hexagon", "hourglass"]);
    let accents = rng.shuffle(&["glowing", "outlined", "shadowed", "striped", "blinking", "translucent"]);
    let sequence: Vec<(&str, &str)> = (0..6).map(|i| (glyphs[i], accents[i])).collect();
    let removed = rng.index(sequence.len());
    let stream = sequence
        .iter()
        .enumerate()
        .map(|(i, (g, a))| format!("{} glyph {a} {g}", ordinal(i)))
        .collect::<Vec<_>>()
        .join("; ");
    let labels: Vec<String> = sequence
        .iter()
        .enumerate()
        .map(|(i, (g, a))| format!("{} • {a} {g}", ordinal(i)))
        .collect();
    let distractors = three_others(rng, &labels, removed);
    let (options, correct_index) = shuffled_options(rng, labels[removed].clone(), distractors);

    Scenario {
        scene: format!(
            "A glyph carousel flashes six symbols in 400 ms sweeps: {stream}. The third sweep removes one glyph altogether before the loop restarts."
        ),
        question: "Which glyph vanished during the sweep?",
        options,
        correct_index,
        rationale: format!("The removed glyph is {}.", labels[removed]),
    }
}

fn thermal(rng: &mut SeededRng) -> Scenario {
    let length = 5 + rng.index(2);
    let mut row = rng.index(2);
    let mut col = rng.index(2);
    let mut path = Vec::with_capacity(length);
    for step in 0..length {
        if step > 0 {
            if rng.index(2) == 0 {
                row += 1;
            } else {
                col += 1;
            }
        }
        path.push((row, col));
    }
    let trigger = path.len() - 1;
    let narrative = path
        .iter()
        .enumerate()
        .map(|(i, &(r, c))| {
            let prefix = if i == trigger { "cooling fan engage at " } else { "" };
            format!("{prefix}{}", coordinate(r, c))
        })
        .collect::<Vec<_>>()
        .join(" → ");
    let labels: Vec<String> = path
        .iter()
        .enumerate()
        .map(|(i, &(r, c))| {
            let tag = if i == trigger { "Vent" } else { "Footstep" };
            format!("{tag} • {}", coordinate(r, c))
        })
        .collect();
    let distractors = three_others(rng, &labels, trigger);
    let correct = labels[trigger].clone();
    let (options, correct_index) = shuffled_options(rng, correct.clone(), distractors);

    Scenario {
        scene: format!(
            "Thermal residue footprints are logged as the specimen crosses the deck: {narrative}. Ventilation activates precisely when the final hot print lands."
        ),
        question: "At which coordinate did the fan activate?",
        options,
        correct_index,
        rationale: format!("The cooling event is tied to the last logged coordinate {correct}."),
    }
}

fn matrix_glitch(rng: &mut SeededRng) -> Scenario {
    const DIMENSION: usize = 4;
    let failed_row = rng.index(DIMENSION);
    let failed_col = rng.index(DIMENSION);
    let cycles = rng.shuffle(&["all-on", "alternating", "checkerboard", "columnar pulse"]);
    let failed = coordinate(failed_row, failed_col);
    let correct = format!("Diode • {failed}");

    let mut distractors: Vec<String> = Vec::with_capacity(3);
    while distractors.len() < 3 {
        let label = format!(
            "Diode • {}",
            coordinate(rng.index(DIMENSION), rng.index(DIMENSION))
        );
        if label != correct && !distractors.contains(&label) {
            distractors.push(label);
        }
    }
    let (options, correct_index) = shuffled_options(rng, correct.clone(), distractors);

    Scenario {
        scene: format!(
            "A {DIMENSION}×{DIMENSION} light matrix cycles {} before one diode hard-fails. During cycle five the diode at {failed} drops to zero while the rest continue their programmed states.",
            cycles.join(" → ")
        ),
        question: "Which diode failed during the glitch cycle?",
        options,
        correct_index,
        rationale: format!("Cycle narration names {correct} as the diode that collapsed to zero."),
    }
}

fn channel(rng: &mut SeededRng) -> Scenario {
    let channels = rng.shuffle(&["Alpha", "Beta", "Gamma", "Delta"]);
    let deviations = rng.shuffle(&["+4.2σ", "+1.3σ", "-0.9σ", "+2.1σ"]);
    let floors = rng.shuffle(&["-64 dB", "-68 dB", "-59 dB", "-71 dB"]);
    let spike = rng.index(channels.len());
    let log = channels
        .iter()
        .enumerate()
        .map(|(i, ch)| format!("{ch} channel idled at {} then drifted {}.", floors[i], deviations[i]))
        .collect::<Vec<_>>()
        .join(" ");
    let labels: Vec<String> = channels
        .iter()
        .enumerate()
        .map(|(i, ch)| format!("{ch} • {}", deviations[i]))
        .collect();
    let distractors = three_others(rng, &labels, spike);
    let (options, correct_index) = shuffled_options(rng, labels[spike].clone(), distractors);

    Scenario {
        scene: format!(
            "Console log: {log} The overlay arrows the channel breaching the escalation threshold."
        ),
        question: "Which channel breached the escalation threshold?",
        options,
        correct_index,
        rationale: format!(
            "{} reported the standout deviation, triggering the overlay.",
            labels[spike]
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerKey;

    #[test]
    fn five_distinct_scenarios() {
        let items = generate(&mut SeededRng::namespaced("perception-", "seed"));
        assert_eq!(items.len(), 5);
        let mut questions: Vec<&str> = items
            .iter()
            .map(|i| i.prompt.rsplit("\n\n").next().unwrap())
            .collect();
        questions.sort_unstable();
        questions.dedup();
        assert_eq!(questions.len(), 5);
    }

    #[test]
    fn options_are_unique_and_answer_is_narrated() {
        for seed in 0..200 {
            for item in generate(&mut SeededRng::new(&format!("perception-{seed}"))) {
                let mut opts = item.options.clone();
                opts.sort();
                opts.dedup();
                assert_eq!(opts.len(), item.options.len(), "duplicate options in {item:?}");
                let Some(AnswerKey::Choice { correct_index }) = item.answer_key else {
                    panic!("perception items are multiple choice");
                };
                let rationale = item.rationale.as_deref().unwrap();
                assert!(rationale.contains(&item.options[correct_index]), "{item:?}");
            }
        }
    }

    #[test]
    fn ordinal_words() {
        assert_eq!(ordinal(0), "first");
        assert_eq!(ordinal(6), "seventh");
        assert_eq!(ordinal(9), "10th");
    }
}
