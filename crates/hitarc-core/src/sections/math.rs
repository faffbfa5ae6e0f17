//! Section G: decimal precision, operator order, trig with logs, a definite
//! integral and a flawed proof.

use super::{distinct_numbers, render_number, shuffled_options};
use crate::banks::ContentBanks;
use crate::model::{AnswerKey, InputType, Item, ItemKind};
use crate::rng::{round_dp, SeededRng};

const TOLERANCE: f64 = 0.05;

const ANGLES: [i64; 12] = [30, 45, 60, 120, 135, 150, 210, 225, 240, 300, 315, 330];
const LOG_BASES: [i64; 4] = [2, 3, 5, 10];

pub fn generate(rng: &mut SeededRng, banks: &ContentBanks) -> Vec<Item> {
    vec![
        decimal_arithmetic(rng),
        order_of_operations(rng),
        trig_log(rng),
        definite_integral(rng),
        proof_error(rng, banks),
    ]
}

fn numeric(rng: &mut SeededRng, kind: ItemKind, prompt: String, expected: f64) -> Item {
    Item::new(
        rng.fragment(),
        kind,
        prompt,
        InputType::Numeric,
        AnswerKey::Numeric {
            expected,
            tolerance: TOLERANCE,
        },
    )
}

fn decimal_arithmetic(rng: &mut SeededRng) -> Item {
    let dp_a = rng.int(2, 4) as u32;
    let dp_b = rng.int(2, 4) as u32;
    let dp_c = rng.int(2, 4) as u32;
    let dp_d = rng.int(2, 3) as u32;
    let dp_e = rng.int(2, 4) as u32;
    let dp_f = rng.int(2, 3) as u32;

    let a = rng.float_dp(-999.0, 999.0, dp_a);
    let b = rng.float_dp(-5.0, 5.0, dp_b);
    let mut d = 0.0_f64;
    while d.abs() < 0.01 {
        d = rng.float_dp(-20.0, 20.0, dp_d);
    }
    let c = rng.float_dp(-500.0, 500.0, dp_c);
    let e = rng.float_dp(-100.0, 100.0, dp_e);
    let f = rng.float_dp(-2.0, 2.0, dp_f);

    let expected = round_dp(a * b + c / d - e * f, 4);
    let [a, b, c, d, e, f] = [a, b, c, d, e, f].map(render_number);
    numeric(
        rng,
        ItemKind::DecimalArithmetic,
        format!(
            "Compute the following to at least 2 decimal places:\n\n({a} × {b}) + ({c} ÷ {d}) − ({e} × {f})"
        ),
        expected,
    )
}

fn order_of_operations(rng: &mut SeededRng) -> Item {
    let a = rng.int(2, 6);
    let b = rng.int(1, 12);
    let c = rng.int(2, 3) as i32;
    let d = rng.int(2, 9);
    let e = rng.int(2, 15);
    let f = rng.int(5, 25);
    let g = rng.int(1, 4);
    let root = rng.int(2, 12);
    let h = root * root;

    let value = ((a * a + b) as f64).powi(c) / d as f64 - (e * (f - g * g)) as f64 + root as f64;
    numeric(
        rng,
        ItemKind::OrderOfOperations,
        format!(
            "Evaluate the following expression (round to 2 decimal places if needed):\n\n({a}² + {b})^{c} ÷ {d} − {e} × ({f} − {g}²) + √{h}"
        ),
        round_dp(value, 4),
    )
}

fn trig_log(rng: &mut SeededRng) -> Item {
    let alpha = *rng.pick(&ANGLES);
    let beta = *rng.pick(&ANGLES);
    let gamma = *rng.pick(&ANGLES);
    let base1 = *rng.pick(&LOG_BASES);
    let exp1 = rng.int(2, 6);
    let base2 = *rng.pick(&LOG_BASES);
    let exp2 = rng.int(2, 5);

    let sin = (alpha as f64).to_radians().sin();
    let cos = (beta as f64).to_radians().cos();
    let tan = (gamma as f64).to_radians().tan();
    // log_b(b^k) is k exactly.
    let value = sin * exp1 as f64 - cos + tan / exp2 as f64;

    let arg1 = base1.pow(exp1 as u32);
    let arg2 = base2.pow(exp2 as u32);
    numeric(
        rng,
        ItemKind::TrigLog,
        format!(
            "Compute to 2 decimal places:\n\nsin({alpha}°) × log₍{base1}₎({arg1}) − cos({beta}°) + tan({gamma}°) ÷ log₍{base2}₎({arg2})"
        ),
        round_dp(value, 4),
    )
}

/// Coefficients of `a·x³ + b·x² + c·x + d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cubic {
    pub a: i64,
    pub b: i64,
    pub c: i64,
    pub d: i64,
}

impl Cubic {
    fn antiderivative(&self, x: f64) -> f64 {
        self.a as f64 / 4.0 * x.powi(4)
            + self.b as f64 / 3.0 * x.powi(3)
            + self.c as f64 / 2.0 * x.powi(2)
            + self.d as f64 * x
    }

    /// Exact integral over `[lower, upper]`, rounded to 4 places.
    pub fn integrate(&self, lower: i64, upper: i64) -> f64 {
        round_dp(
            self.antiderivative(upper as f64) - self.antiderivative(lower as f64),
            4,
        )
    }

    /// Human form, e.g. `-x³ + 3x² - 2x + 7`. Zero terms are omitted and a
    /// unit coefficient on a power of x is elided.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let powers = [(self.a, "x³"), (self.b, "x²"), (self.c, "x")];
        for (coeff, power) in powers {
            if coeff == 0 {
                continue;
            }
            push_sign(&mut out, coeff);
            match coeff {
                1 => {}
                -1 => out.push('-'),
                n => out.push_str(&n.to_string()),
            }
            out.push_str(power);
        }
        if self.d != 0 {
            push_sign(&mut out, self.d);
            out.push_str(&self.d.to_string());
        }
        if out.is_empty() {
            out.push('0');
        }
        out
    }
}

fn push_sign(out: &mut String, coeff: i64) {
    if out.is_empty() {
        return;
    }
    out.push_str(if coeff > 0 { " + " } else { " " });
}

fn definite_integral(rng: &mut SeededRng) -> Item {
    let a = match rng.int(-3, 3) {
        0 => 1,
        n => n,
    };
    let poly = Cubic {
        a,
        b: rng.int(-6, 6),
        c: rng.int(-8, 8),
        d: rng.int(-10, 10),
    };
    let lower = rng.int(-2, 2);
    let upper = rng.int(lower + 2, 6);
    let answer = poly.integrate(lower, upper);

    let plus = answer + rng.float(2.0, 8.0);
    let minus = answer - rng.float(2.0, 8.0);
    let scaled = answer * rng.float(1.5, 3.0);
    let values = distinct_numbers(vec![answer, plus, minus, scaled], 2);
    let labels: Vec<String> = values.into_iter().map(render_number).collect();
    let (options, correct_index) = shuffled_options(rng, labels[0].clone(), labels[1..].to_vec());

    Item::choice(
        rng.fragment(),
        ItemKind::DefiniteIntegral,
        format!(
            "Evaluate the definite integral:\n\n∫ from {lower} to {upper} of ({}) dx",
            poly.render()
        ),
        options,
        correct_index,
    )
    .with_rationale(format!("The exact value is {}.", render_number(answer)))
}

fn proof_error(rng: &mut SeededRng, banks: &ContentBanks) -> Item {
    let proof = rng.pick(&banks.proofs);
    let steps = proof
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("Step {}: {step}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    let (options, correct_index) = shuffled_options(
        rng,
        proof.error_explanation.clone(),
        proof.distractor_explanations.clone(),
    );
    Item::choice(
        rng.fragment(),
        ItemKind::ProofError,
        "The following proof contains an error. Identify the nature of the error.",
        options,
        correct_index,
    )
    .with_display(format!("{}\n\n{steps}", proof.title), None)
}
