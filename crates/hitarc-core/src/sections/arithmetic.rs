//! Section B: parametric arithmetic under tolerance.
//!
//! Eight fixed builders, each drawing its operands in explicit ranges and
//! computing the expected value from the same formula the prompt shows.

use crate::model::{AnswerKey, InputType, Item, ItemKind};
use crate::rng::{round_dp, SeededRng};

pub fn generate(rng: &mut SeededRng) -> Vec<Item> {
    vec![
        decimal_mix(rng),
        carry_trap(rng),
        order_expression(rng),
        fraction_to_decimal(rng),
        percentage(rng),
        mixed_operation(rng),
        power_root(rng),
        rounding(rng),
    ]
}

fn decimal_mix(rng: &mut SeededRng) -> Item {
    let a = rng.float_dp(120.0, 480.0, 3);
    let b = rng.float_dp(12.0, 98.0, 4);
    let c = rng.float_dp(6.0, 54.0, 4);
    let expression = format!("{a:.3} + {b:.4} - {c:.4}");
    let expected = round_dp(a + b - c, 4);
    make_item(
        rng,
        expression,
        expected,
        0.0001,
        "Balance millesimal additions and subtractions without losing precision.",
    )
}

fn carry_trap(rng: &mut SeededRng) -> Item {
    let a = rng.int(200_000, 799_999);
    let b = rng.int(400_000, 899_999);
    let c = rng.int(20_000, 95_000);
    let expression = format!("{a} - {b} - {c}");
    make_item(
        rng,
        expression,
        (a - b - c) as f64,
        0.0,
        "Multi-stage borrowing across six digits including a negative outcome.",
    )
}

fn order_expression(rng: &mut SeededRng) -> Item {
    let a = rng.int(3, 7);
    let b = rng.int(4, 9);
    let c = rng.int(2, 6);
    let d = rng.int(3, 7);
    let e = rng.int(5, 12);
    let radicand = e * e * 3;
    let expression = format!("(({a}^3 - {b} * {c}) / {d}) + sqrt({radicand})");
    let expected = ((a.pow(3) - b * c) as f64 / d as f64) + (radicand as f64).sqrt();
    make_item(
        rng,
        expression,
        round_dp(expected, 3),
        0.0005,
        "Nested exponents, division, and radicals demand strict order tracking.",
    )
}

fn fraction_to_decimal(rng: &mut SeededRng) -> Item {
    let denominator = *rng.pick(&[7i64, 11, 13, 17, 19, 23]);
    let numerator = rng.int(1, denominator - 1);
    let expression = format!("{numerator}/{denominator}");
    make_item(
        rng,
        expression,
        round_dp(numerator as f64 / denominator as f64, 7),
        0.000_000_5,
        "Convert awkward proper fractions to a seven-decimal expansion.",
    )
}

fn percentage(rng: &mut SeededRng) -> Item {
    let base = rng.int(240, 960);
    let increase = *rng.pick(&[18.75, 22.4, 27.5]);
    let decrease = *rng.pick(&[9.5, 12.5, 16.75]);
    let expression = format!("Apply +{increase}% then -{decrease}% to {base}");
    let expected = base as f64 * (1.0 + increase / 100.0) * (1.0 - decrease / 100.0);
    make_item(
        rng,
        expression,
        round_dp(expected, 3),
        0.001,
        "Sequential percentage adjustments; cubic-mill precision enforced.",
    )
}

fn mixed_operation(rng: &mut SeededRng) -> Item {
    let a = rng.int(18, 54);
    let b = rng.int(6, 12);
    let c = rng.int(5, 11);
    let d = rng.int(3, 9);
    let expression = format!("((({a} / {b})^2) + {c}/{d}) * {}", b - 1);
    let expected = ((a as f64 / b as f64).powi(2) + c as f64 / d as f64) * (b - 1) as f64;
    make_item(
        rng,
        expression,
        round_dp(expected, 4),
        0.0005,
        "Compound rational terms with a squared quotient amplified by scaling.",
    )
}

fn power_root(rng: &mut SeededRng) -> Item {
    let base = *rng.pick(&[3i64, 5, 7, 11]);
    let power = rng.int(3, 5) as u32;
    let multiplier = rng.int(2, 6);
    let radical = base.pow(3) * multiplier;
    let expression = format!("{base}^{power} + cbrt({radical})");
    let expected = base.pow(power) as f64 + (radical as f64).cbrt();
    make_item(
        rng,
        expression,
        round_dp(expected, 5),
        0.000_01,
        "High powers combined with an exact cube-root evaluation.",
    )
}

fn rounding(rng: &mut SeededRng) -> Item {
    let value = rng.float_dp(100.0, 999.0, 3);
    let expression = format!("Round {value} to three significant figures");
    make_item(
        rng,
        expression,
        round_significant(value, 3),
        0.0001,
        "Significant-figure rounding with potential carry propagation.",
    )
}

fn make_item(
    rng: &mut SeededRng,
    expression: String,
    expected: f64,
    tolerance: f64,
    rationale: &str,
) -> Item {
    Item::new(
        rng.fragment(),
        ItemKind::Arithmetic,
        format!("Evaluate {expression}"),
        InputType::Numeric,
        AnswerKey::Numeric {
            expected,
            tolerance,
        },
    )
    .with_display(expression, Some("math"))
    .with_rationale(rationale)
}

/// Round to `digits` significant figures.
pub fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits - 1 - magnitude);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_of(item: &Item) -> (f64, f64) {
        match item.answer_key {
            Some(AnswerKey::Numeric {
                expected,
                tolerance,
            }) => (expected, tolerance),
            _ => panic!("arithmetic items carry numeric keys"),
        }
    }

    #[test]
    fn eight_numeric_items() {
        let items = generate(&mut SeededRng::namespaced("arith-", "seed"));
        assert_eq!(items.len(), 8);
        assert!(items.iter().all(|i| i.input_type == InputType::Numeric));
        assert!(items.iter().all(|i| i.kind == ItemKind::Arithmetic));
    }

    #[test]
    fn deterministic_for_seed() {
        let a = generate(&mut SeededRng::new("arith-x"));
        let b = generate(&mut SeededRng::new("arith-x"));
        assert_eq!(a, b);
    }

    #[test]
    fn carry_trap_is_negative() {
        for seed in 0..50 {
            let items = generate(&mut SeededRng::new(&format!("arith-{seed}")));
            let (expected, tolerance) = expected_of(&items[1]);
            assert!(expected < 0.0);
            assert_eq!(tolerance, 0.0);
        }
    }

    #[test]
    fn fraction_is_proper() {
        for seed in 0..50 {
            let items = generate(&mut SeededRng::new(&format!("arith-{seed}")));
            let (expected, _) = expected_of(&items[3]);
            assert!(expected > 0.0 && expected < 1.0);
        }
    }

    #[test]
    fn prompt_matches_expected_for_decimal_mix() {
        let items = generate(&mut SeededRng::new("arith-check"));
        let display = items[0].display.as_ref().unwrap().content.clone();
        let parts: Vec<&str> = display.split_whitespace().collect();
        let a: f64 = parts[0].parse().unwrap();
        let b: f64 = parts[2].parse().unwrap();
        let c: f64 = parts[4].parse().unwrap();
        let (expected, tolerance) = expected_of(&items[0]);
        assert!((a + b - c - expected).abs() <= tolerance);
    }

    #[test]
    fn significant_figures() {
        assert_eq!(round_significant(123.456, 3), 123.0);
        assert_eq!(round_significant(999.6, 3), 1000.0);
        assert_eq!(round_significant(0.012345, 2), 0.012);
        assert_eq!(round_significant(0.0, 3), 0.0);
    }
}
