//! Answer normalisation and the default SHA-256 digest.

use sha2::{Digest, Sha256};

use crate::model::{AnswerKey, Normalization};
use crate::traits::AnswerDigest;

impl Normalization {
    /// Canonicalise a raw answer.
    ///
    /// `decimal_places` only affects [`Normalization::NumericRounded`] and
    /// defaults to 0. Unparseable numeric input falls back to the trimmed text.
    pub fn apply(self, raw: &str, decimal_places: Option<u32>) -> String {
        let trimmed = raw.trim();
        match self {
            Normalization::Exact => trimmed.to_string(),
            Normalization::TrimmedLowercase => trimmed.to_lowercase(),
            Normalization::HexLowercase => {
                let lower = trimmed.to_lowercase();
                lower.strip_prefix("0x").unwrap_or(&lower).to_string()
            }
            Normalization::NumericRounded => match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => {
                    let rounded = format!("{n:.prec$}", prec = decimal_places.unwrap_or(0) as usize);
                    // A value rounding to zero prints as "-0.0" when negative.
                    match rounded.strip_prefix('-') {
                        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => {
                            rest.to_string()
                        }
                        _ => rounded,
                    }
                }
                _ => trimmed.to_string(),
            },
        }
    }
}

/// Hex-encoded SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl AnswerDigest for Sha256Digest {
    fn name(&self) -> &str {
        "sha256"
    }

    fn digest(&self, canonical: &str) -> String {
        hex::encode(Sha256::digest(canonical.as_bytes()))
    }
}

/// Build a sealed key for a plaintext answer.
pub fn seal(
    answer: &str,
    normalization: Normalization,
    decimal_places: Option<u32>,
    digest: &dyn AnswerDigest,
) -> AnswerKey {
    AnswerKey::Hashed {
        digest: digest.digest(&normalization.apply(answer, decimal_places)),
        normalization,
        decimal_places,
        answer_shape: None,
    }
}

/// Whether `answer` matches a sealed digest.
pub fn matches(
    answer: &str,
    expected_digest: &str,
    normalization: Normalization,
    decimal_places: Option<u32>,
    digest: &dyn AnswerDigest,
) -> bool {
    digest
        .digest(&normalization.apply(answer, decimal_places))
        .eq_ignore_ascii_case(expected_digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            Sha256Digest.digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn normalizations() {
        assert_eq!(Normalization::Exact.apply("  Paris ", None), "Paris");
        assert_eq!(Normalization::TrimmedLowercase.apply(" PaRiS", None), "paris");
        assert_eq!(Normalization::HexLowercase.apply("0xFF", None), "ff");
        assert_eq!(Normalization::HexLowercase.apply("BEEF", None), "beef");
        assert_eq!(Normalization::NumericRounded.apply("3.14159", Some(2)), "3.14");
        assert_eq!(Normalization::NumericRounded.apply(" 42 ", None), "42");
        assert_eq!(Normalization::NumericRounded.apply("n/a", Some(2)), "n/a");
        assert_eq!(Normalization::NumericRounded.apply("-0.01", Some(1)), "0.0");
        assert_eq!(Normalization::NumericRounded.apply("-0.4", None), "0");
        assert_eq!(Normalization::NumericRounded.apply("-0.06", Some(1)), "-0.1");
    }

    #[test]
    fn sealed_key_matches_equivalent_answers() {
        let key = seal("0x1A", Normalization::HexLowercase, None, &Sha256Digest);
        let AnswerKey::Hashed {
            digest,
            normalization,
            decimal_places,
            ..
        } = key
        else {
            panic!("expected hashed key");
        };
        assert!(matches("1a", &digest, normalization, decimal_places, &Sha256Digest));
        assert!(matches(" 0x1a ", &digest, normalization, decimal_places, &Sha256Digest));
        assert!(!matches("1b", &digest, normalization, decimal_places, &Sha256Digest));
    }

    #[test]
    fn numeric_rounding_absorbs_precision() {
        let key = seal("2.5", Normalization::NumericRounded, Some(1), &Sha256Digest);
        if let AnswerKey::Hashed { digest, .. } = key {
            assert!(matches("2.50", &digest, Normalization::NumericRounded, Some(1), &Sha256Digest));
            assert!(matches("2.54", &digest, Normalization::NumericRounded, Some(1), &Sha256Digest));
            assert!(!matches("2.6", &digest, Normalization::NumericRounded, Some(1), &Sha256Digest));
        }
    }
}
