//! Test-plan assembly.
//!
//! A standard plan runs every requested section generator on its own
//! namespaced stream. A tiered plan draws pre-authored entries from a
//! [`TieredBank`] on a single stream, one entry per requested tier.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::banks::{ContentBanks, TieredBank, TieredEntry};
use crate::digest::{seal, Sha256Digest};
use crate::error::AssessmentError;
use crate::model::{
    AnswerKey, AnswerShape, Item, KeyPolicy, Normalization, PlanSource, Section, SectionCode,
    TestPlan, TierRequest,
};
use crate::rng::SeededRng;
use crate::sections::generate_section;
use crate::traits::AnswerDigest;

/// Default time a plan stays valid after creation.
pub const DEFAULT_EXPIRY_MINUTES: i64 = 18;

/// Options for standard plan generation.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Sections to include. Generated in A..J order regardless of input order.
    pub sections: Vec<SectionCode>,
    pub expiry: Duration,
    pub key_policy: KeyPolicy,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            sections: SectionCode::ALL.to_vec(),
            expiry: Duration::minutes(DEFAULT_EXPIRY_MINUTES),
            key_policy: KeyPolicy::Plaintext,
        }
    }
}

/// Generate a standard plan, sealing keys with SHA-256 if the policy asks.
pub fn generate_plan(
    seed: &str,
    options: &PlanOptions,
    banks: &ContentBanks,
    now: DateTime<Utc>,
) -> Result<TestPlan, AssessmentError> {
    generate_plan_with(seed, options, banks, now, &Sha256Digest)
}

/// Generate a standard plan with an explicit digest for sealed keys.
pub fn generate_plan_with(
    seed: &str,
    options: &PlanOptions,
    banks: &ContentBanks,
    now: DateTime<Utc>,
    digest: &dyn AnswerDigest,
) -> Result<TestPlan, AssessmentError> {
    let mut codes = options.sections.clone();
    codes.sort_unstable();
    codes.dedup();
    if codes.is_empty() {
        return Err(AssessmentError::NoSections);
    }

    let sections = codes
        .iter()
        .map(|&code| {
            let mut rng = SeededRng::namespaced(code.namespace(), seed);
            generate_section(code, &mut rng, banks)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut plan = TestPlan {
        id: Uuid::new_v4(),
        seed: seed.to_string(),
        source: PlanSource::Standard { sections: codes },
        key_policy: KeyPolicy::Plaintext,
        sections,
        created_at: now,
        expires_at: now + options.expiry,
    };
    if options.key_policy == KeyPolicy::Hashed {
        seal_plan(&mut plan, digest);
    }

    tracing::debug!(
        seed,
        plan_id = %plan.id,
        items = plan.item_count(),
        "generated standard plan"
    );
    Ok(plan)
}

// ---------------------------------------------------------------------------
// Tiered plans
// ---------------------------------------------------------------------------

/// Which tiers to draw for each section of a tiered plan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TierPolicy {
    pub requests: Vec<TierRequest>,
}

impl TierPolicy {
    /// Request the same tiers for every section that has entries in `bank`.
    pub fn covering(bank: &TieredBank, tiers: &[u8]) -> Self {
        let requests = SectionCode::ALL
            .into_iter()
            .filter(|&code| !bank.section(code).is_empty())
            .map(|section| TierRequest {
                section,
                tiers: tiers.to_vec(),
            })
            .collect();
        Self { requests }
    }
}

/// Parses `"J:1,2,3;G:1,2"`.
impl FromStr for TierPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut requests = Vec::new();
        for group in s.split(';').map(str::trim).filter(|g| !g.is_empty()) {
            let (section, tiers) = group
                .split_once(':')
                .ok_or_else(|| format!("expected SECTION:TIERS, got '{group}'"))?;
            let section: SectionCode = section.parse()?;
            let tiers = tiers
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| t.parse::<u8>().map_err(|e| format!("bad tier '{t}': {e}")))
                .collect::<Result<Vec<_>, _>>()?;
            if tiers.is_empty() {
                return Err(format!("section {section} lists no tiers"));
            }
            requests.push(TierRequest { section, tiers });
        }
        Ok(Self { requests })
    }
}

impl fmt::Display for TierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<String> = self
            .requests
            .iter()
            .map(|r| {
                let tiers: Vec<String> = r.tiers.iter().map(u8::to_string).collect();
                format!("{}:{}", r.section, tiers.join(","))
            })
            .collect();
        write!(f, "{}", groups.join(";"))
    }
}

fn tiered_item(entry: &TieredEntry) -> Item {
    let mut item = Item::new(
        entry.id.clone(),
        entry.kind,
        entry.prompt.clone(),
        entry.input_type,
        entry.answer_key.clone(),
    );
    item.options = entry.options.clone();
    if let Some(display) = &entry.display {
        item = item.with_display(display.clone(), None);
    }
    item
}

/// Assemble a plan from a tiered bank.
///
/// Each requested tier yields exactly one item. A tier with no entries falls
/// back to the whole section; a section with no entries at all is an error.
pub fn assemble_tiered(
    seed: &str,
    policy: &TierPolicy,
    bank: &TieredBank,
    options: &PlanOptions,
    now: DateTime<Utc>,
) -> Result<TestPlan, AssessmentError> {
    assemble_tiered_with(seed, policy, bank, options, now, &Sha256Digest)
}

pub fn assemble_tiered_with(
    seed: &str,
    policy: &TierPolicy,
    bank: &TieredBank,
    options: &PlanOptions,
    now: DateTime<Utc>,
    digest: &dyn AnswerDigest,
) -> Result<TestPlan, AssessmentError> {
    if policy.requests.is_empty() {
        return Err(AssessmentError::NoSections);
    }
    let mut rng = SeededRng::new(seed);
    let mut sections = Vec::with_capacity(policy.requests.len());

    for request in &policy.requests {
        let whole = bank.section(request.section);
        if whole.is_empty() {
            return Err(AssessmentError::empty_section(request.section));
        }
        let mut items = Vec::with_capacity(request.tiers.len());
        for &tier in &request.tiers {
            let mut pool = bank.tier(request.section, tier);
            if pool.is_empty() {
                tracing::warn!(
                    section = %request.section,
                    tier,
                    "no entries for tier, falling back to the whole section"
                );
                pool = whole.clone();
            }
            if let Some(entry) = rng.pick_n(&pool, 1).into_iter().next() {
                items.push(tiered_item(entry));
            }
        }
        sections.push(Section::new(request.section, items));
    }

    let mut plan = TestPlan {
        id: Uuid::new_v4(),
        seed: seed.to_string(),
        source: PlanSource::Tiered {
            policy: policy.requests.clone(),
            bank_name: bank.name.clone(),
        },
        key_policy: KeyPolicy::Plaintext,
        sections,
        created_at: now,
        expires_at: now + options.expiry,
    };
    if options.key_policy == KeyPolicy::Hashed {
        seal_plan(&mut plan, digest);
    }

    tracing::debug!(
        seed,
        bank = %bank.name,
        items = plan.item_count(),
        "assembled tiered plan"
    );
    Ok(plan)
}

// ---------------------------------------------------------------------------
// Sealing
// ---------------------------------------------------------------------------

/// Sealed form of a key, or `None` when a digest cannot reproduce its grading.
///
/// Only all-or-nothing keys are sealed. Numeric keys stay plaintext because
/// tolerance and partial credit need the expected value.
pub fn seal_key(key: &AnswerKey, digest: &dyn AnswerDigest) -> Option<AnswerKey> {
    match key {
        AnswerKey::Choice { correct_index } => Some(
            seal(&correct_index.to_string(), Normalization::Exact, None, digest)
                .for_shape(AnswerShape::Choice),
        ),
        AnswerKey::Text {
            canonical,
            alternatives,
            keywords,
            ..
        } if alternatives.is_empty() && keywords.is_empty() => Some(
            seal(canonical, Normalization::TrimmedLowercase, None, digest)
                .for_shape(AnswerShape::Text),
        ),
        _ => None,
    }
}

/// Replace every sealable key in the plan with its digest.
pub fn seal_plan(plan: &mut TestPlan, digest: &dyn AnswerDigest) {
    let mut sealed = 0usize;
    for section in &mut plan.sections {
        for item in &mut section.items {
            if let Some(key) = item.answer_key.as_ref().and_then(|k| seal_key(k, digest)) {
                item.answer_key = Some(key);
                sealed += 1;
            }
        }
    }
    plan.key_policy = KeyPolicy::Hashed;
    tracing::debug!(plan_id = %plan.id, sealed, digest = digest.name(), "sealed answer keys");
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Outcome of regenerating a plan from its seed.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanVerification {
    pub matches: bool,
    /// Ids of stored items that differ from the regenerated ones.
    pub mismatched_items: Vec<String>,
    /// Set when the two plans have different item counts.
    pub count_mismatch: Option<(usize, usize)>,
}

/// Regenerate `plan` from its seed and source and compare.
///
/// Public views (no keys) are compared against the regenerated public view.
pub fn verify_plan(
    plan: &TestPlan,
    banks: &ContentBanks,
    tiered: Option<&TieredBank>,
    digest: &dyn AnswerDigest,
) -> Result<PlanVerification, AssessmentError> {
    let options = PlanOptions {
        sections: Vec::new(),
        expiry: plan.expires_at - plan.created_at,
        key_policy: plan.key_policy,
    };
    let regenerated = match &plan.source {
        PlanSource::Standard { sections } => {
            let options = PlanOptions {
                sections: sections.clone(),
                ..options
            };
            generate_plan_with(&plan.seed, &options, banks, plan.created_at, digest)?
        }
        PlanSource::Tiered { policy, bank_name } => {
            let bank = tiered
                .filter(|b| &b.name == bank_name)
                .ok_or_else(|| AssessmentError::MissingTieredBank(bank_name.clone()))?;
            let policy = TierPolicy {
                requests: policy.clone(),
            };
            assemble_tiered_with(&plan.seed, &policy, bank, &options, plan.created_at, digest)?
        }
    };

    let is_public = plan.items().all(|item| item.answer_key.is_none());
    let regenerated = if is_public {
        regenerated.public_view()
    } else {
        regenerated
    };

    let mismatched_items: Vec<String> = plan
        .items()
        .zip(regenerated.items())
        .filter(|(stored, fresh)| stored != fresh)
        .map(|(stored, _)| stored.id.clone())
        .collect();
    let count_mismatch = (plan.item_count() != regenerated.item_count())
        .then(|| (plan.item_count(), regenerated.item_count()));

    Ok(PlanVerification {
        matches: mismatched_items.is_empty()
            && count_mismatch.is_none()
            && plan.same_content(&regenerated),
        mismatched_items,
        count_mismatch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InputType, ItemKind};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn banks() -> ContentBanks {
        ContentBanks::builtin().unwrap()
    }

    fn entry(id: &str, section: SectionCode, tier: u8) -> TieredEntry {
        TieredEntry {
            id: id.into(),
            section,
            kind: ItemKind::ScienceFact,
            tier,
            prompt: format!("question {id}"),
            input_type: InputType::MultipleChoice,
            options: vec!["a".into(), "b".into()],
            display: None,
            answer_key: AnswerKey::Choice { correct_index: 1 },
        }
    }

    fn tiered_bank() -> TieredBank {
        TieredBank {
            name: "unit".into(),
            entries: vec![
                entry("j1a", SectionCode::J, 1),
                entry("j1b", SectionCode::J, 1),
                entry("j2a", SectionCode::J, 2),
                entry("g1a", SectionCode::G, 1),
            ],
        }
    }

    #[test]
    fn same_seed_same_plan() {
        let banks = banks();
        let a = generate_plan("alpha", &PlanOptions::default(), &banks, now()).unwrap();
        let b = generate_plan("alpha", &PlanOptions::default(), &banks, now()).unwrap();
        assert!(a.same_content(&b));
        assert_ne!(a.id, b.id);
        let c = generate_plan("beta", &PlanOptions::default(), &banks, now()).unwrap();
        assert!(!a.same_content(&c));
    }

    #[test]
    fn plan_ids_are_unique() {
        let plan = generate_plan("uniq", &PlanOptions::default(), &banks(), now()).unwrap();
        let mut ids: Vec<&str> = plan.items().map(|i| i.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn sections_are_ordered_and_filtered() {
        let options = PlanOptions {
            sections: vec![SectionCode::I, SectionCode::B, SectionCode::I],
            ..PlanOptions::default()
        };
        let plan = generate_plan("s", &options, &banks(), now()).unwrap();
        let codes: Vec<SectionCode> = plan.sections.iter().map(|s| s.code).collect();
        assert_eq!(codes, vec![SectionCode::B, SectionCode::I]);
    }

    #[test]
    fn filtering_does_not_change_section_content() {
        let banks = banks();
        let full = generate_plan("iso", &PlanOptions::default(), &banks, now()).unwrap();
        let only_g = PlanOptions {
            sections: vec![SectionCode::G],
            ..PlanOptions::default()
        };
        let partial = generate_plan("iso", &only_g, &banks, now()).unwrap();
        let g = full.sections.iter().find(|s| s.code == SectionCode::G).unwrap();
        assert_eq!(&partial.sections[0], g);
    }

    #[test]
    fn empty_selection_is_an_error() {
        let options = PlanOptions {
            sections: vec![],
            ..PlanOptions::default()
        };
        let err = generate_plan("s", &options, &banks(), now()).unwrap_err();
        assert!(matches!(err, AssessmentError::NoSections));
    }

    #[test]
    fn expiry_defaults_to_eighteen_minutes() {
        let plan = generate_plan("s", &PlanOptions::default(), &banks(), now()).unwrap();
        assert_eq!(plan.expires_at - plan.created_at, Duration::minutes(18));
        assert!(!plan.is_expired(now() + Duration::minutes(17)));
        assert!(plan.is_expired(now() + Duration::minutes(18)));
    }

    #[test]
    fn missing_bank_category_fails_generation() {
        let mut banks = banks();
        banks.proofs.clear();
        let err = generate_plan("s", &PlanOptions::default(), &banks, now()).unwrap_err();
        assert!(matches!(err, AssessmentError::EmptyBankCategory("proofs")));
    }

    #[test]
    fn tiered_one_item_per_tier() {
        let bank = tiered_bank();
        let policy: TierPolicy = "J:1,2;G:1".parse().unwrap();
        let plan = assemble_tiered("t", &policy, &bank, &PlanOptions::default(), now()).unwrap();
        assert_eq!(plan.sections.len(), 2);
        assert_eq!(plan.sections[0].items.len(), 2);
        assert_eq!(plan.sections[1].items.len(), 1);
        let j2 = &plan.sections[0].items[1];
        assert_eq!(j2.id, "J-1-j2a");
        assert_eq!(j2.index, 1);
    }

    #[test]
    fn tiered_fallback_yields_exactly_one_item() {
        let bank = tiered_bank();
        let policy: TierPolicy = "G:3".parse().unwrap();
        let plan = assemble_tiered("t", &policy, &bank, &PlanOptions::default(), now()).unwrap();
        assert_eq!(plan.item_count(), 1);
        assert!(plan.sections[0].items[0].id.ends_with("g1a"));
    }

    #[test]
    fn tiered_section_without_entries_is_an_error() {
        let bank = tiered_bank();
        let policy: TierPolicy = "A:1".parse().unwrap();
        let err = assemble_tiered("t", &policy, &bank, &PlanOptions::default(), now()).unwrap_err();
        assert!(matches!(err, AssessmentError::EmptySection { ref section } if section == "A"));
    }

    #[test]
    fn tiered_is_deterministic() {
        let bank = tiered_bank();
        let policy = TierPolicy::covering(&bank, &[1, 1, 2]);
        let a = assemble_tiered("same", &policy, &bank, &PlanOptions::default(), now()).unwrap();
        let b = assemble_tiered("same", &policy, &bank, &PlanOptions::default(), now()).unwrap();
        assert!(a.same_content(&b));
    }

    #[test]
    fn tier_policy_parse_and_display() {
        let policy: TierPolicy = "J:1,2,3; g:1".parse().unwrap();
        assert_eq!(policy.requests.len(), 2);
        assert_eq!(policy.requests[1].section, SectionCode::G);
        assert_eq!(policy.to_string(), "J:1,2,3;G:1");
        assert!("J".parse::<TierPolicy>().is_err());
        assert!("J:".parse::<TierPolicy>().is_err());
        assert!("J:x".parse::<TierPolicy>().is_err());
        assert!("Q:1".parse::<TierPolicy>().is_err());
    }

    #[test]
    fn covering_skips_absent_sections() {
        let policy = TierPolicy::covering(&tiered_bank(), &[1]);
        let codes: Vec<SectionCode> = policy.requests.iter().map(|r| r.section).collect();
        assert_eq!(codes, vec![SectionCode::G, SectionCode::J]);
    }

    #[test]
    fn hashed_policy_seals_convertible_keys() {
        let options = PlanOptions {
            key_policy: KeyPolicy::Hashed,
            ..PlanOptions::default()
        };
        let plan = generate_plan("sealed", &options, &banks(), now()).unwrap();
        assert_eq!(plan.key_policy, KeyPolicy::Hashed);
        for item in plan.items() {
            match item.answer_key.as_ref().unwrap() {
                AnswerKey::Choice { .. } => panic!("{} left unsealed", item.id),
                AnswerKey::Hashed { answer_shape, .. } => assert!(answer_shape.is_some()),
                AnswerKey::Text {
                    alternatives,
                    keywords,
                    ..
                } => assert!(!alternatives.is_empty() || !keywords.is_empty()),
                _ => {}
            }
        }
        // Tolerance needs the expected value, so numeric keys stay readable.
        assert!(plan
            .items()
            .any(|i| matches!(i.answer_key, Some(AnswerKey::Numeric { .. }))));
    }

    #[test]
    fn verify_roundtrip() {
        let banks = banks();
        let plan = generate_plan("audit", &PlanOptions::default(), &banks, now()).unwrap();
        let outcome = verify_plan(&plan, &banks, None, &Sha256Digest).unwrap();
        assert!(outcome.matches, "{outcome:?}");

        let public = plan.public_view();
        assert!(verify_plan(&public, &banks, None, &Sha256Digest).unwrap().matches);
    }

    #[test]
    fn verify_detects_tampering() {
        let banks = banks();
        let mut plan = generate_plan("audit", &PlanOptions::default(), &banks, now()).unwrap();
        let target = plan.sections[1].items[0].id.clone();
        plan.sections[1].items[0].answer_key = Some(AnswerKey::Numeric {
            expected: 0.0,
            tolerance: 1e9,
        });
        let outcome = verify_plan(&plan, &banks, None, &Sha256Digest).unwrap();
        assert!(!outcome.matches);
        assert_eq!(outcome.mismatched_items, vec![target]);
    }

    #[test]
    fn verify_tiered_needs_bank() {
        let bank = tiered_bank();
        let policy = TierPolicy::covering(&bank, &[1]);
        let plan = assemble_tiered("t", &policy, &bank, &PlanOptions::default(), now()).unwrap();
        let err = verify_plan(&plan, &banks(), None, &Sha256Digest).unwrap_err();
        assert!(matches!(err, AssessmentError::MissingTieredBank(_)));
        let outcome = verify_plan(&plan, &banks(), Some(&bank), &Sha256Digest).unwrap();
        assert!(outcome.matches);
    }
}
