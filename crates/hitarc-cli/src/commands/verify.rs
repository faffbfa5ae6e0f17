//! The `hitarc verify` command.

use std::path::PathBuf;

use anyhow::Result;

use hitarc_core::config::load_config_from;
use hitarc_core::digest::Sha256Digest;
use hitarc_core::model::PlanSource;
use hitarc_core::parser;
use hitarc_core::plan::verify_plan;

use super::load_plan;

pub fn execute(
    plan_path: PathBuf,
    tiered: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let plan = load_plan(&plan_path)?;
    let banks = config.load_banks()?;

    let tiered_bank = match (&plan.source, tiered.or_else(|| config.tiered_bank.clone())) {
        (PlanSource::Tiered { .. }, Some(path)) => Some(parser::parse_tiered_bank(&path)?),
        _ => None,
    };

    let outcome = verify_plan(&plan, &banks, tiered_bank.as_ref(), &Sha256Digest)?;
    if outcome.matches {
        println!(
            "Plan {} matches seed '{}' ({} items).",
            plan.id,
            plan.seed,
            plan.item_count()
        );
        return Ok(());
    }

    println!("Plan {} does NOT match seed '{}'.", plan.id, plan.seed);
    if let Some((stored, regenerated)) = outcome.count_mismatch {
        println!("  item count: stored {stored}, regenerated {regenerated}");
    }
    for id in &outcome.mismatched_items {
        println!("  changed: {id}");
    }
    anyhow::bail!(
        "verification failed: {} item(s) differ",
        outcome.mismatched_items.len()
    )
}
