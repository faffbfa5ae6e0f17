//! The `hitarc plan` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{Cell, Table};

use hitarc_core::config::load_config_from;
use hitarc_core::model::{parse_section_list, KeyPolicy, TestPlan};
use hitarc_core::parser;
use hitarc_core::plan::{assemble_tiered, generate_plan, TierPolicy};

use super::write_json;

/// Tiers requested from every section when `--tiers` is omitted.
const DEFAULT_TIERS: [u8; 3] = [1, 2, 3];

pub struct PlanArgs {
    pub seed: String,
    pub sections: Option<String>,
    pub tiered: Option<PathBuf>,
    pub tiers: Option<String>,
    pub public: bool,
    pub hashed: bool,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub fn execute(args: PlanArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;

    let mut options = config.plan_options();
    if let Some(list) = &args.sections {
        options.sections = parse_section_list(list).map_err(anyhow::Error::msg)?;
    }
    if args.hashed {
        options.key_policy = KeyPolicy::Hashed;
    }

    let tiered_path = args.tiered.clone().or_else(|| {
        // A tier policy alone implies the configured tiered bank.
        args.tiers.as_ref().and(config.tiered_bank.clone())
    });

    let plan = match tiered_path {
        Some(path) => {
            let bank = parser::parse_tiered_bank(&path)?;
            let policy = match &args.tiers {
                Some(spec) => spec
                    .parse::<TierPolicy>()
                    .map_err(anyhow::Error::msg)
                    .context("invalid --tiers")?,
                None => TierPolicy::covering(&bank, &DEFAULT_TIERS),
            };
            assemble_tiered(&args.seed, &policy, &bank, &options, Utc::now())?
        }
        None => {
            anyhow::ensure!(
                args.tiers.is_none(),
                "--tiers needs --tiered or a tiered_bank in the config"
            );
            let banks = config.load_banks()?;
            generate_plan(&args.seed, &options, &banks, Utc::now())?
        }
    };

    let plan = if args.public { plan.public_view() } else { plan };

    print_summary(&plan);
    match &args.output {
        Some(path) => {
            write_json(path, &plan)?;
            eprintln!("Plan saved to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(())
}

fn print_summary(plan: &TestPlan) {
    let mut table = Table::new();
    table.set_header(vec!["Section", "Label", "Items", "Time"]);
    for section in &plan.sections {
        table.add_row(vec![
            Cell::new(section.code),
            Cell::new(&section.label),
            Cell::new(section.items.len()),
            Cell::new(format!("{}s", section.duration_seconds)),
        ]);
    }
    eprintln!(
        "Plan {} (seed '{}', {} items, keys {:?}, expires {})",
        plan.id,
        plan.seed,
        plan.item_count(),
        plan.key_policy,
        plan.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    eprintln!("{table}");
}
