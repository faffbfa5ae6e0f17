//! The `hitarc validate` command.

use std::path::PathBuf;

use anyhow::Result;

use hitarc_core::banks::ContentBanks;
use hitarc_core::parser::{self, ValidationWarning};

pub fn execute(bank: Option<PathBuf>, tiered: Option<PathBuf>) -> Result<()> {
    let mut total_warnings = 0;

    if bank.is_some() || tiered.is_none() {
        let (label, banks) = match &bank {
            Some(path) => (path.display().to_string(), parser::parse_banks(path)?),
            None => ("built-in bank".to_string(), ContentBanks::builtin()?),
        };
        println!("Content bank: {label}");
        let warnings = parser::validate_banks(&banks);
        print_warnings(&warnings);
        total_warnings += warnings.len();
    }

    if let Some(path) = &tiered {
        let tiered_banks = if path.is_dir() {
            parser::load_tiered_directory(path)?
        } else {
            vec![parser::parse_tiered_bank(path)?]
        };
        for tb in &tiered_banks {
            println!("Tiered bank: {} ({} entries)", tb.name, tb.entries.len());
            let warnings = parser::validate_tiered(tb);
            print_warnings(&warnings);
            total_warnings += warnings.len();
        }
    }

    if total_warnings == 0 {
        println!("All banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

fn print_warnings(warnings: &[ValidationWarning]) {
    for w in warnings {
        let prefix = w
            .entry_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }
}
