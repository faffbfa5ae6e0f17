//! The `hitarc init` command.

use std::path::Path;

use anyhow::Result;

use hitarc_core::config::CONFIG_FILE_NAME;

pub fn execute() -> Result<()> {
    write_once(Path::new(CONFIG_FILE_NAME), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("banks")?;
    write_once(Path::new("banks/tiered-example.toml"), EXAMPLE_TIERED_BANK)?;

    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE_NAME} to pick sections and the key policy");
    println!("  2. Run: hitarc validate --tiered banks/tiered-example.toml");
    println!("  3. Run: hitarc plan --seed my-seed --output plan.json");

    Ok(())
}

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# hitarc configuration

# "plaintext" or "hashed"
key_policy = "plaintext"
expiry_minutes = 18

# Sections for standard plans; leave empty for all ten.
sections = []

# bank = "banks/custom.toml"
tiered_bank = "banks/tiered-example.toml"

parallelism = 4
output_dir = "./hitarc-results"
regression_threshold = 0.05
"#;

const EXAMPLE_TIERED_BANK: &str = r#"name = "tiered-example"

[[entries]]
id = "j-photon"
section = "J"
kind = "science-fact"
tier = 1
prompt = "Which particle carries the electromagnetic force?"
input_type = "multiple-choice"
options = ["Photon", "Gluon", "Neutrino", "Muon"]
answer_key = { kind = "choice", correct_index = 0 }

[[entries]]
id = "j-wall"
section = "J"
kind = "historical-date"
tier = 2
prompt = "In what year did the Berlin Wall fall?"
input_type = "numeric"
answer_key = { kind = "numeric", expected = 1989.0, tolerance = 0.0 }

[[entries]]
id = "g-derivative"
section = "G"
kind = "decimal-arithmetic"
tier = 1
prompt = "What is d/dx of 3x^2 evaluated at x = 4?"
input_type = "numeric"
answer_key = { kind = "numeric", expected = 24.0, tolerance = 0.0 }

[[entries]]
id = "g-integral"
section = "G"
kind = "definite-integral"
tier = 2
prompt = "Evaluate the integral of 2x from 0 to 3."
input_type = "multiple-choice"
options = ["6", "9", "12", "3"]
answer_key = { kind = "choice", correct_index = 1 }
"#;
