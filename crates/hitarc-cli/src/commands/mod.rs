pub mod batch;
pub mod compare;
pub mod grade;
pub mod init;
pub mod plan;
pub mod stats;
pub mod validate;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use hitarc_core::model::TestPlan;

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {what} JSON: {}", path.display()))
}

/// Pretty-print `value` to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

pub fn load_plan(path: &Path) -> Result<TestPlan> {
    read_json(path, "plan")
}
