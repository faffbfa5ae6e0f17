//! Configuration file loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::banks::{ContentBanks, TieredBank};
use crate::model::{KeyPolicy, SectionCode};
use crate::parser;
use crate::plan::{PlanOptions, DEFAULT_EXPIRY_MINUTES};

/// Name of the per-project config file.
pub const CONFIG_FILE_NAME: &str = "hitarc.toml";

/// Top-level hitarc configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitArcConfig {
    /// Whether generated plans carry plaintext or sealed keys.
    #[serde(default)]
    pub key_policy: KeyPolicy,
    /// Minutes a plan stays valid.
    #[serde(default = "default_expiry")]
    pub expiry_minutes: i64,
    /// Sections included in standard plans; empty means all.
    #[serde(default)]
    pub sections: Vec<SectionCode>,
    /// Content bank replacing the built-in one.
    #[serde(default)]
    pub bank: Option<PathBuf>,
    /// Default tiered bank for `plan --tiered` and `verify`.
    #[serde(default)]
    pub tiered_bank: Option<PathBuf>,
    /// Max concurrent batch jobs.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for plans and reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Section delta treated as a regression by `compare`.
    #[serde(default = "default_threshold")]
    pub regression_threshold: f64,
}

fn default_expiry() -> i64 {
    DEFAULT_EXPIRY_MINUTES
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./hitarc-results")
}
fn default_threshold() -> f64 {
    0.05
}

impl Default for HitArcConfig {
    fn default() -> Self {
        Self {
            key_policy: KeyPolicy::Plaintext,
            expiry_minutes: default_expiry(),
            sections: Vec::new(),
            bank: None,
            tiered_bank: None,
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            regression_threshold: default_threshold(),
        }
    }
}

impl HitArcConfig {
    /// Plan options derived from this config.
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            sections: if self.sections.is_empty() {
                SectionCode::ALL.to_vec()
            } else {
                self.sections.clone()
            },
            expiry: Duration::minutes(self.expiry_minutes),
            key_policy: self.key_policy,
        }
    }

    /// The configured content bank, or the built-in one.
    pub fn load_banks(&self) -> Result<ContentBanks> {
        match &self.bank {
            Some(path) => parser::parse_banks(path),
            None => ContentBanks::builtin().context("failed to load built-in bank"),
        }
    }

    /// The configured tiered bank, if any.
    pub fn load_tiered_bank(&self) -> Result<Option<TieredBank>> {
        self.tiered_bank
            .as_deref()
            .map(parser::parse_tiered_bank)
            .transpose()
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.expiry_minutes > 0, "expiry_minutes must be positive");
        anyhow::ensure!(self.parallelism >= 1, "parallelism must be at least 1");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.regression_threshold),
            "regression_threshold must be between 0.0 and 1.0"
        );
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `hitarc.toml` in the current directory
/// 2. `~/.config/hitarc/config.toml`
///
/// Environment variable override: `HITARC_KEY_POLICY`.
pub fn load_config() -> Result<HitArcConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<HitArcConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<HitArcConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => HitArcConfig::default(),
    };

    if let Ok(policy) = std::env::var("HITARC_KEY_POLICY") {
        config.key_policy = policy
            .parse()
            .map_err(|e: String| anyhow::anyhow!("HITARC_KEY_POLICY: {e}"))?;
    }

    config.bank = config.bank.as_deref().map(resolve_path);
    config.tiered_bank = config.tiered_bank.as_deref().map(resolve_path);
    config.output_dir = resolve_path(&config.output_dir);

    config.validate()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("hitarc"))
}
