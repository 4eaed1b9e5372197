//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::registry::DEFAULT_LOW_AVERAGE_THRESHOLD;

/// Environment variable that overrides `low_average_threshold`.
pub const THRESHOLD_ENV: &str = "COURSEBOOK_THRESHOLD";

/// Settings the registry consults when filling in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Time limit given to exams created without one.
    #[serde(default = "default_time_limit")]
    pub default_time_limit_minutes: u32,
    /// Specialty assigned to newly registered instructors.
    #[serde(default = "default_specialty")]
    pub default_specialty: String,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            default_time_limit_minutes: default_time_limit(),
            default_specialty: default_specialty(),
        }
    }
}

fn default_time_limit() -> u32 {
    60
}
fn default_specialty() -> String {
    "General".to_string()
}

/// Top-level coursebook configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursebookConfig {
    /// Cutoff offered by the low-average report when the user enters none.
    #[serde(default = "default_threshold")]
    pub low_average_threshold: f64,
    /// Default tracing level for coursebook's own log targets.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(flatten)]
    pub registry: RegistrySettings,
}

fn default_threshold() -> f64 {
    DEFAULT_LOW_AVERAGE_THRESHOLD
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CoursebookConfig {
    fn default() -> Self {
        Self {
            low_average_threshold: default_threshold(),
            log_level: default_log_level(),
            registry: RegistrySettings::default(),
        }
    }
}

/// A report threshold must be a finite, non-negative number.
pub fn check_threshold(threshold: f64) -> Result<f64> {
    anyhow::ensure!(
        threshold.is_finite() && threshold >= 0.0,
        "threshold must be a non-negative number, got {threshold}"
    );
    Ok(threshold)
}

impl CoursebookConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        check_threshold(self.low_average_threshold).context("invalid low_average_threshold")?;
        anyhow::ensure!(
            self.registry.default_time_limit_minutes >= 1,
            "default_time_limit_minutes must be at least 1"
        );
        Ok(())
    }
}

/// Parse a TOML string into a validated config.
pub fn parse_config_str(content: &str, source_path: &Path) -> Result<CoursebookConfig> {
    let config: CoursebookConfig = toml::from_str(content)
        .with_context(|| format!("failed to parse config: {}", source_path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {}", source_path.display()))?;
    Ok(config)
}

/// Load config from an explicit path, or search the default locations:
/// `coursebook.toml` in the current directory, then
/// `~/.config/coursebook/config.toml`.
///
/// `COURSEBOOK_THRESHOLD` overrides the report threshold.
pub fn load_config_from(path: Option<&Path>) -> Result<CoursebookConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("coursebook.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content, &path)?
        }
        None => CoursebookConfig::default(),
    };

    if let Ok(raw) = std::env::var(THRESHOLD_ENV) {
        config.low_average_threshold = raw
            .trim()
            .parse()
            .with_context(|| format!("{THRESHOLD_ENV} is not a number: '{raw}'"))?;
        config.validate()?;
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("coursebook"))
}
