//! Daemon configuration.

use crate::error::{CuratorError, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One directory rename to propagate: every catalogued directory containing
/// `old` has that fragment replaced with `new`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRule {
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratorConfig {
    /// Catalog database location.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory trees the daemon keeps the catalog in sync with.
    #[serde(default)]
    pub watched_roots: Vec<String>,

    /// Directory renames applied during the nightly propagation run.
    #[serde(default)]
    pub rename_rules: Vec<RenameRule>,

    /// Base URL of the remote files API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Local wall-clock time of the daily full reconciliation ("HH:MM").
    #[serde(default = "default_full_scan_time")]
    pub full_scan_time: String,

    /// Local wall-clock time of the daily rename propagation ("HH:MM").
    #[serde(default = "default_rename_time")]
    pub rename_time: String,

    /// Seconds between deletion sweep cycles.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Day of month on which already-soft-deleted records are re-asserted.
    #[serde(default = "default_resweep_day_of_month")]
    pub resweep_day_of_month: u32,

    /// Hour (local) of the monthly re-assertion sweep.
    #[serde(default = "default_resweep_hour")]
    pub resweep_hour: u32,

    /// Records persisted per batch during ingest.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_database_path() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".curator")
        .join("catalog.sqlite3")
        .display()
        .to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_full_scan_time() -> String {
    "05:00".to_string()
}

fn default_rename_time() -> String {
    "03:00".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_resweep_day_of_month() -> u32 {
    25
}

fn default_resweep_hour() -> u32 {
    2
}

fn default_batch_size() -> usize {
    20
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            watched_roots: Vec::new(),
            rename_rules: Vec::new(),
            api_base_url: default_api_base_url(),
            full_scan_time: default_full_scan_time(),
            rename_time: default_rename_time(),
            sweep_interval_secs: default_sweep_interval_secs(),
            resweep_day_of_month: default_resweep_day_of_month(),
            resweep_hour: default_resweep_hour(),
            batch_size: default_batch_size(),
        }
    }
}

impl CuratorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|err| CuratorError::config(format!("{}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|err| CuratorError::config(err.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parsed daily full-scan time.
    pub fn full_scan_at(&self) -> Result<NaiveTime> {
        parse_time("full_scan_time", &self.full_scan_time)
    }

    /// Parsed daily rename-propagation time.
    pub fn rename_at(&self) -> Result<NaiveTime> {
        parse_time("rename_time", &self.rename_time)
    }

    fn validate(&self) -> Result<()> {
        self.full_scan_at()?;
        self.rename_at()?;
        if self.batch_size == 0 {
            return Err(CuratorError::config("batch_size must be at least 1"));
        }
        if !(1..=28).contains(&self.resweep_day_of_month) {
            return Err(CuratorError::config(
                "resweep_day_of_month must be between 1 and 28",
            ));
        }
        if self.resweep_hour > 23 {
            return Err(CuratorError::config("resweep_hour must be between 0 and 23"));
        }
        Ok(())
    }
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| CuratorError::config(format!("{field}: expected HH:MM, got {value:?}")))
}
