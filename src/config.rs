//! Configuration loading and management
//!
//! Handles parsing of `.ggq.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const CONFIG_FILE: &str = ".ggq.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Progress estimation settings
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Notification settings
    #[serde(default)]
    pub notifications: NotifyConfig,

    /// Filter persistence settings
    #[serde(default)]
    pub filters: FiltersConfig,
}

/// Elapsed-time progress estimate parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Simulated growth per elapsed day, in percent
    #[serde(default = "default_daily_rate_percent")]
    pub daily_rate_percent: f64,

    /// Ceiling for simulated progress on unfinished quests
    #[serde(default = "default_max_simulated_percent")]
    pub max_simulated_percent: u32,
}

fn default_daily_rate_percent() -> f64 {
    20.0
}

fn default_max_simulated_percent() -> u32 {
    99
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            daily_rate_percent: default_daily_rate_percent(),
            max_simulated_percent: default_max_simulated_percent(),
        }
    }
}

/// Notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Hours before a deadline at which warnings start
    #[serde(default = "default_deadline_window_hours")]
    pub deadline_window_hours: u32,

    /// Progress thresholds that trigger milestone notifications
    #[serde(default = "default_milestones")]
    pub milestones: Vec<u32>,

    /// Emit a deadline warning once per quest deadline
    #[serde(default = "default_true")]
    pub dedupe_deadline_warnings: bool,
}

fn default_deadline_window_hours() -> u32 {
    24
}

fn default_milestones() -> Vec<u32> {
    vec![25, 50, 75, 100]
}

fn default_true() -> bool {
    true
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            deadline_window_hours: default_deadline_window_hours(),
            milestones: default_milestones(),
            dedupe_deadline_warnings: true,
        }
    }
}

/// Filter persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Suffix for the `quest-filters-<key>` storage entry
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Directory backing the key-value store (defaults to the platform data dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

fn default_storage_key() -> String {
    "default".to_string()
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            storage_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from a `.ggq.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.progress.validate()?;
        self.notifications.validate()?;
        self.filters.validate()?;
        Ok(())
    }
}

impl ProgressConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if !self.daily_rate_percent.is_finite() || self.daily_rate_percent <= 0.0 {
            return Err(crate::error::Error::InvalidConfig(
                "progress.daily_rate_percent must be > 0".to_string(),
            ));
        }
        if self.max_simulated_percent == 0 || self.max_simulated_percent > 99 {
            return Err(crate::error::Error::InvalidConfig(
                "progress.max_simulated_percent must be within 1..=99".to_string(),
            ));
        }
        Ok(())
    }
}

impl NotifyConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.deadline_window_hours == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "notifications.deadline_window_hours must be > 0".to_string(),
            ));
        }

        let mut last = 0;
        for &milestone in &self.milestones {
            if milestone == 0 || milestone > 100 {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "notifications.milestones entry {milestone} must be within 1..=100"
                )));
            }
            if milestone <= last {
                return Err(crate::error::Error::InvalidConfig(
                    "notifications.milestones must be strictly increasing".to_string(),
                ));
            }
            last = milestone;
        }
        Ok(())
    }
}

impl FiltersConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "filters.storage_key cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
