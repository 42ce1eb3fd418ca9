//! Configuration management for playstat.
//!
//! Handles:
//! - AFK detection threshold
//! - Activity index periods, thresholds and weights
//! - Graph simplification and gap filling
//! - Calendar offset for day/week bucketing
//! - Database location

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{config_read_error, PlaystatError, Result};
use crate::util::time::{DAY, MINUTE};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// AFK detection.
    #[serde(default)]
    pub afk: AfkConfig,
    /// Activity index.
    #[serde(default)]
    pub activity: ActivityConfig,
    /// Graph building.
    #[serde(default)]
    pub graph: GraphConfig,
    /// Calendar settings.
    #[serde(default)]
    pub time: TimeConfig,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| config_read_error(path, &e))?;

        let config: Self = toml::from_str(&content).map_err(|e| PlaystatError::InvalidConfig {
            message: format!("{}: {e}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = default_config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to a specific path.
    ///
    /// The file is written next to its target and renamed into place, so a
    /// failed save leaves any previous config intact.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| PlaystatError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_err = |e| PlaystatError::io(format!("Failed to write {}", path.display()), e);
        std::fs::create_dir_all(dir).map_err(write_err)?;
        let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        staged.write_all(content.as_bytes()).map_err(write_err)?;
        staged.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Reject values the trackers and calculators cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.afk.threshold_ms < 0 {
            return Err(invalid("afk.threshold_ms must not be negative"));
        }

        let activity = &self.activity;
        if activity.period_days == 0 {
            return Err(invalid("activity.period_days must be at least 1"));
        }
        if activity.periods == 0 {
            return Err(invalid("activity.periods must be at least 1"));
        }
        if activity.playtime_threshold_ms <= 0 {
            return Err(invalid("activity.playtime_threshold_ms must be positive"));
        }
        if activity.weights.len() != activity.periods {
            return Err(invalid(format!(
                "activity.weights has {} entries but activity.periods is {}",
                activity.weights.len(),
                activity.periods
            )));
        }
        if activity.weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(invalid("activity.weights must all be positive"));
        }

        if !self.graph.epsilon.is_finite() || self.graph.epsilon < 0.0 {
            return Err(invalid("graph.epsilon must not be negative"));
        }
        if self.graph.gap_accuracy_ms <= 0 {
            return Err(invalid("graph.gap_accuracy_ms must be positive"));
        }

        // chrono accepts offsets strictly inside one day
        if self.time.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(invalid("time.utc_offset_minutes must be within +/-1439"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> PlaystatError {
    PlaystatError::InvalidConfig {
        message: message.into(),
    }
}

/// AFK detection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfkConfig {
    /// Idle time before a player counts as AFK, in milliseconds.
    #[serde(default = "default_afk_threshold")]
    pub threshold_ms: i64,
}

impl Default for AfkConfig {
    fn default() -> Self {
        Self {
            threshold_ms: default_afk_threshold(),
        }
    }
}

/// Activity index configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Length of one sub-period in days.
    #[serde(default = "default_period_days")]
    pub period_days: u32,
    /// Number of sub-periods in the lookback window.
    #[serde(default = "default_periods")]
    pub periods: usize,
    /// Active playtime per sub-period that counts as fully active.
    #[serde(default = "default_playtime_threshold")]
    pub playtime_threshold_ms: i64,
    /// Logins per sub-period that count as fully active.
    #[serde(default = "default_min_logins")]
    pub min_logins: u32,
    /// Weight of each sub-period, most recent first.
    #[serde(default = "default_weights")]
    pub weights: Vec<f64>,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            period_days: default_period_days(),
            periods: default_periods(),
            playtime_threshold_ms: default_playtime_threshold(),
            min_logins: default_min_logins(),
            weights: default_weights(),
        }
    }
}

/// Graph building configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Line simplification tolerance in y units.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Gaps between points wider than this get zero-valued filler points.
    #[serde(default = "default_gap_accuracy")]
    pub gap_accuracy_ms: i64,
    /// Bars shown in top-N charts.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Series colors, cycled. Empty uses the built-in palette.
    #[serde(default)]
    pub colors: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            gap_accuracy_ms: default_gap_accuracy(),
            top_n: default_top_n(),
            colors: Vec::new(),
        }
    }
}

/// Calendar configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Offset from UTC used when grouping by day, week or month.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path. Defaults to the data directory.
    #[serde(default)]
    pub database: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured database path, or the default one.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => default_database_path(),
        }
    }
}

// Default value functions for serde
fn default_afk_threshold() -> i64 {
    3 * MINUTE
}

fn default_period_days() -> u32 {
    7
}

fn default_periods() -> usize {
    3
}

fn default_playtime_threshold() -> i64 {
    30 * MINUTE
}

fn default_min_logins() -> u32 {
    1
}

fn default_weights() -> Vec<f64> {
    vec![1.0, 0.75, 0.5]
}

fn default_epsilon() -> f64 {
    0.5
}

fn default_gap_accuracy() -> i64 {
    DAY
}

fn default_top_n() -> usize {
    10
}

/// Get the default configuration path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| PlaystatError::Unsupported {
        feature: "config directory discovery".to_string(),
    })?;

    Ok(config_dir.join("playstat").join("config.toml"))
}

/// Get the default database path.
pub fn default_database_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| PlaystatError::Unsupported {
        feature: "data directory discovery".to_string(),
    })?;

    Ok(data_dir.join("playstat").join("playstat.db"))
}
