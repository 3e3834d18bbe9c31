//! User configuration stored as TOML.
//!
//! Every field has a default, so a missing file or a partial file both load.
//! The theme toggle writes back to the same file.

use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TodoError};
use crate::fields::Priority;

/// Longest accepted reminder lead (one week).
pub const MAX_REMINDER_LEAD_MINUTES: i64 = 7 * 24 * 60;
/// Longest accepted due-soon window (30 days).
pub const MAX_DUE_SOON_HOURS: i64 = 30 * 24;
/// Longest accepted default snooze (one week).
pub const MAX_SNOOZE_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Use the dark palette in the TUI.
    pub dark_mode: bool,
    /// Priority for `add` when `--priority` is not given.
    pub default_priority: Priority,
    /// Deadline time for `add` when `--at` is not given (`HH:MM`).
    pub default_deadline_time: String,
    /// How long before the deadline the first reminder fires.
    pub reminder_lead_minutes: i64,
    /// Window for the "due soon" deadline-check notification.
    pub due_soon_hours: i64,
    /// Default snooze length.
    pub snooze_minutes: i64,
    /// Seconds between `watch` ticks.
    pub watch_interval_secs: u64,
    /// Ring the terminal bell with each notification.
    pub bell: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dark_mode: false,
            default_priority: Priority::Medium,
            default_deadline_time: "17:00".into(),
            reminder_lead_minutes: 60,
            due_soon_hours: 24,
            snooze_minutes: 60,
            watch_interval_secs: 60,
            bell: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| TodoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject durations outside their supported ranges.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("reminder_lead_minutes", self.reminder_lead_minutes, 0, MAX_REMINDER_LEAD_MINUTES),
            ("due_soon_hours", self.due_soon_hours, 0, MAX_DUE_SOON_HOURS),
            ("snooze_minutes", self.snooze_minutes, 1, MAX_SNOOZE_MINUTES),
        ];
        for (name, value, min, max) in checks {
            if !(min..=max).contains(&value) {
                return Err(TodoError::Config(format!(
                    "{name} must be between {min} and {max}, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let config = Self::from_file(path)?;
            debug!(path = %path.display(), "loaded config");
            Ok(config)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration, creating parent directories as needed.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| TodoError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn reminder_lead(&self) -> Duration {
        Duration::minutes(self.reminder_lead_minutes.clamp(0, MAX_REMINDER_LEAD_MINUTES))
    }

    pub fn due_soon_window(&self) -> Duration {
        Duration::hours(self.due_soon_hours.clamp(0, MAX_DUE_SOON_HOURS))
    }

    /// Parsed `default_deadline_time`.
    pub fn default_time(&self) -> Result<NaiveTime> {
        crate::db::parse_deadline_time(&self.default_deadline_time)
            .map_err(|e| TodoError::Config(format!("default_deadline_time: {e}")))
    }
}
