//! Application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate locations.
//!
//! | Purpose | Linux | macOS |
//! |---------|-------|-------|
//! | Data (tasks, backups, logs) | `~/.local/share/smart-todo/` | `~/Library/Application Support/smart-todo/` |
//! | Config | `~/.config/smart-todo/` | `~/Library/Application Support/smart-todo/` |
//!
//! `SMART_TODO_DATA_DIR` and `SMART_TODO_CONFIG_DIR` override both roots.

use std::path::PathBuf;

const APP_DIR: &str = "smart-todo";

/// Data root: the task store, its backups and the TUI log file.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("SMART_TODO_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".smart-todo"))
}

/// Config root holding `config.toml`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("SMART_TODO_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".smart-todo"))
}

/// Default task store file (`data_dir()/tasks.json`).
#[must_use]
pub fn default_db_path() -> PathBuf {
    data_dir().join("tasks.json")
}

/// Default config file (`config_dir()/config.toml`).
#[must_use]
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Directory for the TUI log file (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}
