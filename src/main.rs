//! # todo - deadline-aware to-do list
//!
//! A local-first task list for the terminal: a scriptable CLI plus an
//! interactive TUI, both backed by one JSON file.
//!
//! ## Key Features
//!
//! - **Deadlines and priorities**: every task has a date, a time and a Low/Medium/High priority
//! - **Search, filter, sort**: by text, by status, by deadline or priority
//! - **Reminders**: a reminder ahead of each deadline and one at the deadline, plus
//!   one-shot "due soon" and "overdue" notices with snooze (`todo watch`, or live in the TUI)
//! - **Backups**: JSON export/import bundles and timestamped copies of the store
//! - **Light and dark themes**, persisted in the config file
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the TUI
//! todo ui
//!
//! # Add a task via CLI
//! todo add "Submit expense report" --due friday --at 16:00 --priority high
//!
//! # List pending tasks by deadline
//! todo list --filter pending --sort deadline
//!
//! # Get reminders in this terminal
//! todo watch
//! ```
//!
//! Tasks live in `tasks.json` under the platform data directory and settings in
//! `config.toml` under the platform config directory. See [`paths`] for the
//! exact locations and override variables.

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod notify;
pub mod paths;
pub mod reminder;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::Config;
use db::Database;
use error::Result;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, matches!(cli.command, Commands::Ui));

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Install the global subscriber. The TUI owns the terminal, so it logs to a file.
fn init_tracing(verbose: bool, to_file: bool) {
    let default = if verbose { "todo=debug" } else { "todo=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if !to_file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return;
    }

    let dir = paths::logs_dir();
    let file = fs::create_dir_all(&dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("todo.log"))
    });
    // Without a log file the TUI simply runs unlogged.
    if let Ok(file) = file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let db_path = cli.db.unwrap_or_else(paths::default_db_path);
    let config_path = cli.config.unwrap_or_else(paths::default_config_path);
    let mut config = Config::load_or_default(&config_path)?;
    let now = Local::now();

    match cli.command {
        Commands::Ui => cmd_ui(&db_path, &config_path, config),

        Commands::Add { title, desc, due, at, priority } => {
            let mut db = Database::load(&db_path);
            cmd_add(&mut db, &db_path, &config, now, title, desc, due, at, priority).map(|_| ())
        }

        Commands::List { filter, search, sort, limit } => {
            cmd_list(&Database::load(&db_path), now, filter, search, sort, limit);
            Ok(())
        }

        Commands::View { id } => cmd_view(&Database::load(&db_path), now, id),

        Commands::Edit { id, title, desc, due, at, priority } => {
            let mut db = Database::load(&db_path);
            cmd_edit(&mut db, &db_path, now, id, title, desc, due, at, priority)
        }

        Commands::Toggle { id } => {
            let mut db = Database::load(&db_path);
            cmd_toggle(&mut db, &db_path, now, id).map(|_| ())
        }

        Commands::Delete { id, yes } => {
            let mut db = Database::load(&db_path);
            cmd_delete(&mut db, &db_path, id, yes)
        }

        Commands::ClearCompleted { yes } => {
            let mut db = Database::load(&db_path);
            cmd_clear_completed(&mut db, &db_path, yes).map(|_| ())
        }

        Commands::Stats => {
            cmd_stats(&Database::load(&db_path), now);
            Ok(())
        }

        Commands::Export { output } => cmd_export(&Database::load(&db_path), now, output).map(|_| ()),

        Commands::Import { input, no_backup } => {
            let mut db = Database::load(&db_path);
            cmd_import(&mut db, &db_path, now, input, no_backup).map(|_| ())
        }

        Commands::Backup => cmd_backup(&db_path, now).map(|_| ()),

        Commands::Theme { mode } => cmd_theme(&mut config, &config_path, mode),

        Commands::Watch { once, interval } => cmd_watch(&db_path, &config, once, interval),

        Commands::Snooze { id, minutes } => {
            let mut db = Database::load(&db_path);
            cmd_snooze(&mut db, &db_path, &config, now, id, minutes)
        }

        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}
