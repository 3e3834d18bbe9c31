use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Local, file-backed to-do list with deadline reminders.
/// Storage defaults to the platform data directory or a path passed via --db.
#[derive(Parser)]
#[command(name = "todo", version, about = "To-do list with deadlines and reminders")]
pub struct Cli {
    /// Path to the JSON task store.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to the TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output (RUST_LOG takes precedence).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
