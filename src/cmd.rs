//! Command implementations for the CLI interface.
//!
//! Each handler works on an already loaded store, saves it after every
//! mutation and prints a one-line summary. Errors bubble up to `main`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::config::Config;
use crate::db::*;
use crate::error::{Result, TodoError};
use crate::fields::*;
use crate::notify::TerminalNotifier;
use crate::reminder::{snooze, Watcher};
use crate::task::TaskDraft;
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI interface.
    Ui,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description (up to 300 characters).
        #[arg(long)]
        desc: Option<String>,
        /// Deadline date: YYYY-MM-DD, "today", "tomorrow", "friday", "next monday", "in 3d", "eow", "eom".
        #[arg(long)]
        due: Option<String>,
        /// Deadline time: HH:MM, "noon" or "midnight" (default from config).
        #[arg(long)]
        at: Option<String>,
        /// Priority: low | medium | high (default from config).
        #[arg(long, value_enum)]
        priority: Option<Priority>,
    },

    /// List tasks with optional search, filter and sort.
    List {
        /// Status filter.
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        filter: StatusFilter,
        /// Case-insensitive text matched against title and description.
        #[arg(long, short)]
        search: Option<String>,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::None)]
        sort: SortKey,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task by ID, ID prefix or title.
    View {
        /// Task ID or title to view
        id: String,
    },

    /// Change fields on a task.
    Edit {
        /// Task ID or title to edit
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        /// New deadline date.
        #[arg(long)]
        due: Option<String>,
        /// New deadline time.
        #[arg(long)]
        at: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
    },

    /// Mark a task done, or pending again if it already is.
    Toggle {
        /// Task ID or title to toggle
        id: String,
    },

    /// Delete a task.
    Delete {
        /// Task ID or title to delete
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Delete every completed task.
    ClearCompleted {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Show task counters.
    Stats,

    /// Export all tasks to a JSON backup bundle.
    Export {
        /// Output file path (default: todo-backup-<date>.json)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import tasks from a JSON backup bundle or task array.
    Import {
        /// Input JSON file path
        input: PathBuf,
        /// Skip creating backup before import
        #[arg(long)]
        no_backup: bool,
    },

    /// Create a timestamped backup of the task store.
    Backup,

    /// Show or change the colour theme.
    Theme {
        /// light | dark | toggle. Prints the current theme when omitted.
        #[arg(value_enum)]
        mode: Option<ThemeMode>,
    },

    /// Deliver reminders and deadline notifications to this terminal.
    Watch {
        /// Run a single check and exit.
        #[arg(long)]
        once: bool,
        /// Seconds between checks (default from config).
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Silence due-soon and overdue notifications for a task for a while.
    Snooze {
        /// Task ID or title to snooze
        id: String,
        /// Minutes to snooze for (default from config).
        #[arg(long)]
        minutes: Option<i64>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Launch the terminal user interface.
pub fn cmd_ui(db_path: &Path, config_path: &Path, config: Config) -> Result<()> {
    run_tui(db_path, config_path, config)
}

/// Add a new task to the store.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    db: &mut Database,
    db_path: &Path,
    config: &Config,
    now: DateTime<Local>,
    title: String,
    desc: Option<String>,
    due: Option<String>,
    at: Option<String>,
    priority: Option<Priority>,
) -> Result<String> {
    let deadline_date = due
        .as_deref()
        .map(|d| parse_deadline_date(d, now.date_naive()))
        .transpose()?;
    let deadline_time = match at.as_deref() {
        Some(t) => parse_deadline_time(t)?,
        None => config.default_time()?,
    };
    let draft = TaskDraft {
        title,
        description: desc.unwrap_or_default(),
        deadline_date,
        deadline_time: Some(deadline_time),
        priority: priority.unwrap_or(config.default_priority),
    };
    let id = db.add(draft, now)?;
    db.save(db_path)?;
    println!("Added task {}", id);
    Ok(id)
}

/// List tasks with optional filtering and sorting.
pub fn cmd_list(
    db: &Database,
    now: DateTime<Local>,
    filter: StatusFilter,
    search: Option<String>,
    sort: SortKey,
    limit: Option<usize>,
) {
    let query = TaskQuery {
        search: search.unwrap_or_default(),
        filter,
        sort,
        limit,
    };
    let rows = db.query(&query);
    if rows.is_empty() {
        let (heading, hint) = empty_state(filter, !query.search.trim().is_empty());
        println!("{heading}\n{hint}");
        return;
    }
    print_table(&rows, now);
}

/// Print every field of a single task.
pub fn cmd_view(db: &Database, now: DateTime<Local>, id: String) -> Result<()> {
    let task_id = db.resolve(&id)?;
    let task = db
        .get(&task_id)
        .ok_or_else(|| TodoError::TaskNotFound(task_id.clone()))?;
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Priority:     {}", format_priority(task.priority));
    println!("Status:       {}", if task.completed { "Completed" } else { "Pending" });
    println!("Deadline:     {}", task.deadline().format("%Y-%m-%d %H:%M"));
    println!("When:         {}", task.time_info(now));
    println!("Created:      {}", task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    if let Some(done) = task.completed_at {
        println!("Completed:    {}", done.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
    if let Some(until) = task.snoozed_until.filter(|_| task.is_snoozed(now)) {
        println!("Snoozed to:   {}", until.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
    println!(
        "Description:\n{}\n",
        if task.description.is_empty() { "-" } else { &task.description }
    );
    Ok(())
}

/// Apply field changes to an existing task.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit(
    db: &mut Database,
    db_path: &Path,
    now: DateTime<Local>,
    id: String,
    title: Option<String>,
    desc: Option<String>,
    due: Option<String>,
    at: Option<String>,
    priority: Option<Priority>,
) -> Result<()> {
    let task_id = db.resolve(&id)?;
    let patch = TaskPatch {
        title,
        description: desc,
        deadline_date: due
            .as_deref()
            .map(|d| parse_deadline_date(d, now.date_naive()))
            .transpose()?,
        deadline_time: at.as_deref().map(parse_deadline_time).transpose()?,
        priority,
    };
    if patch.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }
    db.update(&task_id, patch, now)?;
    db.save(db_path)?;
    println!("Updated {}", task_id);
    Ok(())
}

/// Flip a task between pending and completed.
pub fn cmd_toggle(db: &mut Database, db_path: &Path, now: DateTime<Local>, id: String) -> Result<bool> {
    let task_id = db.resolve(&id)?;
    let completed = db.toggle_complete(&task_id, now)?;
    db.save(db_path)?;
    if completed {
        println!("Task completed! 🎉");
    } else {
        println!("Task marked as pending");
    }
    Ok(completed)
}

/// Delete a single task after confirmation.
pub fn cmd_delete(db: &mut Database, db_path: &Path, id: String, yes: bool) -> Result<()> {
    let task_id = db.resolve(&id)?;
    let title = db.get(&task_id).map(|t| t.title.clone()).unwrap_or_default();
    if !confirm(&format!("Delete \"{}\"?", title), yes)? {
        println!("Cancelled.");
        return Ok(());
    }
    db.remove(&task_id)?;
    db.save(db_path)?;
    println!("Task deleted");
    Ok(())
}

/// Delete every completed task after confirmation.
pub fn cmd_clear_completed(db: &mut Database, db_path: &Path, yes: bool) -> Result<usize> {
    let count = db.completed_count();
    if count == 0 {
        println!("No completed tasks to clear");
        return Ok(0);
    }
    if !confirm(&format!("Clear {} completed task(s)?", count), yes)? {
        println!("Cancelled.");
        return Ok(0);
    }
    let removed = db.clear_completed();
    db.save(db_path)?;
    println!("Cleared {} completed task(s)", removed);
    Ok(removed)
}

/// Print the header counters.
pub fn cmd_stats(db: &Database, now: DateTime<Local>) {
    let s = db.stats(now);
    println!("Total:     {}", s.total);
    println!("Pending:   {}", s.pending);
    println!("Completed: {}", s.completed);
    println!("Overdue:   {}", s.overdue);
}

/// Write the export bundle to `output` or the dated default name.
pub fn cmd_export(db: &Database, now: DateTime<Local>, output: Option<PathBuf>) -> Result<PathBuf> {
    let path = output.unwrap_or_else(|| PathBuf::from(default_export_name(now.date_naive())));
    let count = db.export_to(&path, now)?;
    println!("Exported {} task(s) to {}", count, path.display());
    Ok(path)
}

/// Merge tasks from a JSON file, backing the store up first.
pub fn cmd_import(
    db: &mut Database,
    db_path: &Path,
    now: DateTime<Local>,
    input: PathBuf,
    no_backup: bool,
) -> Result<ImportReport> {
    let raw = fs::read_to_string(&input)?;

    if !no_backup && db_path.exists() {
        match create_backup(db_path, now) {
            Ok(backup_path) => println!("Created backup: {}", backup_path.display()),
            Err(e) => {
                eprintln!("Warning: Failed to create backup: {}", e);
                if !confirm("Continue without backup?", false)? {
                    println!("Import cancelled.");
                    return Ok(ImportReport::default());
                }
            }
        }
    }

    let report = db.import_json(&raw)?;
    db.save(db_path)?;
    println!("Imported {} task(s), skipped {}", report.imported, report.skipped);
    Ok(report)
}

/// Copy the store file into its backup directory.
pub fn cmd_backup(db_path: &Path, now: DateTime<Local>) -> Result<PathBuf> {
    let backup_path = create_backup(db_path, now)?;
    println!("Backup created: {}", backup_path.display());
    Ok(backup_path)
}

/// Show or switch the theme, persisting the choice to the config file.
pub fn cmd_theme(config: &mut Config, config_path: &Path, mode: Option<ThemeMode>) -> Result<()> {
    let dark = match mode {
        None => {
            println!("{}", if config.dark_mode { "dark" } else { "light" });
            return Ok(());
        }
        Some(ThemeMode::Light) => false,
        Some(ThemeMode::Dark) => true,
        Some(ThemeMode::Toggle) => !config.dark_mode,
    };
    config.dark_mode = dark;
    config.save_to_file(config_path)?;
    println!("Theme set to {}", if dark { "dark" } else { "light" });
    Ok(())
}

/// Run the reminder watcher against the store file, printing to stdout.
pub fn cmd_watch(db_path: &Path, config: &Config, once: bool, interval: Option<u64>) -> Result<()> {
    let secs = interval.unwrap_or(config.watch_interval_secs).max(1);
    let notifier = TerminalNotifier::new(io::stdout(), config.bell);
    let mut watcher = Watcher::new(db_path, config, notifier);
    if !once {
        println!("Watching {} every {}s (Ctrl-C to stop)", db_path.display(), secs);
    }
    watcher.run(once.then_some(1), std::time::Duration::from_secs(secs))
}

/// Snooze deadline-check notifications for a task.
pub fn cmd_snooze(
    db: &mut Database,
    db_path: &Path,
    config: &Config,
    now: DateTime<Local>,
    id: String,
    minutes: Option<i64>,
) -> Result<()> {
    let task_id = db.resolve(&id)?;
    let minutes = minutes.unwrap_or(config.snooze_minutes).max(1);
    let task = db
        .get_mut(&task_id)
        .ok_or_else(|| TodoError::TaskNotFound(task_id.clone()))?;
    let until = snooze(task, now, minutes)?;
    let title = task.title.clone();
    db.save(db_path)?;
    println!(
        "Snoozed \"{}\" until {}",
        title,
        until.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}

/// Ask a yes/no question on stdin. `assume_yes` skips the prompt.
fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase().starts_with('y'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::at;
    use chrono::Duration;

    fn store() -> (tempfile::TempDir, PathBuf, Database, DateTime<Local>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        (dir, path, Database::default(), at(2026, 3, 1, 12, 0))
    }

    #[test]
    fn add_uses_config_defaults_and_saves() {
        let (_dir, path, mut db, now) = store();
        let config = Config { default_priority: Priority::High, ..Config::default() };
        let id = cmd_add(&mut db, &path, &config, now, "Pay rent".into(), None, Some("tomorrow".into()), None, None)
            .unwrap();

        let saved = Database::load(&path);
        let task = saved.get(&id).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.deadline_time.format("%H:%M").to_string(), "17:00");
        assert_eq!(task.deadline_date, now.date_naive() + Duration::days(1));
    }

    #[test]
    fn add_without_due_date_is_rejected() {
        let (_dir, path, mut db, now) = store();
        let err = cmd_add(&mut db, &path, &Config::default(), now, "No date".into(), None, None, None, None)
            .unwrap_err();
        assert!(matches!(err, TodoError::MissingDeadline));
        assert!(!path.exists());
    }

    #[test]
    fn edit_toggle_and_clear_by_title() {
        let (_dir, path, mut db, now) = store();
        let config = Config::default();
        cmd_add(&mut db, &path, &config, now, "Dentist".into(), None, Some("2026-03-04".into()), Some("15:30".into()), None)
            .unwrap();

        cmd_edit(&mut db, &path, now, "dentist".into(), None, Some("bring card".into()), None, None, Some(Priority::Low))
            .unwrap();
        assert_eq!(db.tasks[0].description, "bring card");
        assert_eq!(db.tasks[0].priority, Priority::Low);

        assert!(cmd_toggle(&mut db, &path, now, "Dentist".into()).unwrap());
        assert_eq!(cmd_clear_completed(&mut db, &path, true).unwrap(), 1);
        assert!(Database::load(&path).tasks.is_empty());
        assert_eq!(cmd_clear_completed(&mut db, &path, true).unwrap(), 0);
    }

    #[test]
    fn export_then_import_skips_existing() {
        let (dir, path, mut db, now) = store();
        cmd_add(&mut db, &path, &Config::default(), now, "Keep".into(), None, Some("tomorrow".into()), None, None)
            .unwrap();
        let out = cmd_export(&db, now, Some(dir.path().join("out.json"))).unwrap();

        let report = cmd_import(&mut db, &path, now, out, false).unwrap();
        assert_eq!(report, ImportReport { imported: 0, skipped: 1 });
        assert!(dir.path().join("backup").read_dir().unwrap().next().is_some());
    }

    #[test]
    fn theme_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        cmd_theme(&mut config, &path, Some(ThemeMode::Toggle)).unwrap();
        assert!(Config::from_file(&path).unwrap().dark_mode);
        cmd_theme(&mut config, &path, Some(ThemeMode::Light)).unwrap();
        assert!(!Config::from_file(&path).unwrap().dark_mode);
    }

    #[test]
    fn snooze_sets_until() {
        let (_dir, path, mut db, now) = store();
        let config = Config::default();
        cmd_add(&mut db, &path, &config, now, "Call".into(), None, Some("tomorrow".into()), None, None).unwrap();
        cmd_snooze(&mut db, &path, &config, now, "call".into(), Some(30)).unwrap();
        let saved = Database::load(&path);
        assert!(saved.tasks[0].is_snoozed(now + Duration::minutes(29)));
        assert!(!saved.tasks[0].is_snoozed(now + Duration::minutes(31)));

        let err = cmd_snooze(&mut db, &path, &config, now, "call".into(), Some(i64::MAX)).unwrap_err();
        assert!(matches!(err, TodoError::InvalidSnooze(_)));
        assert!(Database::load(&path).tasks[0].is_snoozed(now + Duration::minutes(29)));
    }
}
