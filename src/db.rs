//! Task store operations and utility functions.
//!
//! This module provides the `Database` struct holding the ordered task list,
//! its JSON persistence, the filter/sort pipeline behind every list view,
//! export/import bundles and backups, plus deadline input parsing and the
//! table printer used by the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, TodoError};
use crate::fields::*;
use crate::task::{truncate_to_minute, Task, TaskDraft};

/// Version tag written into export bundles.
pub const EXPORT_VERSION: &str = "1.0";

/// In-memory task store. Index 0 is the most recently added task.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
}

/// Partial update applied by `edit`.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline_date: Option<NaiveDate>,
    pub deadline_time: Option<NaiveTime>,
    pub priority: Option<Priority>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.deadline_date.is_none()
            && self.deadline_time.is_none()
            && self.priority.is_none()
    }
}

/// Filter and ordering for a list view.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    /// Case-insensitive substring matched against title and description.
    pub search: String,
    pub filter: StatusFilter,
    pub sort: SortKey,
    pub limit: Option<usize>,
}

/// Counters shown in the list header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub overdue: usize,
}

/// File written by `export`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub tasks: Vec<Task>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

impl Database {
    /// Load the store from a JSON file, starting empty if the file doesn't exist.
    ///
    /// Unreadable or unparsable files are logged and replaced by an empty
    /// store. Both `{"tasks": [...]}` and a bare array are accepted; records
    /// that are missing required fields are dropped.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no store file yet, starting empty");
            return Database::default();
        }
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "error reading store, starting fresh");
                return Database::default();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => match task_records(value) {
                Some(records) => {
                    let (tasks, dropped) = parse_records(records);
                    if dropped > 0 {
                        warn!(dropped, "dropped invalid task records while loading");
                    }
                    debug!(count = tasks.len(), path = %path.display(), "loaded tasks");
                    Database { tasks }
                }
                None => {
                    warn!(path = %path.display(), "store has no task list, starting fresh");
                    Database::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "error parsing store, starting fresh");
                Database::default()
            }
        }
    }

    /// Save the store to a JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, data)?;
        fs::rename(&tmp, path)?;
        debug!(count = self.tasks.len(), path = %path.display(), "saved tasks");
        Ok(())
    }

    /// Validate a draft and insert the new task at the top of the list.
    pub fn add(&mut self, draft: TaskDraft, now: DateTime<Local>) -> Result<String> {
        let valid = draft.validate(now)?;
        let mut task = Task::from_draft(valid, now);
        while self.get(&task.id).is_some() {
            task.id = crate::task::generate_id(now);
        }
        let id = task.id.clone();
        info!(id = %id, title = %task.title, "task added");
        self.tasks.insert(0, task);
        Ok(id)
    }

    /// Get a task by ID.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    fn get_or_err(&mut self, id: &str) -> Result<&mut Task> {
        self.get_mut(id)
            .ok_or_else(|| TodoError::TaskNotFound(id.to_string()))
    }

    /// Resolve a task identifier to a task ID.
    ///
    /// Tries an exact ID, then a unique ID prefix, then a unique
    /// case-insensitive title. Several matches are reported as an error that
    /// lists the candidates.
    pub fn resolve(&self, identifier: &str) -> Result<String> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(TodoError::TaskNotFound(identifier.to_string()));
        }
        if let Some(task) = self.get(identifier) {
            return Ok(task.id.clone());
        }

        let by_prefix: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.id.starts_with(identifier))
            .collect();
        let matches = if by_prefix.is_empty() {
            let needle = identifier.to_lowercase();
            self.tasks
                .iter()
                .filter(|t| t.title.to_lowercase() == needle)
                .collect()
        } else {
            by_prefix
        };

        match matches.as_slice() {
            [] => Err(TodoError::TaskNotFound(identifier.to_string())),
            [only] => Ok(only.id.clone()),
            many => {
                let mut candidates = String::new();
                for task in many {
                    candidates.push_str(&format!(
                        "  {}: {} ({})\n",
                        task.id,
                        task.title,
                        format_priority(task.priority)
                    ));
                }
                Err(TodoError::AmbiguousTask {
                    identifier: identifier.to_string(),
                    candidates,
                })
            }
        }
    }

    /// Flip a task between pending and completed. Returns the new state.
    pub fn toggle_complete(&mut self, id: &str, now: DateTime<Local>) -> Result<bool> {
        let task = self.get_or_err(id)?;
        let completed = !task.completed;
        task.set_completed(completed, now);
        info!(id = %id, completed, "task toggled");
        Ok(completed)
    }

    /// Apply a partial update.
    ///
    /// The edited task goes through the same validation as a new one. A
    /// changed deadline must be in the future and re-arms deadline
    /// notifications; an untouched deadline may already be overdue.
    pub fn update(&mut self, id: &str, patch: TaskPatch, now: DateTime<Local>) -> Result<()> {
        let task = self.get_or_err(id)?;
        let mut draft = TaskDraft::from_task(task);
        let deadline_changed = patch
            .deadline_date
            .is_some_and(|d| d != task.deadline_date)
            || patch
                .deadline_time
                .is_some_and(|t| truncate_to_minute(t) != task.deadline_time);

        if let Some(title) = patch.title {
            draft.title = title;
        }
        if let Some(description) = patch.description {
            draft.description = description;
        }
        if let Some(date) = patch.deadline_date {
            draft.deadline_date = Some(date);
        }
        if let Some(time) = patch.deadline_time {
            draft.deadline_time = Some(time);
        }
        if let Some(priority) = patch.priority {
            draft.priority = priority;
        }

        let valid = if deadline_changed {
            draft.validate(now)?
        } else {
            draft.validate_keeping_deadline()?
        };

        task.title = valid.title;
        task.description = valid.description;
        task.deadline_date = valid.deadline_date;
        task.deadline_time = valid.deadline_time;
        task.priority = valid.priority;
        if deadline_changed {
            task.reset_notifications();
        }
        info!(id = %id, deadline_changed, "task updated");
        Ok(())
    }

    /// Remove a task by ID.
    pub fn remove(&mut self, id: &str) -> Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TodoError::TaskNotFound(id.to_string()))?;
        let task = self.tasks.remove(idx);
        info!(id = %id, title = %task.title, "task deleted");
        Ok(task)
    }

    /// Remove every completed task. Returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();
        if removed > 0 {
            info!(removed, "cleared completed tasks");
        }
        removed
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    pub fn stats(&self, now: DateTime<Local>) -> Stats {
        let total = self.tasks.len();
        let completed = self.completed_count();
        let overdue = self
            .tasks
            .iter()
            .filter(|t| !t.completed && t.is_overdue(now))
            .count();
        Stats {
            total,
            pending: total - completed,
            completed,
            overdue,
        }
    }

    /// Filter, sort and limit the task list for display.
    pub fn query(&self, query: &TaskQuery) -> Vec<&Task> {
        let needle = query.search.trim().to_lowercase();
        let mut filtered: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| {
                if !needle.is_empty()
                    && !t.title.to_lowercase().contains(&needle)
                    && !t.description.to_lowercase().contains(&needle)
                {
                    return false;
                }
                match query.filter {
                    StatusFilter::All => true,
                    StatusFilter::Pending => !t.completed,
                    StatusFilter::Completed => t.completed,
                }
            })
            .collect();

        // Both sorts are stable so ties keep store order.
        match query.sort {
            SortKey::None => {}
            SortKey::Deadline => filtered.sort_by_key(|t| t.deadline()),
            SortKey::Priority => filtered.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank())),
        }

        if let Some(n) = query.limit {
            filtered.truncate(n);
        }
        filtered
    }

    /// Snapshot the store as an export bundle.
    pub fn export_bundle(&self, now: DateTime<Local>) -> ExportBundle {
        ExportBundle {
            tasks: self.tasks.clone(),
            export_date: now.with_timezone(&Utc),
            version: EXPORT_VERSION.to_string(),
        }
    }

    /// Write the export bundle to `path` as pretty JSON. Returns the task count.
    pub fn export_to(&self, path: &Path, now: DateTime<Local>) -> Result<usize> {
        let bundle = self.export_bundle(now);
        fs::write(path, serde_json::to_string_pretty(&bundle)?)?;
        info!(path = %path.display(), count = bundle.tasks.len(), "exported tasks");
        Ok(bundle.tasks.len())
    }

    /// Merge tasks from an export bundle or a bare JSON array.
    ///
    /// Tasks whose ID already exists, and records that fail validation, are
    /// skipped. Imported tasks keep their relative order and go after the
    /// existing ones.
    pub fn import_json(&mut self, raw: &str) -> Result<ImportReport> {
        let value: Value = serde_json::from_str(raw)?;
        let records = task_records(value).ok_or_else(|| {
            TodoError::Import("expected an export bundle or an array of tasks".into())
        })?;

        let mut report = ImportReport::default();
        for record in records {
            match parse_record(record) {
                Some(task) if self.get(&task.id).is_none() => {
                    self.tasks.push(task);
                    report.imported += 1;
                }
                Some(task) => {
                    debug!(id = %task.id, "skipping import of existing task");
                    report.skipped += 1;
                }
                None => report.skipped += 1,
            }
        }
        info!(imported = report.imported, skipped = report.skipped, "import finished");
        Ok(report)
    }
}

/// Pull the task array out of either store layout.
fn task_records(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("tasks") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn parse_record(record: Value) -> Option<Task> {
    match serde_json::from_value::<Task>(record) {
        Ok(mut task) => match task.check_fields() {
            Ok(()) => {
                if task.normalize_completion() {
                    warn!(id = %task.id, completed = task.completed, "repaired completion time");
                }
                Some(task)
            }
            Err(e) => {
                warn!(id = %task.id, error = %e, "invalid task record");
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "unreadable task record");
            None
        }
    }
}

/// Parse records, returning the valid tasks and the number dropped.
fn parse_records(records: Vec<Value>) -> (Vec<Task>, usize) {
    let total = records.len();
    let tasks: Vec<Task> = records.into_iter().filter_map(parse_record).collect();
    let dropped = total - tasks.len();
    (tasks, dropped)
}

/// Default file name for an export made on `today`.
pub fn default_export_name(today: NaiveDate) -> String {
    format!("todo-backup-{}.json", today.format("%Y-%m-%d"))
}

/// Create a timestamped copy of the store file in a `backup/` directory next to it.
pub fn create_backup(db_path: &Path, now: DateTime<Local>) -> Result<PathBuf> {
    if !db_path.exists() {
        return Err(TodoError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("store file {} does not exist", db_path.display()),
        )));
    }

    let parent_dir = db_path.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent_dir.join("backup");
    fs::create_dir_all(&backup_dir)?;

    let timestamp = now.format("%Y-%m-%d_%H-%M-%S");
    let db_filename = db_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("tasks.json");
    let backup_path = backup_dir.join(format!("{}_{}", timestamp, db_filename));

    fs::copy(db_path, &backup_path)?;
    info!(path = %backup_path.display(), "backup created");
    Ok(backup_path)
}

/// Parse human-readable deadline date input.
///
/// Supports:
/// - "today", "tomorrow"
/// - "monday".."sunday" (and three-letter forms), "next friday", "this friday"
/// - "end of week", "end of month"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD"
pub fn parse_deadline_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let s = input.trim().to_lowercase();
    let invalid = || TodoError::InvalidDate(input.trim().to_string());
    let shift = |delta: Option<Duration>| {
        delta
            .and_then(|d| today.checked_add_signed(d))
            .ok_or_else(invalid)
    };

    match s.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return shift(Duration::try_days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Ok(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
            return Ok(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(n) = rest.strip_suffix('d') {
            if let Ok(days) = n.trim().parse::<i64>() {
                return shift(Duration::try_days(days));
            }
        }
        if let Some(n) = rest.strip_suffix('w') {
            if let Ok(weeks) = n.trim().parse::<i64>() {
                return shift(Duration::try_weeks(weeks));
            }
        }
        return Err(invalid());
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current_day = today.weekday().num_days_from_monday() as i64;
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name || s == format!("this {}", day_name) {
            return shift(Duration::try_days(days_ahead));
        }
        if s == format!("next {}", day_name) {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return shift(Duration::try_days(days_to_add));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| invalid())
}

/// Parse a deadline time: "HH:MM", "HH:MM:SS", "noon" or "midnight".
///
/// Deadlines are stored to the minute, so seconds are dropped.
pub fn parse_deadline_time(input: &str) -> Result<NaiveTime> {
    let s = input.trim().to_lowercase();
    let parsed = match s.as_str() {
        "noon" => NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => NaiveTime::from_hms_opt(0, 0, 0),
        _ => NaiveTime::parse_from_str(&s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .ok()
            .map(truncate_to_minute),
    };
    parsed.ok_or_else(|| TodoError::InvalidTime(input.trim().to_string()))
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(6);
    (start, end)
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task], now: DateTime<Local>) {
    println!(
        "{:<10} {:<7} {:<8} {:<17} {:<22} {}",
        "ID", "Pri", "Status", "Deadline", "When", "Title"
    );
    for t in tasks {
        let status = if t.completed {
            "Done"
        } else if t.is_overdue(now) {
            "Overdue"
        } else {
            "Pending"
        };
        println!(
            "{:<10} {:<7} {:<8} {:<17} {:<22} {}",
            truncate(&t.id, 10),
            format_priority(t.priority),
            status,
            t.deadline().format("%Y-%m-%d %H:%M"),
            truncate(&t.time_info(now), 22),
            t.title
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::{at, draft};

    fn seeded() -> (Database, DateTime<Local>) {
        let now = at(2026, 3, 1, 12, 0);
        let mut db = Database::default();
        let mut report = draft("Write report", (2026, 3, 5), (9, 0));
        report.priority = Priority::Low;
        report.description = "quarterly numbers".into();
        db.add(report, now).unwrap();
        let mut dentist = draft("Dentist", (2026, 3, 2), (15, 30));
        dentist.priority = Priority::High;
        db.add(dentist, now).unwrap();
        db.add(draft("Call mum", (2026, 3, 3), (18, 0)), now).unwrap();
        (db, now)
    }

    fn titles(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_add_inserts_newest_first() {
        let (db, _) = seeded();
        assert_eq!(db.tasks[0].title, "Call mum");
        assert_eq!(db.tasks[2].title, "Write report");
    }

    #[test]
    fn test_add_rejects_past_deadline() {
        let (mut db, now) = seeded();
        let err = db.add(draft("Late", (2026, 2, 1), (9, 0)), now).unwrap_err();
        assert!(matches!(err, TodoError::DeadlineInPast(_)));
        assert_eq!(db.tasks.len(), 3);
    }

    #[test]
    fn test_query_search_filter_and_sort() {
        let (mut db, now) = seeded();
        let dentist = db.resolve("dentist").unwrap();
        db.toggle_complete(&dentist, now).unwrap();

        let q = TaskQuery { search: "QUARTERLY".into(), ..Default::default() };
        assert_eq!(titles(&db.query(&q)), vec!["Write report"]);

        let q = TaskQuery { filter: StatusFilter::Completed, ..Default::default() };
        assert_eq!(titles(&db.query(&q)), vec!["Dentist"]);

        let q = TaskQuery { filter: StatusFilter::Pending, sort: SortKey::Deadline, ..Default::default() };
        assert_eq!(titles(&db.query(&q)), vec!["Call mum", "Write report"]);

        let q = TaskQuery { sort: SortKey::Priority, ..Default::default() };
        assert_eq!(titles(&db.query(&q)), vec!["Dentist", "Call mum", "Write report"]);

        let q = TaskQuery { limit: Some(1), ..Default::default() };
        assert_eq!(titles(&db.query(&q)), vec!["Call mum"]);
    }

    #[test]
    fn test_toggle_sets_and_clears_completed_at() {
        let (mut db, now) = seeded();
        let id = db.tasks[0].id.clone();
        assert!(db.toggle_complete(&id, now).unwrap());
        assert!(db.get(&id).unwrap().completed_at.is_some());
        assert!(!db.toggle_complete(&id, now).unwrap());
        assert!(db.get(&id).unwrap().completed_at.is_none());
        assert!(matches!(db.toggle_complete("nope", now), Err(TodoError::TaskNotFound(_))));
    }

    #[test]
    fn test_update_rearms_notifications_on_new_deadline() {
        let (mut db, now) = seeded();
        let id = db.resolve("call mum").unwrap();
        db.get_mut(&id).unwrap().notified_24h = true;

        let patch = TaskPatch { title: Some(" Call mum back ".into()), ..Default::default() };
        db.update(&id, patch, now).unwrap();
        let task = db.get(&id).unwrap();
        assert_eq!(task.title, "Call mum back");
        assert!(task.notified_24h);

        let patch = TaskPatch {
            deadline_date: NaiveDate::from_ymd_opt(2026, 3, 10),
            ..Default::default()
        };
        db.update(&id, patch, now).unwrap();
        assert!(!db.get(&id).unwrap().notified_24h);

        let patch = TaskPatch { deadline_date: NaiveDate::from_ymd_opt(2026, 2, 10), ..Default::default() };
        assert!(db.update(&id, patch, now).is_err());
    }

    #[test]
    fn test_update_keeps_existing_overdue_deadline() {
        let (mut db, _) = seeded();
        let id = db.resolve("dentist").unwrap();
        let later = at(2026, 3, 4, 9, 0);
        let patch = TaskPatch { priority: Some(Priority::Low), ..Default::default() };
        db.update(&id, patch, later).unwrap();
        assert_eq!(db.get(&id).unwrap().priority, Priority::Low);
    }

    #[test]
    fn test_update_with_seconds_on_same_minute_keeps_flags() {
        let (mut db, now) = seeded();
        let id = db.tasks[0].id.clone();
        db.tasks[0].notified_24h = true;
        let patch = TaskPatch {
            deadline_time: Some(parse_deadline_time("18:00:42").unwrap()),
            ..TaskPatch::default()
        };
        db.update(&id, patch, now).unwrap();
        assert!(db.tasks[0].notified_24h);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        db.save(&path).unwrap();
        assert_eq!(Database::load(&path).tasks[0].deadline(), db.tasks[0].deadline());
    }

    #[test]
    fn test_resolve_by_prefix_and_ambiguity() {
        let (mut db, now) = seeded();
        let id = db.tasks[1].id.clone();
        db.tasks[1].id = format!("zz{}", id);
        assert_eq!(db.resolve("zz").unwrap(), format!("zz{}", id));

        db.add(draft("Dentist", (2026, 4, 1), (9, 0)), now).unwrap();
        assert!(matches!(db.resolve("dentist"), Err(TodoError::AmbiguousTask { .. })));
        assert!(matches!(db.resolve("missing"), Err(TodoError::TaskNotFound(_))));
    }

    #[test]
    fn test_remove_and_clear_completed() {
        let (mut db, now) = seeded();
        let id = db.resolve("write report").unwrap();
        let removed = db.remove(&id).unwrap();
        assert_eq!(removed.title, "Write report");
        assert!(db.remove(&id).is_err());

        assert_eq!(db.clear_completed(), 0);
        let id = db.tasks[0].id.clone();
        db.toggle_complete(&id, now).unwrap();
        assert_eq!(db.clear_completed(), 1);
        assert_eq!(db.tasks.len(), 1);
    }

    #[test]
    fn test_stats_counts_overdue_pending_only() {
        let (mut db, _) = seeded();
        let later = at(2026, 3, 4, 9, 0);
        let id = db.resolve("dentist").unwrap();
        db.toggle_complete(&id, later).unwrap();
        let stats = db.stats(later);
        assert_eq!(stats, Stats { total: 3, pending: 2, completed: 1, overdue: 1 });
    }

    #[test]
    fn test_save_and_load_drops_invalid_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.json");
        let (db, _) = seeded();
        db.save(&path).unwrap();
        assert_eq!(Database::load(&path).tasks, db.tasks);

        let mut records: Vec<Value> = db.tasks.iter().map(|t| serde_json::to_value(t).unwrap()).collect();
        records.push(serde_json::json!({ "id": "x", "title": "no deadline", "priority": "Low" }));
        records.push(serde_json::json!({
            "id": "y", "title": "  ", "deadlineDate": "2026-01-01", "deadlineTime": "09:00",
            "priority": "Low", "createdAt": "2026-01-01T00:00:00Z"
        }));
        fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();
        assert_eq!(Database::load(&path).tasks.len(), 3);
    }

    #[test]
    fn test_load_repairs_completion_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let (db, _) = seeded();
        let mut records: Vec<Value> = db.tasks.iter().map(|t| serde_json::to_value(t).unwrap()).collect();
        records[0]["completed"] = true.into();
        records[1]["completedAt"] = "2026-03-01T10:00:00Z".into();
        fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

        let loaded = Database::load(&path);
        assert_eq!(loaded.tasks.len(), 3);
        for task in &loaded.tasks {
            assert_eq!(task.completed, task.completed_at.is_some(), "{}", task.title);
        }
        assert_eq!(loaded.tasks[0].completed_at, Some(loaded.tasks[0].created_at));
    }

    #[test]
    fn test_load_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Database::load(&path).tasks.is_empty());
        assert!(Database::load(&dir.path().join("missing.json")).tasks.is_empty());
    }

    #[test]
    fn test_export_import_skips_existing_ids() {
        let (db, now) = seeded();
        let bundle = db.export_bundle(now);
        assert_eq!(bundle.version, EXPORT_VERSION);
        let raw = serde_json::to_string(&bundle).unwrap();
        assert!(raw.contains("\"exportDate\""));

        let mut other = Database::default();
        other.add(draft("Own task", (2026, 3, 9), (9, 0)), now).unwrap();
        other.tasks.push(db.tasks[0].clone());
        let report = other.import_json(&raw).unwrap();
        assert_eq!(report, ImportReport { imported: 2, skipped: 1 });
        assert_eq!(other.tasks.len(), 4);
        assert_eq!(other.tasks[0].title, "Own task");

        assert!(matches!(other.import_json("{\"foo\": 1}"), Err(TodoError::Import(_))));
    }

    #[test]
    fn test_create_backup_copies_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let (db, now) = seeded();
        assert!(create_backup(&path, now).is_err());
        db.save(&path).unwrap();
        let backup = create_backup(&path, now).unwrap();
        assert!(backup.ends_with("backup/2026-03-01_12-00-00_tasks.json"));
        assert_eq!(fs::read_to_string(backup).unwrap(), fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn test_parse_deadline_date() {
        // 2026-03-04 is a Wednesday.
        let today = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let d = |y, m, dd| NaiveDate::from_ymd_opt(y, m, dd).unwrap();
        assert_eq!(parse_deadline_date("today", today).unwrap(), today);
        assert_eq!(parse_deadline_date("Tomorrow", today).unwrap(), d(2026, 3, 5));
        assert_eq!(parse_deadline_date("friday", today).unwrap(), d(2026, 3, 6));
        assert_eq!(parse_deadline_date("wed", today).unwrap(), today);
        assert_eq!(parse_deadline_date("next wednesday", today).unwrap(), d(2026, 3, 11));
        assert_eq!(parse_deadline_date("next mon", today).unwrap(), d(2026, 3, 16));
        assert_eq!(parse_deadline_date("in 3d", today).unwrap(), d(2026, 3, 7));
        assert_eq!(parse_deadline_date("in 2w", today).unwrap(), d(2026, 3, 18));
        assert_eq!(parse_deadline_date("end of week", today).unwrap(), d(2026, 3, 8));
        assert_eq!(parse_deadline_date("eom", today).unwrap(), d(2026, 3, 31));
        assert_eq!(parse_deadline_date("2026-12-25", today).unwrap(), d(2026, 12, 25));
        assert!(matches!(parse_deadline_date("someday", today), Err(TodoError::InvalidDate(_))));
        assert!(parse_deadline_date("in 3x", today).is_err());
    }

    #[test]
    fn test_parse_deadline_date_out_of_range_is_an_error() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        for input in ["in 999999999d", "in 9223372036854775807d", "in 99999999999w"] {
            assert!(
                matches!(parse_deadline_date(input, today), Err(TodoError::InvalidDate(_))),
                "{input}"
            );
        }
        assert!(parse_deadline_date("tomorrow", NaiveDate::MAX).is_err());
    }

    #[test]
    fn test_parse_deadline_time() {
        assert_eq!(parse_deadline_time("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(parse_deadline_time("17:45:10").unwrap(), NaiveTime::from_hms_opt(17, 45, 0).unwrap());
        assert_eq!(parse_deadline_time("Noon").unwrap(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert!(matches!(parse_deadline_time("25:00"), Err(TodoError::InvalidTime(_))));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 5), "abcd…");
    }
}
