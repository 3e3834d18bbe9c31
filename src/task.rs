//! Task data structure and related functionality.
//!
//! This module defines the core `Task` record, the `TaskDraft` used to create
//! and edit tasks through a single validation path, and the relative-time
//! formatting shown next to every deadline.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TodoError};
use crate::fields::Priority;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 300;

/// Drop seconds: deadlines are stored and compared to the minute.
pub fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

/// A to-do item with a deadline and priority.
///
/// Field names serialise in camelCase so stores written by the web version of
/// the list load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub deadline_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub deadline_time: NaiveTime,
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "notified24h")]
    pub notified_24h: bool,
    #[serde(default)]
    pub notified_overdue: bool,
    #[serde(default)]
    pub snoozed_until: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a task from an already validated draft.
    pub fn from_draft(draft: ValidDraft, now: DateTime<Local>) -> Self {
        Task {
            id: generate_id(now),
            title: draft.title,
            description: draft.description,
            deadline_date: draft.deadline_date,
            deadline_time: draft.deadline_time,
            priority: draft.priority,
            completed: false,
            created_at: now.with_timezone(&Utc),
            completed_at: None,
            notified_24h: false,
            notified_overdue: false,
            snoozed_until: None,
        }
    }

    /// Combined deadline in local wall time.
    pub fn deadline(&self) -> NaiveDateTime {
        self.deadline_date.and_time(self.deadline_time)
    }

    /// Time left until the deadline; negative once it has passed.
    pub fn time_left(&self, now: DateTime<Local>) -> Duration {
        self.deadline() - now.naive_local()
    }

    pub fn is_overdue(&self, now: DateTime<Local>) -> bool {
        self.deadline() < now.naive_local()
    }

    /// Whether deadline-check notifications are currently muted for this task.
    pub fn is_snoozed(&self, now: DateTime<Local>) -> bool {
        self.snoozed_until
            .is_some_and(|until| now.with_timezone(&Utc) < until)
    }

    /// Deadline information line shown in lists ("Due in 2 days", "Overdue by 3 hours").
    pub fn time_info(&self, now: DateTime<Local>) -> String {
        if self.completed {
            return match self.completed_at {
                Some(at) => format!(
                    "Completed on {}",
                    at.with_timezone(&Local).date_naive().format("%Y-%m-%d")
                ),
                None => "Completed".into(),
            };
        }

        let left = self.time_left(now);
        if left < Duration::zero() {
            match format_time_diff(-left) {
                Some(diff) => format!("Overdue by {diff}"),
                None => "Overdue by less than an hour".into(),
            }
        } else {
            match format_time_diff(left) {
                Some(diff) => format!("Due in {diff}"),
                None => "Due soon".into(),
            }
        }
    }

    /// Mark the task done or pending, keeping `completed_at` in step.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Local>) {
        self.completed = completed;
        self.completed_at = completed.then(|| now.with_timezone(&Utc));
    }

    /// Make `completed_at` agree with `completed`. A completion time missing
    /// from a done task falls back to its creation time. Returns whether
    /// anything changed.
    pub fn normalize_completion(&mut self) -> bool {
        match (self.completed, self.completed_at) {
            (true, None) => self.completed_at = Some(self.created_at),
            (false, Some(_)) => self.completed_at = None,
            _ => return false,
        }
        true
    }

    /// Forget which deadline notifications were sent.
    pub fn reset_notifications(&mut self) {
        self.notified_24h = false;
        self.notified_overdue = false;
        self.snoozed_until = None;
    }

    /// Check the stored fields against the creation invariants.
    ///
    /// The future-deadline rule is not applied here since stored tasks are
    /// allowed to become overdue.
    pub fn check_fields(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(TodoError::EmptyTitle);
        }
        let len = self.description.chars().count();
        if len > MAX_DESCRIPTION_CHARS {
            return Err(TodoError::DescriptionTooLong {
                len,
                max: MAX_DESCRIPTION_CHARS,
            });
        }
        Ok(())
    }
}

/// Raw user input for a new or edited task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub deadline_date: Option<NaiveDate>,
    pub deadline_time: Option<NaiveTime>,
    pub priority: Priority,
}

/// A draft that passed validation.
#[derive(Debug, Clone)]
pub struct ValidDraft {
    pub title: String,
    pub description: String,
    pub deadline_date: NaiveDate,
    pub deadline_time: NaiveTime,
    pub priority: Priority,
}

impl TaskDraft {
    /// Populate a draft from an existing task, for editing.
    pub fn from_task(task: &Task) -> Self {
        TaskDraft {
            title: task.title.clone(),
            description: task.description.clone(),
            deadline_date: Some(task.deadline_date),
            deadline_time: Some(task.deadline_time),
            priority: task.priority,
        }
    }

    /// Trim inputs and enforce: non-empty title, complete deadline strictly in
    /// the future, description within the character limit.
    pub fn validate(self, now: DateTime<Local>) -> Result<ValidDraft> {
        self.check(Some(now))
    }

    /// Same as [`TaskDraft::validate`] without the future-deadline rule, for
    /// edits that leave an existing deadline untouched.
    pub fn validate_keeping_deadline(self) -> Result<ValidDraft> {
        self.check(None)
    }

    fn check(self, now: Option<DateTime<Local>>) -> Result<ValidDraft> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(TodoError::EmptyTitle);
        }

        let description = self.description.trim().to_string();
        let len = description.chars().count();
        if len > MAX_DESCRIPTION_CHARS {
            return Err(TodoError::DescriptionTooLong {
                len,
                max: MAX_DESCRIPTION_CHARS,
            });
        }

        let (Some(deadline_date), Some(deadline_time)) = (self.deadline_date, self.deadline_time)
        else {
            return Err(TodoError::MissingDeadline);
        };
        let deadline_time = truncate_to_minute(deadline_time);
        let deadline = deadline_date.and_time(deadline_time);
        if now.is_some_and(|now| deadline <= now.naive_local()) {
            return Err(TodoError::DeadlineInPast(
                deadline.format("%Y-%m-%d %H:%M").to_string(),
            ));
        }

        Ok(ValidDraft {
            title,
            description,
            deadline_date,
            deadline_time,
            priority: self.priority,
        })
    }
}

/// Format a positive duration as whole days or hours.
///
/// Returns `None` below one hour so callers can say "soon".
pub fn format_time_diff(diff: Duration) -> Option<String> {
    let days = diff.num_days();
    let hours = diff.num_hours() % 24;
    if days > 0 {
        Some(format!("{} day{}", days, if days > 1 { "s" } else { "" }))
    } else if hours > 0 {
        Some(format!("{} hour{}", hours, if hours > 1 { "s" } else { "" }))
    } else {
        None
    }
}

/// Generate a short unique id: base36 milliseconds followed by a random base36 tail.
pub fn generate_id(now: DateTime<Local>) -> String {
    let millis = now.timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let tail: String = (0..8)
        .map(|_| std::char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
        .collect();
    format!("{}{}", to_base36(millis), tail)
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(std::char::from_digit((n % 36) as u32, 36).unwrap_or('0'));
        n /= 36;
    }
    digits.iter().rev().collect()
}

/// `HH:MM` serde format for deadline times; `HH:MM:SS` is accepted on read
/// and cut to the minute.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map(super::truncate_to_minute)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn at(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap();
        Local.from_local_datetime(&naive).single().unwrap()
    }

    pub(crate) fn draft(title: &str, date: (i32, u32, u32), time: (u32, u32)) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            description: String::new(),
            deadline_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
            deadline_time: NaiveTime::from_hms_opt(time.0, time.1, 0),
            priority: Priority::Medium,
        }
    }

    #[test]
    fn test_validate_trims_and_accepts_future_deadline() {
        let now = at(2026, 3, 1, 12, 0);
        let mut d = draft("  Write report  ", (2026, 3, 2), (9, 0));
        d.description = "  quarterly numbers ".into();
        let valid = d.validate(now).unwrap();
        assert_eq!(valid.title, "Write report");
        assert_eq!(valid.description, "quarterly numbers");
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let now = at(2026, 3, 1, 12, 0);
        assert!(matches!(
            draft("   ", (2026, 3, 2), (9, 0)).validate(now),
            Err(TodoError::EmptyTitle)
        ));

        let mut no_time = draft("x", (2026, 3, 2), (9, 0));
        no_time.deadline_time = None;
        assert!(matches!(no_time.validate(now), Err(TodoError::MissingDeadline)));

        assert!(matches!(
            draft("x", (2026, 3, 1), (12, 0)).validate(now),
            Err(TodoError::DeadlineInPast(_))
        ));

        let mut long = draft("x", (2026, 3, 2), (9, 0));
        long.description = "a".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert!(matches!(
            long.validate(now),
            Err(TodoError::DescriptionTooLong { .. })
        ));
    }

    #[test]
    fn test_format_time_diff() {
        assert_eq!(format_time_diff(Duration::days(1)).as_deref(), Some("1 day"));
        assert_eq!(
            format_time_diff(Duration::days(3) + Duration::hours(5)).as_deref(),
            Some("3 days")
        );
        assert_eq!(format_time_diff(Duration::hours(1)).as_deref(), Some("1 hour"));
        assert_eq!(format_time_diff(Duration::hours(23)).as_deref(), Some("23 hours"));
        assert_eq!(format_time_diff(Duration::minutes(59)), None);
    }

    #[test]
    fn test_time_info_states() {
        let created = at(2026, 3, 1, 8, 0);
        let task = Task::from_draft(
            draft("Ship", (2026, 3, 3), (12, 0)).validate(created).unwrap(),
            created,
        );

        assert_eq!(task.time_info(at(2026, 3, 1, 12, 0)), "Due in 2 days");
        assert_eq!(task.time_info(at(2026, 3, 3, 11, 30)), "Due soon");
        assert_eq!(task.time_info(at(2026, 3, 3, 15, 0)), "Overdue by 3 hours");
        assert!(task.is_overdue(at(2026, 3, 3, 12, 1)));

        let mut done = task.clone();
        done.set_completed(true, at(2026, 3, 2, 10, 0));
        assert_eq!(done.time_info(at(2026, 3, 5, 0, 0)), "Completed on 2026-03-02");
        done.set_completed(false, at(2026, 3, 2, 11, 0));
        assert!(done.completed_at.is_none());
    }

    #[test]
    fn test_deserialises_web_store_record() {
        let raw = r#"{
            "id": "lx2k9abc",
            "title": "Buy milk",
            "description": "",
            "deadlineDate": "2026-05-01",
            "deadlineTime": "18:30",
            "priority": "High",
            "completed": false,
            "createdAt": "2026-04-30T10:00:00.000Z",
            "completedAt": null
        }"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.deadline_time, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert!(!task.notified_24h);

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["deadlineTime"], "18:30");
        assert_eq!(json["notified24h"], false);
    }

    #[test]
    fn test_normalize_completion() {
        let now = at(2026, 3, 1, 9, 0);
        let mut task = Task::from_draft(draft("Gym", (2026, 3, 3), (7, 30)).validate(now).unwrap(), now);
        assert!(!task.normalize_completion());

        task.completed = true;
        assert!(task.normalize_completion());
        assert_eq!(task.completed_at, Some(task.created_at));

        task.completed = false;
        assert!(task.normalize_completion());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_deadline_seconds_do_not_survive_save() {
        let now = at(2026, 3, 1, 17, 45);
        let mut d = draft("Tight", (2026, 3, 1), (17, 45));
        d.deadline_time = NaiveTime::from_hms_opt(17, 45, 10);
        assert!(matches!(d.clone().validate(now), Err(TodoError::DeadlineInPast(_))));

        d.deadline_time = NaiveTime::from_hms_opt(17, 46, 30);
        let task = Task::from_draft(d.validate(now).unwrap(), now);
        assert_eq!(task.deadline_time, NaiveTime::from_hms_opt(17, 46, 0).unwrap());

        let reloaded: Task = serde_json::from_value(serde_json::to_value(&task).unwrap()).unwrap();
        assert_eq!(reloaded.deadline(), task.deadline());

        let mut raw = serde_json::to_value(&task).unwrap();
        raw["deadlineTime"] = "08:15:59".into();
        let legacy: Task = serde_json::from_value(raw).unwrap();
        assert_eq!(legacy.deadline_time, NaiveTime::from_hms_opt(8, 15, 0).unwrap());
    }

    #[test]
    fn test_generate_id_is_base36_and_unique() {
        let now = at(2026, 3, 1, 12, 0);
        let a = generate_id(now);
        let b = generate_id(now);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
