//! Reminder scheduling and deadline checks.
//!
//! Two independent sources of notifications:
//!
//! - **Timed reminders**: each pending task gets a reminder a lead time before
//!   its deadline and one at the deadline. They sit in a [`ReminderQueue`]
//!   ordered by fire time and are re-validated against the store when they fire.
//! - **Deadline check**: a periodic scan raising one "due soon" and one
//!   "overdue" notification per task, remembered through flags on the task
//!   so they survive restarts.
//!
//! The [`Watcher`] drives both from the persisted store file, re-reading it on
//! every tick so it never needs to share state with the front ends.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::config::Config;
use crate::db::Database;
use crate::error::{Result, TodoError};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::task::{format_time_diff, Task};

/// A notification planned for a fixed point in time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Reminder {
    pub fire_at: NaiveDateTime,
    pub task_id: String,
    pub kind: NotificationKind,
    /// Deadline the reminder was planned against.
    pub deadline: NaiveDateTime,
}

impl Reminder {
    /// Build the notification for this reminder if it still applies.
    ///
    /// Returns `None` when the task was deleted, completed or re-scheduled
    /// after the reminder was planned.
    pub fn notification(&self, db: &Database, lead: Duration) -> Option<Notification> {
        let task = db.get(&self.task_id)?;
        if task.completed || task.deadline() != self.deadline {
            return None;
        }
        let n = match self.kind {
            NotificationKind::Lead => Notification::new(
                &task.id,
                self.kind,
                "Task Reminder",
                format!("\"{}\" is due in {}!", task.title, format_lead(lead)),
            ),
            _ => Notification::new(
                &task.id,
                NotificationKind::AtDeadline,
                "Task Deadline",
                format!("\"{}\" is due now!", task.title),
            ),
        };
        Some(n)
    }
}

fn format_lead(lead: Duration) -> String {
    format_time_diff(lead).unwrap_or_else(|| {
        let minutes = lead.num_minutes();
        format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    })
}

/// Plan the timed reminders for one task. Only future fire times are kept.
pub fn plan_reminders(task: &Task, now: DateTime<Local>, lead: Duration) -> Vec<Reminder> {
    if task.completed {
        return Vec::new();
    }
    let now = now.naive_local();
    let deadline = task.deadline();
    let mut planned = Vec::new();
    let lead_at = deadline - lead;
    if lead > Duration::zero() && lead_at > now {
        planned.push(Reminder {
            fire_at: lead_at,
            task_id: task.id.clone(),
            kind: NotificationKind::Lead,
            deadline,
        });
    }
    if deadline > now {
        planned.push(Reminder {
            fire_at: deadline,
            task_id: task.id.clone(),
            kind: NotificationKind::AtDeadline,
            deadline,
        });
    }
    planned
}

/// Pending reminders ordered by fire time.
#[derive(Debug, Default)]
pub struct ReminderQueue {
    heap: BinaryHeap<Reverse<Reminder>>,
    /// Task id -> deadline its reminders were planned for.
    scheduled: HashMap<String, NaiveDateTime>,
}

impl ReminderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan and enqueue the reminders of one task, replacing earlier ones.
    pub fn schedule(&mut self, task: &Task, now: DateTime<Local>, lead: Duration) {
        self.cancel(&task.id);
        for reminder in plan_reminders(task, now, lead) {
            debug!(task = %task.id, kind = ?reminder.kind, fire_at = %reminder.fire_at, "reminder scheduled");
            self.heap.push(Reverse(reminder));
        }
        self.scheduled.insert(task.id.clone(), task.deadline());
    }

    /// Drop every reminder of a task.
    pub fn cancel(&mut self, task_id: &str) {
        if self.scheduled.remove(task_id).is_some() {
            self.heap.retain(|Reverse(r)| r.task_id != task_id);
        }
    }

    /// Bring the queue in line with the store: new or re-deadlined pending
    /// tasks are (re)scheduled, deleted and completed ones are cancelled.
    pub fn sync(&mut self, db: &Database, now: DateTime<Local>, lead: Duration) {
        let live: HashMap<&str, &Task> = db
            .tasks
            .iter()
            .filter(|t| !t.completed)
            .map(|t| (t.id.as_str(), t))
            .collect();

        let stale: Vec<String> = self
            .scheduled
            .iter()
            .filter(|(id, deadline)| {
                live.get(id.as_str())
                    .map_or(true, |t| t.deadline() != **deadline)
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            self.cancel(&id);
        }

        for task in live.values() {
            if !self.scheduled.contains_key(&task.id) {
                self.schedule(task, now, lead);
            }
        }
    }

    /// Remove and return every reminder whose fire time has been reached.
    pub fn pop_due(&mut self, now: DateTime<Local>) -> Vec<Reminder> {
        let now = now.naive_local();
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|Reverse(r)| r.fire_at <= now) {
            if let Some(Reverse(r)) = self.heap.pop() {
                due.push(r);
            }
        }
        due
    }

    pub fn next_fire_at(&self) -> Option<NaiveDateTime> {
        self.heap.peek().map(|Reverse(r)| r.fire_at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Scan pending tasks for due-soon and overdue deadlines.
///
/// Each notification is raised at most once per task: the matching flag is
/// set on the task, so the caller must save the store when the result is
/// non-empty. Snoozed tasks are skipped.
pub fn check_deadlines(db: &mut Database, now: DateTime<Local>, window: Duration) -> Vec<Notification> {
    let mut out = Vec::new();
    let today = now.date_naive();
    for task in db.tasks.iter_mut() {
        if task.completed || task.is_snoozed(now) {
            continue;
        }
        let left = task.time_left(now);

        if left > Duration::zero() && left <= window && !task.notified_24h {
            let time = task.deadline_time.format("%H:%M");
            let when = if task.deadline_date == today {
                format!("today at {}", time)
            } else if task.deadline_date == today + Duration::days(1) {
                format!("tomorrow at {}", time)
            } else {
                format!("on {} at {}", task.deadline_date.format("%Y-%m-%d"), time)
            };
            out.push(Notification::new(
                &task.id,
                NotificationKind::DueSoon,
                "Task Due Soon",
                format!("\"{}\" is due {}", task.title, when),
            ));
            task.notified_24h = true;
        }

        if left < Duration::zero() && !task.notified_overdue {
            let days = overdue_days(-left);
            out.push(Notification::new(
                &task.id,
                NotificationKind::Overdue,
                "Overdue Task",
                format!(
                    "\"{}\" is {} day{} overdue",
                    task.title,
                    days,
                    if days == 1 { "" } else { "s" }
                ),
            ));
            task.notified_overdue = true;
        }
    }
    if !out.is_empty() {
        info!(count = out.len(), "deadline check raised notifications");
    }
    out
}

/// Whole days overdue, rounded up so any lateness counts as at least one day.
fn overdue_days(late: Duration) -> i64 {
    const DAY_MS: i64 = 86_400_000;
    let ms = late.num_milliseconds().max(1);
    ms / DAY_MS + i64::from(ms % DAY_MS != 0)
}

/// Mute deadline-check notifications for `minutes` and re-arm them afterwards.
///
/// Returns the end of the snooze.
pub fn snooze(task: &mut Task, now: DateTime<Local>, minutes: i64) -> Result<DateTime<Utc>> {
    let until = Duration::try_minutes(minutes)
        .and_then(|d| now.with_timezone(&Utc).checked_add_signed(d))
        .ok_or(TodoError::InvalidSnooze(minutes))?;
    task.snoozed_until = Some(until);
    task.notified_24h = false;
    task.notified_overdue = false;
    info!(id = %task.id, until = %until, "task snoozed");
    Ok(until)
}

/// Fire due reminders and run the deadline check against `db`.
///
/// Returns the notifications in delivery order and whether task flags
/// changed (the store needs saving).
pub fn collect_due(
    queue: &mut ReminderQueue,
    db: &mut Database,
    now: DateTime<Local>,
    lead: Duration,
    window: Duration,
) -> (Vec<Notification>, bool) {
    let store: &Database = db;
    queue.sync(store, now, lead);
    let mut out: Vec<Notification> = queue
        .pop_due(now)
        .iter()
        .filter_map(|r| r.notification(store, lead))
        .collect();
    let checked = check_deadlines(db, now, window);
    let flags_changed = !checked.is_empty();
    out.extend(checked);
    (out, flags_changed)
}

/// Background loop that re-reads the store file and delivers notifications.
pub struct Watcher<N: Notifier> {
    db_path: PathBuf,
    lead: Duration,
    window: Duration,
    queue: ReminderQueue,
    notifier: N,
}

impl<N: Notifier> Watcher<N> {
    pub fn new(db_path: &Path, config: &Config, notifier: N) -> Self {
        Watcher {
            db_path: db_path.to_path_buf(),
            lead: config.reminder_lead(),
            window: config.due_soon_window(),
            queue: ReminderQueue::new(),
            notifier,
        }
    }

    /// Run one check. Returns the number of notifications delivered.
    pub fn tick(&mut self, now: DateTime<Local>) -> Result<usize> {
        let mut db = Database::load(&self.db_path);
        let (notifications, flags_changed) =
            collect_due(&mut self.queue, &mut db, now, self.lead, self.window);
        if flags_changed {
            db.save(&self.db_path)?;
        }
        for n in &notifications {
            info!(tag = %n.tag, "delivering notification");
            self.notifier.notify(n)?;
        }
        debug!(
            sent = notifications.len(),
            queued = self.queue.len(),
            next = ?self.queue.next_fire_at(),
            "watch tick"
        );
        Ok(notifications.len())
    }

    /// Tick until `ticks` checks have run (forever if `None`), sleeping `interval` between them.
    pub fn run(&mut self, ticks: Option<usize>, interval: std::time::Duration) -> Result<()> {
        let mut count = 0usize;
        loop {
            self.tick(Local::now())?;
            count += 1;
            if ticks.is_some_and(|n| count >= n) {
                return Ok(());
            }
            std::thread::sleep(interval);
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::{at, draft};

    fn store_with(titles: &[(&str, (i32, u32, u32), (u32, u32))]) -> (Database, DateTime<Local>) {
        let now = at(2026, 3, 1, 12, 0);
        let mut db = Database::default();
        for (title, date, time) in titles {
            db.add(draft(title, *date, *time), now).unwrap();
        }
        (db, now)
    }

    #[test]
    fn test_plan_reminders_only_future_times() {
        let (db, now) = store_with(&[("Ship", (2026, 3, 1), (12, 30))]);
        let task = &db.tasks[0];

        let planned = plan_reminders(task, now, Duration::hours(1));
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].kind, NotificationKind::AtDeadline);

        let planned = plan_reminders(task, at(2026, 3, 1, 11, 0), Duration::hours(1));
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].kind, NotificationKind::Lead);
        assert_eq!(planned[0].fire_at, at(2026, 3, 1, 11, 30).naive_local());

        let mut done = task.clone();
        done.set_completed(true, now);
        assert!(plan_reminders(&done, now, Duration::hours(1)).is_empty());
    }

    #[test]
    fn test_queue_pops_in_fire_order() {
        let (db, now) = store_with(&[
            ("Later", (2026, 3, 2), (9, 0)),
            ("Sooner", (2026, 3, 1), (18, 0)),
        ]);
        let mut queue = ReminderQueue::new();
        queue.sync(&db, now, Duration::hours(1));
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.next_fire_at(), Some(at(2026, 3, 1, 17, 0).naive_local()));

        assert!(queue.pop_due(at(2026, 3, 1, 16, 59)).is_empty());
        let due = queue.pop_due(at(2026, 3, 1, 18, 0));
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].kind, NotificationKind::Lead);
        assert_eq!(due[1].kind, NotificationKind::AtDeadline);

        let n = due[0].notification(&db, Duration::hours(1)).unwrap();
        assert_eq!(n.title, "Task Reminder");
        assert_eq!(n.body, "\"Sooner\" is due in 1 hour!");
        assert_eq!(due[1].notification(&db, Duration::hours(1)).unwrap().body, "\"Sooner\" is due now!");
    }

    #[test]
    fn test_sync_cancels_completed_and_reschedules_moved_deadline() {
        let (mut db, now) = store_with(&[
            ("A", (2026, 3, 2), (9, 0)),
            ("B", (2026, 3, 3), (9, 0)),
        ]);
        let lead = Duration::hours(1);
        let mut queue = ReminderQueue::new();
        queue.sync(&db, now, lead);
        assert_eq!(queue.len(), 4);

        let a = db.resolve("A").unwrap();
        db.toggle_complete(&a, now).unwrap();
        queue.sync(&db, now, lead);
        assert_eq!(queue.len(), 2);

        let b = db.resolve("B").unwrap();
        db.get_mut(&b).unwrap().deadline_date = chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        queue.sync(&db, now, lead);
        // Moved into the past: nothing left to fire.
        assert_eq!(queue.len(), 0);

        db.remove(&b).unwrap();
        queue.sync(&db, now, lead);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fired_reminder_skips_completed_task() {
        let (mut db, now) = store_with(&[("A", (2026, 3, 1), (13, 0))]);
        let mut queue = ReminderQueue::new();
        queue.sync(&db, now, Duration::minutes(30));
        let id = db.tasks[0].id.clone();
        db.toggle_complete(&id, now).unwrap();

        let due = queue.pop_due(at(2026, 3, 1, 12, 30));
        assert_eq!(due.len(), 1);
        assert!(due[0].notification(&db, Duration::minutes(30)).is_none());
    }

    #[test]
    fn test_check_deadlines_notifies_once() {
        let (mut db, now) = store_with(&[
            ("Soon", (2026, 3, 2), (9, 0)),
            ("Far", (2026, 3, 9), (9, 0)),
        ]);
        let window = Duration::hours(24);

        let first = check_deadlines(&mut db, now, window);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, NotificationKind::DueSoon);
        assert_eq!(first[0].body, "\"Soon\" is due tomorrow at 09:00");
        assert!(check_deadlines(&mut db, now, window).is_empty());

        let late = at(2026, 3, 4, 10, 0);
        let overdue = check_deadlines(&mut db, late, window);
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].body, "\"Soon\" is 3 days overdue");
        assert!(overdue[0].require_interaction);
        assert!(check_deadlines(&mut db, late, window).is_empty());
    }

    #[test]
    fn test_snooze_mutes_then_rearms() {
        let (mut db, now) = store_with(&[("Soon", (2026, 3, 1), (20, 0))]);
        let window = Duration::hours(24);
        assert_eq!(check_deadlines(&mut db, now, window).len(), 1);

        snooze(&mut db.tasks[0], now, 60).unwrap();
        assert!(check_deadlines(&mut db, at(2026, 3, 1, 12, 30), window).is_empty());
        let again = check_deadlines(&mut db, at(2026, 3, 1, 13, 1), window);
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].body, "\"Soon\" is due today at 20:00");
    }

    #[test]
    fn test_overdue_by_a_fraction_of_a_second_is_one_day() {
        let (mut db, now) = store_with(&[("Soon", (2026, 3, 1), (12, 30))]);
        let just_late = db.tasks[0].deadline().and_local_timezone(Local).unwrap()
            + Duration::milliseconds(500);
        assert!(now < just_late);
        let raised = check_deadlines(&mut db, just_late, Duration::hours(24));
        let overdue: Vec<&Notification> = raised
            .iter()
            .filter(|n| n.kind == NotificationKind::Overdue)
            .collect();
        assert_eq!(overdue[0].body, "\"Soon\" is 1 day overdue");

        assert_eq!(overdue_days(Duration::days(1)), 1);
        assert_eq!(overdue_days(Duration::days(1) + Duration::seconds(1)), 2);
    }

    #[test]
    fn test_snooze_rejects_out_of_range_lengths() {
        let (mut db, now) = store_with(&[("Soon", (2026, 3, 1), (20, 0))]);
        db.tasks[0].notified_24h = true;
        assert!(matches!(
            snooze(&mut db.tasks[0], now, i64::MAX),
            Err(TodoError::InvalidSnooze(i64::MAX))
        ));
        assert!(db.tasks[0].notified_24h);
        assert!(db.tasks[0].snoozed_until.is_none());
    }

    #[test]
    fn test_watcher_tick_persists_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let (db, now) = store_with(&[("Soon", (2026, 3, 1), (12, 45))]);
        db.save(&path).unwrap();

        let mut watcher = Watcher::new(&path, &Config::default(), Vec::new());
        assert_eq!(watcher.tick(now).unwrap(), 1);
        assert!(Database::load(&path).tasks[0].notified_24h);

        assert_eq!(watcher.tick(at(2026, 3, 1, 12, 45)).unwrap(), 1);
        let kinds: Vec<NotificationKind> = watcher.notifier().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NotificationKind::DueSoon, NotificationKind::AtDeadline]);
    }
}
