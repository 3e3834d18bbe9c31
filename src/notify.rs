//! Notification records and delivery.

use std::io::Write;

use crate::error::Result;

/// Why a notification was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NotificationKind {
    /// Fires a fixed lead time before the deadline.
    Lead,
    /// Fires at the deadline.
    AtDeadline,
    /// Deadline check: deadline falls inside the due-soon window.
    DueSoon,
    /// Deadline check: deadline has passed.
    Overdue,
}

impl NotificationKind {
    /// Suffix used in notification tags.
    pub fn tag_suffix(self) -> &'static str {
        match self {
            NotificationKind::Lead => "lead",
            NotificationKind::AtDeadline => "deadline",
            NotificationKind::DueSoon => "24h",
            NotificationKind::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub task_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// `task-<id>-<kind>`, unique per task and kind.
    pub tag: String,
    /// Should stay visible until dismissed.
    pub require_interaction: bool,
}

impl Notification {
    pub fn new(task_id: &str, kind: NotificationKind, title: &str, body: String) -> Self {
        Notification {
            task_id: task_id.to_string(),
            kind,
            title: title.to_string(),
            body,
            tag: format!("task-{}-{}", task_id, kind.tag_suffix()),
            require_interaction: kind == NotificationKind::Overdue,
        }
    }
}

/// Sink for notifications.
pub trait Notifier {
    fn notify(&mut self, notification: &Notification) -> Result<()>;
}

/// Collects notifications in memory.
impl Notifier for Vec<Notification> {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        self.push(notification.clone());
        Ok(())
    }
}

/// Prints notifications as `[title] body` lines, optionally ringing the bell.
pub struct TerminalNotifier<W: Write> {
    out: W,
    bell: bool,
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W, bell: bool) -> Self {
        Self { out, bell }
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        if self.bell {
            write!(self.out, "\x07")?;
        }
        writeln!(self.out, "[{}] {}", notification.title, notification.body)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_and_interaction() {
        let n = Notification::new("abc", NotificationKind::Overdue, "Overdue Task", "late".into());
        assert_eq!(n.tag, "task-abc-overdue");
        assert!(n.require_interaction);
        let n = Notification::new("abc", NotificationKind::DueSoon, "Task Due Soon", "soon".into());
        assert_eq!(n.tag, "task-abc-24h");
        assert!(!n.require_interaction);
    }

    #[test]
    fn test_terminal_notifier_output() {
        let n = Notification::new("abc", NotificationKind::AtDeadline, "Task Deadline", "\"x\" is due now!".into());

        let mut quiet = TerminalNotifier::new(Vec::new(), false);
        quiet.notify(&n).unwrap();
        assert_eq!(String::from_utf8(quiet.out).unwrap(), "[Task Deadline] \"x\" is due now!\n");

        let mut loud = TerminalNotifier::new(Vec::new(), true);
        loud.notify(&n).unwrap();
        assert!(loud.out.starts_with(b"\x07["));
    }
}
