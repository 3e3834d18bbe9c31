//! Error types for the to-do store and its front ends.

/// Top-level error type for task management.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    /// Title was empty after trimming.
    #[error("Task title is required")]
    EmptyTitle,

    /// Deadline date or time was not supplied.
    #[error("Please set a deadline date and time")]
    MissingDeadline,

    /// Deadline is now or already behind us.
    #[error("Deadline must be in the future (got {0})")]
    DeadlineInPast(String),

    /// Description exceeds the character limit.
    #[error("Description is {len} characters, the limit is {max}")]
    DescriptionTooLong { len: usize, max: usize },

    /// No task matched the identifier.
    #[error("No task found matching '{0}'")]
    TaskNotFound(String),

    /// More than one task matched the identifier.
    #[error("Multiple tasks match '{identifier}':\n{candidates}Please use the task ID instead.")]
    AmbiguousTask {
        identifier: String,
        candidates: String,
    },

    /// Unrecognised deadline date input.
    #[error("Unrecognised date '{0}'. Use YYYY-MM-DD, 'today', 'tomorrow', a weekday, or 'in Nd'")]
    InvalidDate(String),

    /// Unrecognised deadline time input.
    #[error("Unrecognised time '{0}'. Use HH:MM (24h), 'noon' or 'midnight'")]
    InvalidTime(String),

    /// Snooze length outside the representable range.
    #[error("Cannot snooze for {0} minutes")]
    InvalidSnooze(i64),

    /// Import file did not contain a task list.
    #[error("import error: {0}")]
    Import(String),

    /// Configuration file could not be parsed or written.
    #[error("config error: {0}")]
    Config(String),

    /// Terminal UI failure.
    #[error("UI error: {0}")]
    Ui(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialisation error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TodoError>;
