//! Enumerations for TUI state management.

/// Application state for the terminal user interface.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    TaskList,
    AddTask,
    EditTask,
    Help,
    Confirm,
}

/// Input mode for text entry fields.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum InputMode {
    None,
    /// Typing into the search box.
    Search,
    /// Typing into a form field.
    Form,
}

/// Destructive action waiting for a yes/no answer.
#[derive(Clone, PartialEq, Debug)]
pub enum ConfirmAction {
    DeleteTask { id: String, title: String },
    ClearCompleted { count: usize },
}

impl ConfirmAction {
    /// Text shown in the confirmation dialog.
    pub fn prompt(&self) -> String {
        match self {
            ConfirmAction::DeleteTask { title, .. } => format!("Delete \"{}\"?", title),
            ConfirmAction::ClearCompleted { count } => {
                format!("Clear {} completed task{}?", count, if *count == 1 { "" } else { "s" })
            }
        }
    }
}

/// Colour and prefix of a transient message.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ToastKind {
    Info,
    Success,
    Error,
    Reminder,
}
