//! Enumerations and field types for task management.
//!
//! This module defines the structured values used to categorise, filter and
//! order tasks, plus the theme modes understood by the `theme` command.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task importance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Priority {
    #[serde(alias = "low")]
    Low,
    #[default]
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

impl Priority {
    /// Ordering weight, higher is more important.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    /// Cycle Low -> Medium -> High -> Low.
    pub fn next(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }

    /// Cycle in the opposite direction of [`Priority::next`].
    pub fn prev(self) -> Self {
        match self {
            Priority::Low => Priority::High,
            Priority::Medium => Priority::Low,
            Priority::High => Priority::Medium,
        }
    }
}

/// Which tasks a list view shows by completion state.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    /// Next tab in All -> Pending -> Completed order.
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum SortKey {
    /// Store order, newest first.
    #[default]
    None,
    Deadline,
    Priority,
}

impl SortKey {
    /// Selecting the active sort again switches sorting off.
    pub fn toggled(self, requested: SortKey) -> SortKey {
        if self == requested {
            SortKey::None
        } else {
            requested
        }
    }
}

/// Argument for the `theme` command.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
    Toggle,
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
    }
}

/// Format a status filter for display.
pub fn format_filter(f: StatusFilter) -> &'static str {
    match f {
        StatusFilter::All => "All",
        StatusFilter::Pending => "Pending",
        StatusFilter::Completed => "Completed",
    }
}

/// Format a sort key for display.
pub fn format_sort(s: SortKey) -> &'static str {
    match s {
        SortKey::None => "Default",
        SortKey::Deadline => "Deadline",
        SortKey::Priority => "Priority",
    }
}

/// Heading and hint shown when a list view has no rows.
pub fn empty_state(filter: StatusFilter, searching: bool) -> (&'static str, &'static str) {
    if searching {
        return ("No matching tasks", "Try a different search term.");
    }
    match filter {
        StatusFilter::Completed => ("No completed tasks", "Complete some tasks to see them here!"),
        StatusFilter::Pending => ("All tasks completed!", "Great job! All your tasks are done."),
        StatusFilter::All => ("No tasks yet", "Create your first task to get started!"),
    }
}
