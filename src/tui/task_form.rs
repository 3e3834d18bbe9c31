//! Task form handling for the terminal user interface.
//!
//! This module provides the `TaskForm` structure used by both the add and
//! edit screens, its field ordering, and the conversion of the typed text
//! into a draft or patch for the store.

use chrono::{NaiveDate, NaiveTime};

use crate::{
    db::{parse_deadline_date, parse_deadline_time, TaskPatch},
    error::{Result, TodoError},
    fields::Priority,
    task::{Task, TaskDraft, MAX_DESCRIPTION_CHARS},
    tui::input::InputField,
};

/// Global order constants for form fields.
pub const TITLE_GLOBAL_ORDER: usize = 0;
pub const DESCRIPTION_GLOBAL_ORDER: usize = 1;
pub const DATE_GLOBAL_ORDER: usize = 2;
pub const TIME_GLOBAL_ORDER: usize = 3;
pub const PRIORITY_GLOBAL_ORDER: usize = 4;

const FIELD_COUNT: usize = 5;

/// Task form for adding or editing a task
pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub date: InputField,
    pub time: InputField,
    pub priority: Priority,
    pub current_field: usize,
    /// ID of the task being edited; `None` when adding.
    pub editing: Option<String>,
}

impl TaskForm {
    /// Empty form with the configured default priority and time.
    pub fn new(priority: Priority, default_time: Option<NaiveTime>) -> Self {
        let time = default_time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default();
        let mut form = Self {
            title: InputField::new(),
            description: InputField::new().limited(MAX_DESCRIPTION_CHARS),
            date: InputField::new(),
            time: InputField::with_value(&time),
            priority,
            current_field: TITLE_GLOBAL_ORDER,
            editing: None,
        };
        form.update_active_field();
        form
    }

    /// Form pre-filled from an existing task.
    pub fn from_task(task: &Task) -> Self {
        let mut form = Self {
            title: InputField::with_value(&task.title),
            description: InputField::with_value(&task.description).limited(MAX_DESCRIPTION_CHARS),
            date: InputField::with_value(&task.deadline_date.format("%Y-%m-%d").to_string()),
            time: InputField::with_value(&task.deadline_time.format("%H:%M").to_string()),
            priority: task.priority,
            current_field: TITLE_GLOBAL_ORDER,
            editing: Some(task.id.clone()),
        };
        form.update_active_field();
        form
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    /// `n/300` counter shown under the description.
    pub fn description_counter(&self) -> String {
        format!("{}/{}", self.description.char_count(), MAX_DESCRIPTION_CHARS)
    }

    fn current_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_GLOBAL_ORDER => Some(&mut self.title),
            DESCRIPTION_GLOBAL_ORDER => Some(&mut self.description),
            DATE_GLOBAL_ORDER => Some(&mut self.date),
            TIME_GLOBAL_ORDER => Some(&mut self.time),
            _ => None,
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// Update which field is currently active for editing.
    pub fn update_active_field(&mut self) {
        let current = self.current_field;
        for (i, field) in [&mut self.title, &mut self.description, &mut self.date, &mut self.time]
            .into_iter()
            .enumerate()
        {
            field.active = i == current;
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.current_input() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.current_input() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.current_input() {
            field.handle_delete();
        }
    }

    /// Move the cursor, or cycle the priority selector.
    pub fn handle_left_right(&mut self, right: bool) {
        if self.current_field == PRIORITY_GLOBAL_ORDER {
            self.priority = if right { self.priority.next() } else { self.priority.prev() };
            return;
        }
        if let Some(field) = self.current_input() {
            if right {
                field.move_cursor_right();
            } else {
                field.move_cursor_left();
            }
        }
    }

    pub fn handle_home_end(&mut self, end: bool) {
        if let Some(field) = self.current_input() {
            if end {
                field.move_end();
            } else {
                field.move_home();
            }
        }
    }

    fn parsed_deadline(&self, today: NaiveDate) -> Result<(Option<NaiveDate>, Option<NaiveTime>)> {
        let date = match self.date.value.trim() {
            "" => None,
            s => Some(parse_deadline_date(s, today)?),
        };
        let time = match self.time.value.trim() {
            "" => None,
            s => Some(parse_deadline_time(s)?),
        };
        Ok((date, time))
    }

    /// Draft for a new task. Validation happens in the store.
    pub fn to_draft(&self, today: NaiveDate) -> Result<TaskDraft> {
        let (deadline_date, deadline_time) = self.parsed_deadline(today)?;
        Ok(TaskDraft {
            title: self.title.value.clone(),
            description: self.description.value.clone(),
            deadline_date,
            deadline_time,
            priority: self.priority,
        })
    }

    /// Patch replacing every editable field of the task being edited.
    pub fn to_patch(&self, today: NaiveDate) -> Result<TaskPatch> {
        let (Some(date), Some(time)) = self.parsed_deadline(today)? else {
            return Err(TodoError::MissingDeadline);
        };
        Ok(TaskPatch {
            title: Some(self.title.value.clone()),
            description: Some(self.description.value.clone()),
            deadline_date: Some(date),
            deadline_time: Some(time),
            priority: Some(self.priority),
        })
    }
}
