//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state,
//! handles user input, renders the interface, and runs the reminder checks
//! that surface as toasts while the UI is open.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame, Terminal,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::db::{default_export_name, truncate, Database, TaskQuery};
use crate::error::{Result, TodoError};
use crate::fields::*;
use crate::reminder::{collect_due, snooze, ReminderQueue};
use crate::task::Task;
use crate::tui::{
    colors::{Palette, DARK_RED},
    enums::{AppState, ConfirmAction, InputMode, ToastKind},
    task_form::{
        TaskForm, DATE_GLOBAL_ORDER, DESCRIPTION_GLOBAL_ORDER, PRIORITY_GLOBAL_ORDER,
        TIME_GLOBAL_ORDER, TITLE_GLOBAL_ORDER,
    },
    utils::centered_rect,
};

/// How long a toast stays on screen.
const TOAST_DURATION: Duration = Duration::from_secs(5);
/// How often reminders and deadline checks run while the UI is open.
const REMINDER_CHECK_EVERY: Duration = Duration::from_secs(1);

/// A transient message shown in the corner of the screen.
#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
}

/// Modification time and size of the store file as last seen by the UI.
type StoreStamp = Option<(SystemTime, u64)>;

fn store_stamp(path: &Path) -> StoreStamp {
    let meta = fs::metadata(path).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

/// Main application state for the terminal user interface.
pub struct App {
    state: AppState,
    db: Database,
    db_path: PathBuf,
    /// Lets the UI notice writes made by the CLI or `watch`.
    store_stamp: StoreStamp,
    config: Config,
    config_path: PathBuf,
    palette: Palette,
    task_list_state: TableState,
    filtered_tasks: Vec<String>,
    task_form: TaskForm,
    input_mode: InputMode,
    filter: StatusFilter,
    sort: SortKey,
    search: String,
    confirm_action: Option<ConfirmAction>,
    toasts: VecDeque<Toast>,
    toast_since: Option<Instant>,
    reminders: ReminderQueue,
    last_check: Option<Instant>,
}

impl App {
    /// Create a new App instance, loading the store from the specified path.
    pub fn new(db_path: &Path, config_path: &Path, config: Config) -> Self {
        let db = Database::load(db_path);
        let store_stamp = store_stamp(db_path);
        let palette = Palette::for_mode(config.dark_mode);
        let task_form = TaskForm::new(config.default_priority, config.default_time().ok());
        let mut app = App {
            state: AppState::TaskList,
            db,
            db_path: db_path.to_path_buf(),
            store_stamp,
            config,
            config_path: config_path.to_path_buf(),
            palette,
            task_list_state: TableState::default(),
            filtered_tasks: Vec::new(),
            task_form,
            input_mode: InputMode::None,
            filter: StatusFilter::All,
            sort: SortKey::None,
            search: String::new(),
            confirm_action: None,
            toasts: VecDeque::new(),
            toast_since: None,
            reminders: ReminderQueue::new(),
            last_check: None,
        };
        app.update_filtered_tasks();
        app
    }

    /// Reload the store from disk, picking up changes made by the CLI.
    fn refresh_tasks(&mut self) {
        self.db = Database::load(&self.db_path);
        self.store_stamp = store_stamp(&self.db_path);
        self.update_filtered_tasks();
    }

    /// Reload the store if another process wrote it since the last load or save.
    ///
    /// Called before every change so the save that follows never overwrites
    /// tasks the UI has not seen.
    fn reload_if_changed(&mut self) {
        if store_stamp(&self.db_path) != self.store_stamp {
            debug!(path = %self.db_path.display(), "store changed on disk, reloading");
            self.refresh_tasks();
        }
    }

    /// Re-run search, filter and sort. Keeps the selected task selected when
    /// it is still visible.
    fn update_filtered_tasks(&mut self) {
        let old_selected_id = self.selected_id().map(str::to_string);

        let query = TaskQuery {
            search: self.search.clone(),
            filter: self.filter,
            sort: self.sort,
            limit: None,
        };
        self.filtered_tasks = self.db.query(&query).into_iter().map(|t| t.id.clone()).collect();

        let restored = old_selected_id
            .and_then(|old| self.filtered_tasks.iter().position(|id| *id == old));
        let selection = match restored {
            Some(idx) => Some(idx),
            None if self.filtered_tasks.is_empty() => None,
            None => Some(
                self.task_list_state
                    .selected()
                    .unwrap_or(0)
                    .min(self.filtered_tasks.len() - 1),
            ),
        };
        self.task_list_state.select(selection);
    }

    fn select_id(&mut self, id: &str) {
        if let Some(idx) = self.filtered_tasks.iter().position(|t| t == id) {
            self.task_list_state.select(Some(idx));
        }
    }

    /// Save the store to disk and refresh the visible rows.
    fn save_db(&mut self) -> Result<()> {
        self.write_store()?;
        self.update_filtered_tasks();
        Ok(())
    }

    fn write_store(&mut self) -> Result<()> {
        self.db.save(&self.db_path)?;
        self.store_stamp = store_stamp(&self.db_path);
        Ok(())
    }

    fn selected_id(&self) -> Option<&str> {
        self.task_list_state
            .selected()
            .and_then(|idx| self.filtered_tasks.get(idx))
            .map(String::as_str)
    }

    fn get_selected_task(&self) -> Option<&Task> {
        self.selected_id().and_then(|id| self.db.get(id))
    }

    /// Queue a toast. The first queued toast starts its timer immediately.
    fn push_toast(&mut self, kind: ToastKind, text: impl Into<String>) {
        if self.toasts.is_empty() {
            self.toast_since = Some(Instant::now());
        }
        self.toasts.push_back(Toast { kind, text: text.into() });
    }

    /// Drop the visible toast once it has been shown long enough.
    fn expire_toasts(&mut self, now: Instant) {
        let Some(since) = self.toast_since else {
            return;
        };
        if now.saturating_duration_since(since) >= TOAST_DURATION {
            self.toasts.pop_front();
            self.toast_since = if self.toasts.is_empty() { None } else { Some(now) };
        }
    }

    /// Fire due reminders and run the deadline check against the open store.
    fn check_reminders(&mut self, now: DateTime<Local>) {
        self.reload_if_changed();
        let (notifications, flags_changed) = collect_due(
            &mut self.reminders,
            &mut self.db,
            now,
            self.config.reminder_lead(),
            self.config.due_soon_window(),
        );
        if flags_changed {
            if let Err(e) = self.write_store() {
                warn!(error = %e, "failed to persist notification flags");
            }
        }
        for n in notifications {
            debug!(tag = %n.tag, "showing notification toast");
            self.push_toast(ToastKind::Reminder, format!("{}: {}", n.title, n.body));
        }
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    /// Dispatch a key press for the current screen.
    ///
    /// Returns true if the application should quit. Failed actions become
    /// error toasts instead of ending the session.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers, now: DateTime<Local>) -> bool {
        let outcome = match self.state {
            AppState::TaskList => self.handle_task_list_input(key, modifiers, now),
            AppState::AddTask | AppState::EditTask => self.handle_form_input(key, now),
            AppState::Help => self.handle_help_input(key),
            AppState::Confirm => self.handle_confirm_input(key),
        };
        match outcome {
            Ok(quit) => quit,
            Err(e) => {
                warn!(error = %e, "action failed");
                self.push_toast(ToastKind::Error, e.to_string());
                false
            }
        }
    }

    fn handle_search_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.search.clear();
                self.input_mode = InputMode::None;
            }
            KeyCode::Enter => self.input_mode = InputMode::None,
            KeyCode::Backspace => {
                self.search.pop();
            }
            KeyCode::Char(c) => self.search.push(c),
            _ => return,
        }
        self.update_filtered_tasks();
    }

    fn handle_task_list_input(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
        now: DateTime<Local>,
    ) -> Result<bool> {
        if self.input_mode == InputMode::Search {
            self.handle_search_input(key);
            return Ok(false);
        }

        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc => {
                if self.search.is_empty() {
                    return Ok(true);
                }
                self.search.clear();
                self.update_filtered_tasks();
            }

            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = self.task_list_state.selected() {
                    self.task_list_state.select(Some(selected.saturating_sub(1)));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected + 1 < self.filtered_tasks.len() {
                        self.task_list_state.select(Some(selected + 1));
                    }
                }
            }
            KeyCode::Home | KeyCode::Char('g') if !self.filtered_tasks.is_empty() => {
                self.task_list_state.select(Some(0));
            }
            KeyCode::End | KeyCode::Char('G') if !self.filtered_tasks.is_empty() => {
                self.task_list_state.select(Some(self.filtered_tasks.len() - 1));
            }

            KeyCode::Char(' ') | KeyCode::Char('x') => self.toggle_selected(now)?,
            KeyCode::Char('a') | KeyCode::Char('n') => {
                self.task_form = TaskForm::new(self.config.default_priority, self.config.default_time().ok());
                self.state = AppState::AddTask;
                self.input_mode = InputMode::Form;
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(task) = self.get_selected_task() {
                    self.task_form = TaskForm::from_task(task);
                    self.state = AppState::EditTask;
                    self.input_mode = InputMode::Form;
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(task) = self.get_selected_task() {
                    self.confirm_action = Some(ConfirmAction::DeleteTask {
                        id: task.id.clone(),
                        title: task.title.clone(),
                    });
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('C') => {
                let count = self.db.completed_count();
                if count == 0 {
                    self.push_toast(ToastKind::Info, "No completed tasks to clear");
                } else {
                    self.confirm_action = Some(ConfirmAction::ClearCompleted { count });
                    self.state = AppState::Confirm;
                }
            }

            KeyCode::Tab | KeyCode::Char('f') => {
                self.filter = self.filter.next();
                self.update_filtered_tasks();
            }
            KeyCode::Char('1') => self.set_filter(StatusFilter::All),
            KeyCode::Char('2') => self.set_filter(StatusFilter::Pending),
            KeyCode::Char('3') => self.set_filter(StatusFilter::Completed),
            KeyCode::Char('s') => self.set_sort(SortKey::Deadline),
            KeyCode::Char('p') => self.set_sort(SortKey::Priority),
            KeyCode::Char('/') => self.input_mode = InputMode::Search,

            KeyCode::Char('t') => self.toggle_theme()?,
            KeyCode::Char('E') => self.export(now)?,
            KeyCode::Char('z') => self.snooze_selected(now)?,
            KeyCode::Char('r') => {
                self.refresh_tasks();
                self.push_toast(ToastKind::Info, "Reloaded tasks");
            }
            KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        Ok(false)
    }

    fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.update_filtered_tasks();
    }

    fn set_sort(&mut self, requested: SortKey) {
        self.sort = self.sort.toggled(requested);
        self.update_filtered_tasks();
    }

    fn toggle_selected(&mut self, now: DateTime<Local>) -> Result<()> {
        let Some(id) = self.selected_id().map(str::to_string) else {
            return Ok(());
        };
        self.reload_if_changed();
        let completed = self.db.toggle_complete(&id, now)?;
        self.save_db()?;
        if completed {
            self.push_toast(ToastKind::Success, "Task completed! 🎉");
        } else {
            self.push_toast(ToastKind::Info, "Task marked as pending");
        }
        Ok(())
    }

    fn toggle_theme(&mut self) -> Result<()> {
        self.config.dark_mode = !self.config.dark_mode;
        self.palette = Palette::for_mode(self.config.dark_mode);
        self.config.save_to_file(&self.config_path)?;
        let label = if self.config.dark_mode { "Dark mode on" } else { "Light mode on" };
        self.push_toast(ToastKind::Info, label);
        Ok(())
    }

    fn export(&mut self, now: DateTime<Local>) -> Result<()> {
        let path = PathBuf::from(default_export_name(now.date_naive()));
        let count = self.db.export_to(&path, now)?;
        self.push_toast(
            ToastKind::Success,
            format!("Exported {} task(s) to {}", count, path.display()),
        );
        Ok(())
    }

    fn snooze_selected(&mut self, now: DateTime<Local>) -> Result<()> {
        let minutes = self.config.snooze_minutes.max(1);
        let Some(id) = self.selected_id().map(str::to_string) else {
            return Ok(());
        };
        self.reload_if_changed();
        let task = self
            .db
            .get_mut(&id)
            .ok_or_else(|| TodoError::TaskNotFound(id.clone()))?;
        if task.completed {
            self.push_toast(ToastKind::Info, "Completed tasks have no reminders");
            return Ok(());
        }
        snooze(task, now, minutes)?;
        self.save_db()?;
        self.push_toast(ToastKind::Info, format!("Snoozed for {} minutes", minutes));
        Ok(())
    }

    fn handle_form_input(&mut self, key: KeyCode, now: DateTime<Local>) -> Result<bool> {
        match key {
            KeyCode::Esc => {
                self.state = AppState::TaskList;
                self.input_mode = InputMode::None;
            }
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Home => self.task_form.handle_home_end(false),
            KeyCode::End => self.task_form.handle_home_end(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Enter => self.submit_form(now)?,
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
        Ok(false)
    }

    /// Validate the form and create or update the task. On error the form stays open.
    fn submit_form(&mut self, now: DateTime<Local>) -> Result<()> {
        let today = now.date_naive();
        self.reload_if_changed();
        let (id, message) = match self.task_form.editing.clone() {
            Some(id) => {
                let patch = self.task_form.to_patch(today)?;
                self.db.update(&id, patch, now)?;
                (id, "Task updated successfully!")
            }
            None => {
                let draft = self.task_form.to_draft(today)?;
                (self.db.add(draft, now)?, "Task added successfully!")
            }
        };
        self.save_db()?;
        self.select_id(&id);
        self.state = AppState::TaskList;
        self.input_mode = InputMode::None;
        self.push_toast(ToastKind::Success, message);
        Ok(())
    }

    fn handle_confirm_input(&mut self, key: KeyCode) -> Result<bool> {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.state = AppState::TaskList;
                self.reload_if_changed();
                match self.confirm_action.take() {
                    Some(ConfirmAction::DeleteTask { id, .. }) => {
                        self.db.remove(&id)?;
                        self.save_db()?;
                        self.push_toast(ToastKind::Success, "Task deleted");
                    }
                    Some(ConfirmAction::ClearCompleted { .. }) => {
                        let removed = self.db.clear_completed();
                        self.save_db()?;
                        self.push_toast(
                            ToastKind::Success,
                            format!("Cleared {} completed task(s)", removed),
                        );
                    }
                    None => {}
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state = AppState::TaskList;
                self.confirm_action = None;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_help_input(&mut self, key: KeyCode) -> Result<bool> {
        if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') | KeyCode::Char('?')) {
            self.state = AppState::TaskList;
        }
        Ok(false)
    }

    // ---------------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------------

    fn base_style(&self) -> Style {
        Style::default().bg(self.palette.bg).fg(self.palette.fg)
    }

    fn priority_color(&self, p: Priority) -> ratatui::style::Color {
        match p {
            Priority::High => self.palette.high,
            Priority::Medium => self.palette.medium,
            Priority::Low => self.palette.low,
        }
    }

    /// Render the header, filter tabs and task table.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect, now: DateTime<Local>) {
        let p = self.palette;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // header with stats
                Constraint::Length(3), // filter tabs
                Constraint::Min(0),    // table
            ])
            .split(area);

        let stats = self.db.stats(now);
        let mut stat_spans = vec![
            Span::styled("SMART TODO", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::raw(format!(
                "Total: {}  Pending: {}  Completed: {}",
                stats.total, stats.pending, stats.completed
            )),
        ];
        if stats.overdue > 0 {
            stat_spans.push(Span::styled(
                format!("  Overdue: {}", stats.overdue),
                Style::default().fg(p.overdue).add_modifier(Modifier::BOLD),
            ));
        }
        let header = Paragraph::new(Line::from(stat_spans))
            .style(self.base_style())
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, chunks[0]);

        let selected_tab = match self.filter {
            StatusFilter::All => 0,
            StatusFilter::Pending => 1,
            StatusFilter::Completed => 2,
        };
        let mut tabs_title = format!("Filter | Sort: {}", format_sort(self.sort));
        if !self.search.is_empty() {
            tabs_title.push_str(&format!(" | Search: \"{}\"", self.search));
        }
        let tabs = Tabs::new(
            [StatusFilter::All, StatusFilter::Pending, StatusFilter::Completed]
                .into_iter()
                .map(format_filter),
        )
        .select(selected_tab)
        .style(self.base_style())
        .highlight_style(Style::default().fg(p.accent_fg).bg(p.accent).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(tabs_title));
        f.render_widget(tabs, chunks[1]);

        if self.filtered_tasks.is_empty() {
            let (heading, hint) = empty_state(self.filter, !self.search.trim().is_empty());
            let text = vec![
                Line::from(""),
                Line::from(Span::styled(heading, Style::default().add_modifier(Modifier::BOLD))),
                Line::from(Span::styled(hint, Style::default().fg(p.muted))),
                Line::from(""),
                Line::from(Span::styled("Press 'a' to add a task", Style::default().fg(p.muted))),
            ];
            let empty = Paragraph::new(text)
                .style(self.base_style())
                .block(Block::default().borders(Borders::ALL).title("Tasks"))
                .alignment(Alignment::Center);
            f.render_widget(empty, chunks[2]);
            return;
        }

        let header_cells = ["", "Priority", "Deadline", "When", "Title", "Description"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(p.accent).fg(p.accent_fg))
            .height(1);

        let rows: Vec<Row> = self
            .filtered_tasks
            .iter()
            .filter_map(|id| self.db.get(id))
            .map(|task| {
                let overdue = !task.completed && task.is_overdue(now);
                let style = if task.completed {
                    Style::default().fg(p.done).add_modifier(Modifier::CROSSED_OUT)
                } else if overdue {
                    Style::default().fg(p.overdue)
                } else {
                    Style::default().fg(p.fg)
                };
                let priority_style = if task.completed {
                    style
                } else {
                    Style::default().fg(self.priority_color(task.priority))
                };
                Row::new(vec![
                    Cell::from(if task.completed { "[x]" } else { "[ ]" }),
                    Cell::from(format_priority(task.priority)).style(priority_style),
                    Cell::from(task.deadline().format("%Y-%m-%d %H:%M").to_string()),
                    Cell::from(task.time_info(now)),
                    Cell::from(task.title.clone()),
                    Cell::from(truncate(&task.description, 40)).style(Style::default().fg(p.muted)),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(3),  // check
            Constraint::Length(8),  // priority
            Constraint::Length(16), // deadline
            Constraint::Length(26), // when
            Constraint::Min(20),    // title
            Constraint::Min(0),     // description
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .style(self.base_style())
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}/{}) - Press 'h' for help",
                self.filtered_tasks.len(),
                self.db.tasks.len()
            )))
            .row_highlight_style(Style::default().bg(p.highlight_bg).fg(p.highlight_fg))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[2], &mut self.task_list_state);
    }

    /// Render the add/edit form.
    fn render_task_form(&mut self, f: &mut Frame, area: Rect) {
        let p = self.palette;
        let form = &self.task_form;
        let outer = Block::default()
            .borders(Borders::ALL)
            .title(if form.is_edit() { "Edit Task" } else { "Add Task" })
            .style(self.base_style());
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(6), // Description
                Constraint::Length(3), // Date
                Constraint::Length(3), // Time
                Constraint::Length(3), // Priority
                Constraint::Min(1),    // Instructions
            ])
            .split(inner);

        let border = |field: usize| {
            if form.current_field == field {
                Style::default().fg(p.focus)
            } else {
                Style::default()
            }
        };

        let title = Paragraph::new(form.title.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Title *")
                .border_style(border(TITLE_GLOBAL_ORDER)),
        );
        f.render_widget(title, chunks[0]);

        let description = Paragraph::new(form.description.value.as_str())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Description ({})", form.description_counter()))
                    .border_style(border(DESCRIPTION_GLOBAL_ORDER)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(description, chunks[1]);

        let date = Paragraph::new(form.date.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Date * (YYYY-MM-DD, today, tomorrow, friday, in 3d, eow)")
                .border_style(border(DATE_GLOBAL_ORDER)),
        );
        f.render_widget(date, chunks[2]);

        let time = Paragraph::new(form.time.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Time * (HH:MM, noon, midnight)")
                .border_style(border(TIME_GLOBAL_ORDER)),
        );
        f.render_widget(time, chunks[3]);

        let priority = Paragraph::new(Line::from(vec![
            Span::raw("< "),
            Span::styled(
                format_priority(form.priority),
                Style::default().fg(self.priority_color(form.priority)).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" >"),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Priority")
                .border_style(border(PRIORITY_GLOBAL_ORDER)),
        );
        f.render_widget(priority, chunks[4]);

        let instructions = Paragraph::new(vec![
            Line::from("Tab/↑↓ move between fields  ←/→ change priority"),
            Line::from("Enter save  Esc cancel"),
        ])
        .style(Style::default().fg(p.muted));
        f.render_widget(instructions, chunks[5]);

        let cursor_target = match form.current_field {
            TITLE_GLOBAL_ORDER => Some((&form.title, chunks[0])),
            DESCRIPTION_GLOBAL_ORDER => Some((&form.description, chunks[1])),
            DATE_GLOBAL_ORDER => Some((&form.date, chunks[2])),
            TIME_GLOBAL_ORDER => Some((&form.time, chunks[3])),
            _ => None,
        };
        if let Some((field, rect)) = cursor_target {
            let width = rect.width.saturating_sub(2).max(1) as usize;
            let (row, col) = (field.cursor / width, field.cursor % width);
            let max_row = rect.height.saturating_sub(3) as usize;
            f.set_cursor_position((rect.x + 1 + col as u16, rect.y + 1 + row.min(max_row) as u16));
        }
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("To-do Help", bold)),
            Line::from(""),
            Line::from(Span::styled("Task List:", bold)),
            Line::from("  ↑/↓, k/j     Navigate tasks"),
            Line::from("  Space/x      Toggle complete"),
            Line::from("  a/n          Add new task"),
            Line::from("  e/Enter      Edit selected task"),
            Line::from("  d/Del        Delete selected task"),
            Line::from("  C            Clear completed tasks"),
            Line::from("  Tab/f, 1-3   Filter: All / Pending / Completed"),
            Line::from("  s            Sort by deadline (again to reset)"),
            Line::from("  p            Sort by priority (again to reset)"),
            Line::from("  /            Search title and description"),
            Line::from("  z            Snooze due-soon/overdue reminders"),
            Line::from("  E            Export to todo-backup-<date>.json"),
            Line::from("  t            Toggle dark mode"),
            Line::from("  r            Reload tasks from disk"),
            Line::from("  h/?/F1       Show this help"),
            Line::from("  q/Esc/Ctrl+C Quit"),
            Line::from(""),
            Line::from(Span::styled("Form:", bold)),
            Line::from("  Tab/↑↓       Navigate between fields"),
            Line::from("  ←/→          Move cursor / change priority"),
            Line::from("  Enter        Save task"),
            Line::from("  Esc          Cancel and return"),
            Line::from(""),
            Line::from(Span::styled("Reminders:", bold)),
            Line::from(format!(
                "  {} min before the deadline and at the deadline; due-soon within {} h; overdue once.",
                self.config.reminder_lead_minutes, self.config.due_soon_hours
            )),
        ];

        let paragraph = Paragraph::new(help_text)
            .style(self.base_style())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press Esc to return"),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }

    /// Render a confirmation dialog for destructive actions.
    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED).fg(ratatui::style::Color::White));

        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let prompt = self
            .confirm_action
            .as_ref()
            .map(ConfirmAction::prompt)
            .unwrap_or_default();
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(prompt, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        f.render_widget(paragraph, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if self.input_mode == InputMode::Search {
            format!("Search: {}_ (Enter to keep, Esc to clear)", self.search)
        } else {
            match self.state {
                AppState::TaskList => format!(
                    "{} shown | a add  e edit  space toggle  d delete  / search  h help  q quit",
                    self.filtered_tasks.len()
                ),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(self.palette.accent).fg(self.palette.accent_fg))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Render the current toast in the top-right corner.
    fn render_toast(&mut self, f: &mut Frame, area: Rect) {
        let Some(toast) = self.toasts.front() else {
            return;
        };
        let (label, color) = match toast.kind {
            ToastKind::Info => ("Info", self.palette.accent),
            ToastKind::Success => ("Done", self.palette.low),
            ToastKind::Error => ("Error", self.palette.overdue),
            ToastKind::Reminder => ("Reminder", self.palette.medium),
        };
        let width = area.width.min(60);
        let text_width = width.saturating_sub(2).max(1) as usize;
        let lines = (toast.text.chars().count() / text_width + 1).min(4) as u16;
        let rect = Rect {
            x: area.x + area.width - width,
            y: area.y,
            width,
            height: (lines + 2).min(area.height),
        };
        f.render_widget(Clear, rect);
        let paragraph = Paragraph::new(toast.text.as_str())
            .style(self.base_style())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(label)
                    .border_style(Style::default().fg(color)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, rect);
    }

    /// Main render function that dispatches to appropriate view renderers.
    fn render(&mut self, f: &mut Frame) {
        let now = Local::now();
        f.render_widget(Block::default().style(self.base_style()), f.area());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0], now),
            AppState::AddTask | AppState::EditTask => self.render_task_form(f, chunks[0]),
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                self.render_task_list(f, chunks[0], now);
                self.render_confirm(f, chunks[0]);
            }
        }

        self.render_status_bar(f, chunks[1]);
        self.render_toast(f, chunks[0]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles rendering, reminder checks and input until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            let tick = Instant::now();
            if self
                .last_check
                .map_or(true, |t| tick.saturating_duration_since(t) >= REMINDER_CHECK_EVERY)
            {
                self.check_reminders(Local::now());
                self.last_check = Some(tick);
            }
            self.expire_toasts(tick);

            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press
                        && self.handle_key(key.code, key.modifiers, Local::now())
                    {
                        return Ok(());
                    }
                }
            }
        }
    }
}
