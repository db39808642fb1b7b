//! Application state and logic.

use crate::config::Config;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use habit_core::summary::{self, shift_month};
use habit_core::{
    Action, Day, Goal, Habit, HabitError, HabitId, HabitRepository, HabitStore, SqliteStore,
};
use tracing::{info, warn};

/// Application state.
pub struct App<R: HabitRepository> {
    /// Habit collection and its repository.
    pub store: HabitStore<R>,
    /// Configuration.
    pub config: Config,
    /// Current view.
    pub view: View,
    /// Today, as of the last tick.
    pub today: Day,
    /// Day being viewed and toggled.
    pub selected_date: Day,
    /// Selected habit index.
    pub selected_index: usize,
    /// Whether in editing mode.
    pub editing: bool,
    /// Input buffer for editing.
    pub input_buffer: String,
    /// Editing field.
    pub editing_field: EditField,
    /// Name entered in the first step of adding a habit.
    pub pending_name: Option<String>,
    /// Message to display.
    pub message: Option<(String, MessageType)>,
    /// Show help popup.
    pub show_help: bool,
    /// Confirmation dialog.
    pub confirm_dialog: Option<ConfirmDialog>,
}

/// Current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Habit table with the current week.
    Habits,
    /// Month calendar.
    Calendar,
    /// Totals and charts.
    Dashboard,
}

/// Editing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    None,
    /// Name of a new habit.
    HabitName,
    /// Goal of a new habit.
    NewHabitGoal,
    /// Goal of the selected habit.
    Goal,
    /// Name of the selected habit.
    Rename,
}

/// Message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

/// Confirmation dialog.
#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

/// Confirm action type.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    DeleteHabit(HabitId),
    Import,
}

impl App<SqliteStore> {
    /// Open the configured database and load habits.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let db_path = config.db_path().unwrap_or_else(|| "habits.db".into());
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let repo = SqliteStore::open(&db_path)?;
        let today = Day::today();
        let store = HabitStore::load(repo, today)?;
        info!(path = %db_path.display(), habits = store.len(), "habit tracker started");
        Ok(Self::with_store(store, config, today))
    }
}

impl<R: HabitRepository> App<R> {
    /// Build an app around an already loaded store.
    pub fn with_store(store: HabitStore<R>, config: Config, today: Day) -> Self {
        Self {
            store,
            config,
            view: View::Habits,
            today,
            selected_date: today,
            selected_index: 0,
            editing: false,
            input_buffer: String::new(),
            editing_field: EditField::None,
            pending_name: None,
            message: None,
            show_help: false,
            confirm_dialog: None,
        }
    }

    /// Habits in display order.
    pub fn habits(&self) -> &[Habit] {
        self.store.habits()
    }

    /// Advance to a new day if the clock has rolled over.
    pub fn tick(&mut self, today: Day) {
        if today == self.today {
            return;
        }
        let was_viewing_today = self.selected_date == self.today;
        self.today = today;
        if was_viewing_today {
            self.selected_date = today;
        }
        match self.store.refresh(today) {
            Ok(_) => {
                self.message = Some((format!("New day: {today}"), MessageType::Info));
            }
            Err(err) => self.report(err),
        }
    }

    /// Check if in editing mode.
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Get selected habit.
    pub fn selected_habit(&self) -> Option<&Habit> {
        self.habits().get(self.selected_index)
    }

    /// Handle key input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        // Handle confirmation dialog
        if let Some(dialog) = self.confirm_dialog.clone() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm_dialog = None;
                    self.execute_confirm(dialog.action);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_dialog = None;
                }
                _ => {}
            }
            return;
        }

        // Handle help popup
        if self.show_help {
            self.show_help = false;
            return;
        }

        // Clear message on any key
        self.message = None;

        if self.editing {
            self.handle_edit_key(key);
            return;
        }

        match key.code {
            // Navigation
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Home => self.selected_index = 0,
            KeyCode::End => self.selected_index = self.habits().len().saturating_sub(1),

            // Date navigation
            KeyCode::Char('h') | KeyCode::Left => self.change_date(-1),
            KeyCode::Char('l') | KeyCode::Right => self.change_date(1),
            KeyCode::Char('H') => self.change_date(-7),
            KeyCode::Char('L') => self.change_date(7),
            KeyCode::Char('[') => self.change_month(-1),
            KeyCode::Char(']') => self.change_month(1),
            KeyCode::Char('t') => self.selected_date = self.today,

            // Toggle completion
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_completion(),

            // Views
            KeyCode::Char('1') => self.view = View::Habits,
            KeyCode::Char('2') | KeyCode::Char('c') => self.view = View::Calendar,
            KeyCode::Char('3') | KeyCode::Char('s') => self.view = View::Dashboard,
            KeyCode::Tab => self.cycle_view(),

            // Actions
            KeyCode::Char('a') => self.start_add_habit(),
            KeyCode::Char('e') => self.start_rename_habit(),
            KeyCode::Char('g') => self.start_edit_goal(),
            KeyCode::Char('d') => self.confirm_delete_habit(),
            KeyCode::Char('x') => self.export(),
            KeyCode::Char('i') => self.confirm_import(),

            // Help
            KeyCode::Char('?') => self.show_help = true,

            _ => {}
        }
    }

    /// Handle editing keys.
    fn handle_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.stop_editing(),
            KeyCode::Enter => self.finish_editing(),
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input_buffer.push(c);
            }
            _ => {}
        }
    }

    fn cycle_view(&mut self) {
        self.view = match self.view {
            View::Habits => View::Calendar,
            View::Calendar => View::Dashboard,
            View::Dashboard => View::Habits,
        };
    }

    /// Move selection by delta.
    fn move_selection(&mut self, delta: i32) {
        let len = self.habits().len();
        if len == 0 {
            return;
        }
        let new_index = self.selected_index as i32 + delta;
        self.selected_index = new_index.clamp(0, len as i32 - 1) as usize;
    }

    /// Change selected date.
    fn change_date(&mut self, delta: i64) {
        self.selected_date = self.selected_date.offset(delta);
    }

    /// Move the selected date by whole months, clamping the day of month.
    fn change_month(&mut self, delta: i32) {
        let (year, month) =
            shift_month(self.selected_date.year(), self.selected_date.month(), delta);
        let days_in_month = habit_core::engine::month_days(year, month).len() as u32;
        let day = self.selected_date.day().min(days_in_month);
        if let Some(date) = Day::from_ymd(year, month, day) {
            self.selected_date = date;
        }
    }

    /// Apply an action, reporting failures in the status line.
    fn dispatch(&mut self, action: Action) -> Option<HabitId> {
        match self.store.dispatch(action, self.today) {
            Ok(id) => Some(id),
            Err(err) => {
                self.report(err);
                None
            }
        }
    }

    fn report(&mut self, err: HabitError) {
        let kind = match err {
            // The change is live in memory; only the save failed.
            HabitError::Storage(_) => MessageType::Warning,
            _ => MessageType::Error,
        };
        warn!(error = %err, "action failed");
        self.message = Some((err.to_string(), kind));
    }

    /// Toggle completion for selected habit on the selected date.
    fn toggle_completion(&mut self) {
        let Some(habit) = self.selected_habit() else {
            return;
        };
        let id = habit.id;
        let day = self.selected_date;

        if self.dispatch(Action::ToggleCompletion { id, day }).is_some() {
            if let Some(habit) = self.store.get(id) {
                let state = if habit.is_completed_on(day) {
                    "completed"
                } else {
                    "uncompleted"
                };
                self.message = Some((
                    format!("{} {} on {}", habit.name, state, day),
                    MessageType::Success,
                ));
            }
        }
    }

    fn start_editing(&mut self, field: EditField, initial: String) {
        self.editing = true;
        self.editing_field = field;
        self.input_buffer = initial;
    }

    fn stop_editing(&mut self) {
        self.editing = false;
        self.input_buffer.clear();
        self.editing_field = EditField::None;
        self.pending_name = None;
    }

    /// Start adding a new habit.
    fn start_add_habit(&mut self) {
        self.start_editing(EditField::HabitName, String::new());
    }

    /// Start renaming the selected habit.
    fn start_rename_habit(&mut self) {
        if let Some(name) = self.selected_habit().map(|h| h.name.clone()) {
            self.start_editing(EditField::Rename, name);
        }
    }

    /// Start editing the selected habit's goal.
    fn start_edit_goal(&mut self) {
        if let Some(goal) = self.selected_habit().map(|h| h.goal) {
            self.start_editing(EditField::Goal, goal.to_string());
        }
    }

    /// Confirm delete habit.
    fn confirm_delete_habit(&mut self) {
        if let Some(habit) = self.selected_habit() {
            self.confirm_dialog = Some(ConfirmDialog {
                title: "Delete Habit".to_string(),
                message: format!("Delete '{}'? This cannot be undone. (y/n)", habit.name),
                action: ConfirmAction::DeleteHabit(habit.id),
            });
        }
    }

    fn confirm_import(&mut self) {
        let Some(path) = self.config.export_path() else {
            self.message = Some(("No import path configured".into(), MessageType::Error));
            return;
        };
        self.confirm_dialog = Some(ConfirmDialog {
            title: "Import Habits".to_string(),
            message: format!("Import habits from {}? (y/n)", path.display()),
            action: ConfirmAction::Import,
        });
    }

    /// Execute confirmed action.
    fn execute_confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteHabit(id) => {
                if self.dispatch(Action::DeleteHabit(id)).is_some() {
                    self.message = Some(("Habit deleted".to_string(), MessageType::Success));
                }
                let len = self.habits().len();
                if self.selected_index >= len {
                    self.selected_index = len.saturating_sub(1);
                }
            }
            ConfirmAction::Import => self.import(),
        }
    }

    fn export(&mut self) {
        let Some(path) = self.config.export_path() else {
            self.message = Some(("No export path configured".into(), MessageType::Error));
            return;
        };
        self.message = Some(
            match habit_core::storage::export_json(self.habits(), &path) {
                Ok(()) => (
                    format!("Exported {} habits to {}", self.habits().len(), path.display()),
                    MessageType::Success,
                ),
                Err(err) => {
                    warn!(error = %err, "export failed");
                    (format!("Export failed: {err}"), MessageType::Error)
                }
            },
        );
    }

    fn import(&mut self) {
        let Some(path) = self.config.export_path() else {
            return;
        };
        let habits = match habit_core::storage::import_json(&path) {
            Ok(habits) => habits,
            Err(err) => {
                warn!(error = %err, "import failed");
                self.message = Some((format!("Import failed: {err}"), MessageType::Error));
                return;
            }
        };
        match self.store.import(habits, self.today) {
            Ok(added) => {
                self.message = Some((format!("Imported {added} habits"), MessageType::Success));
            }
            Err(err) => self.report(err),
        }
    }

    /// Finish editing and save.
    fn finish_editing(&mut self) {
        let input = std::mem::take(&mut self.input_buffer);
        match self.editing_field {
            EditField::HabitName => {
                if input.trim().is_empty() {
                    self.report(HabitError::EmptyHabitName);
                } else {
                    // Second step: ask for the goal.
                    self.pending_name = Some(input);
                    let goal = self.config.defaults.goal.to_string();
                    self.start_editing(EditField::NewHabitGoal, goal);
                    return;
                }
            }
            EditField::NewHabitGoal => {
                let name = self.pending_name.take().unwrap_or_default();
                match Goal::parse(&input) {
                    Ok(goal) => {
                        let request = self.config.defaults.request(&name, goal);
                        if let Some(id) = self.dispatch(Action::AddHabit {
                            request,
                            created_at: Local::now(),
                        }) {
                            if let Some(index) = self.habits().iter().position(|h| h.id == id) {
                                self.selected_index = index;
                            }
                            self.message =
                                Some(("Habit created".to_string(), MessageType::Success));
                        }
                    }
                    Err(err) => self.report(err),
                }
            }
            EditField::Goal => {
                if let Some(id) = self.selected_habit().map(|h| h.id) {
                    match Goal::parse(&input) {
                        Ok(goal) => {
                            if self.dispatch(Action::UpdateGoal { id, goal }).is_some() {
                                self.message = Some((
                                    format!("Goal set to {goal} days"),
                                    MessageType::Success,
                                ));
                            }
                        }
                        Err(err) => self.report(err),
                    }
                }
            }
            EditField::Rename => {
                if let Some(id) = self.selected_habit().map(|h| h.id) {
                    self.dispatch(Action::RenameHabit { id, name: input });
                }
            }
            EditField::None => {}
        }

        self.stop_editing();
    }

    /// Progress for the selected date.
    pub fn selected_day_progress(&self) -> summary::DayProgress {
        summary::daily_progress(self.habits(), self.selected_date)
    }

    /// Get view title.
    pub fn view_title(&self) -> &str {
        match self.view {
            View::Habits => "Daily Habits",
            View::Calendar => "Calendar",
            View::Dashboard => "Dashboard",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use habit_core::MemoryRepository;

    fn day(s: &str) -> Day {
        Day::parse(s).unwrap()
    }

    fn test_app() -> App<MemoryRepository> {
        let today = day("2024-01-05");
        let store = HabitStore::load(MemoryRepository::new(), today).unwrap();
        App::with_store(store, Config::default(), today)
    }

    fn press(app: &mut App<MemoryRepository>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App<MemoryRepository>, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn add_habit(app: &mut App<MemoryRepository>, name: &str, goal: &str) {
        press(app, KeyCode::Char('a'));
        type_str(app, name);
        press(app, KeyCode::Enter);
        app.input_buffer.clear();
        type_str(app, goal);
        press(app, KeyCode::Enter);
    }

    #[test]
    fn test_add_habit_flow() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('a'));
        assert!(app.is_editing());
        type_str(&mut app, "Exercise");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.editing_field, EditField::NewHabitGoal);
        assert_eq!(app.input_buffer, "31");
        press(&mut app, KeyCode::Enter);

        assert!(!app.is_editing());
        assert_eq!(app.habits().len(), 1);
        assert_eq!(app.habits()[0].name, "Exercise");
        assert_eq!(app.habits()[0].goal, Goal::DEFAULT);
        assert_eq!(app.message.as_ref().map(|m| m.1), Some(MessageType::Success));
    }

    #[test]
    fn test_add_habit_rejects_bad_goal() {
        let mut app = test_app();
        add_habit(&mut app, "Exercise", "soon");
        assert!(app.habits().is_empty());
        assert_eq!(app.message.as_ref().map(|m| m.1), Some(MessageType::Error));
        assert!(!app.is_editing());
    }

    #[test]
    fn test_add_habit_rejects_blank_name() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert!(!app.is_editing());
        assert!(app.habits().is_empty());
        assert_eq!(app.message.as_ref().map(|m| m.1), Some(MessageType::Error));
    }

    #[test]
    fn test_toggle_selected_date() {
        let mut app = test_app();
        add_habit(&mut app, "Read", "10");
        assert_eq!(app.habits()[0].goal.days(), 10);

        press(&mut app, KeyCode::Char(' '));
        assert!(app.habits()[0].is_completed_on(app.today));
        assert_eq!(app.habits()[0].streak(), 1);

        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.habits()[0].streak(), 2);
        assert!(app.habits()[0].is_completed_on(day("2024-01-04")));

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.habits()[0].streak(), 1);
        assert_eq!(app.habits()[0].total_completions(), 1);

        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.selected_date, app.today);
    }

    #[test]
    fn test_edit_goal_and_rename() {
        let mut app = test_app();
        add_habit(&mut app, "Read", "31");

        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.input_buffer, "31");
        app.input_buffer.clear();
        type_str(&mut app, "0");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.habits()[0].goal.days(), 31);
        assert_eq!(app.message.as_ref().map(|m| m.1), Some(MessageType::Error));

        press(&mut app, KeyCode::Char('g'));
        app.input_buffer.clear();
        type_str(&mut app, "12");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.habits()[0].goal.days(), 12);

        press(&mut app, KeyCode::Char('e'));
        app.input_buffer.clear();
        type_str(&mut app, "Read books");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.habits()[0].name, "Read books");
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = test_app();
        add_habit(&mut app, "A", "31");
        add_habit(&mut app, "B", "31");
        assert_eq!(app.selected_index, 1);

        press(&mut app, KeyCode::Char('d'));
        assert!(app.confirm_dialog.is_some());
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.habits().len(), 2);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.habits().len(), 1);
        assert_eq!(app.habits()[0].name, "A");
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_view_switching() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.view, View::Calendar);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view, View::Dashboard);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.view, View::Habits);
    }

    #[test]
    fn test_month_navigation_clamps_day() {
        let mut app = test_app();
        app.selected_date = day("2024-01-31");
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.selected_date, day("2024-02-29"));
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.selected_date, day("2024-01-29"));
    }

    #[test]
    fn test_tick_rolls_over_day() {
        let mut app = test_app();
        add_habit(&mut app, "Read", "31");
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.habits()[0].streak(), 1);

        app.tick(day("2024-01-07"));
        assert_eq!(app.today, day("2024-01-07"));
        assert_eq!(app.selected_date, day("2024-01-07"));
        assert_eq!(app.habits()[0].streak(), 0);
    }

    #[test]
    fn test_export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app();
        app.config.storage.export_path = Some(dir.path().join("export.json"));
        add_habit(&mut app, "Read", "31");
        press(&mut app, KeyCode::Char(' '));

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.message.as_ref().map(|m| m.1), Some(MessageType::Success));

        let mut other = test_app();
        other.config.storage.export_path = app.config.storage.export_path.clone();
        press(&mut other, KeyCode::Char('i'));
        press(&mut other, KeyCode::Char('y'));
        assert_eq!(other.habits().len(), 1);
        assert_eq!(other.habits()[0].streak(), 1);

        // Importing the same file again adds nothing.
        press(&mut other, KeyCode::Char('i'));
        press(&mut other, KeyCode::Char('y'));
        assert_eq!(other.habits().len(), 1);
    }

    #[test]
    fn test_help_popup_swallows_next_key() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('a'));
        assert!(!app.show_help);
        assert!(!app.is_editing());
    }
}
