//! Application state and key handling.

use crate::config::TuiConfig;
use crate::controller::{main_table, related_table, FormSlot, MasterDetailController, ViewEvent};
use crate::events::TuiEvent;
use crate::form::{FormPhase, FormRegistry};
use crate::keys::{map_form_key, map_key, Action, FormKey};
use crate::nav::Nav;
use crate::notifications::{Notification, NotificationLevel};
use crate::persistence::PersistedState;
use crate::table::RowTarget;
use crate::theme::Theme;
use clinic_core::{RecordId, SchemaError, SchemaRegistry, Transport};
use crossterm::event::{KeyCode, KeyEvent};
use std::sync::Arc;
use tokio::sync::mpsc;

const MAX_NOTIFICATIONS: usize = 50;

pub const HELP_TEXT: &str = "Tab/1-9 switch view • j/k move • Space main/related • h/l related tab\n\
Enter select • n new • e edit • d delete • r reload • : command • q quit\n\
In forms: Tab/Up/Down change field • Left/Right pick a parent • Enter save • Esc close\n\
Commands: edit <id> • view <entity> • tab <related> • new • reload • quit";

/// Which table receives cursor and row keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Main,
    Related,
}

#[derive(Debug, Clone, Default)]
pub struct CommandPalette {
    pub input: String,
}

#[derive(Debug, Clone)]
pub struct Modal {
    pub title: String,
    pub message: String,
}

pub struct App {
    pub config: TuiConfig,
    pub theme: Theme,
    pub registry: Arc<SchemaRegistry>,
    pub nav: Nav,
    pub view: MasterDetailController,
    pub focus: Focus,
    pub main_cursor: Option<usize>,
    pub related_cursor: Option<usize>,
    pub notifications: Vec<Notification>,
    pub command_palette: Option<CommandPalette>,
    pub modal: Option<Modal>,

    forms: Arc<FormRegistry>,
    transport: Arc<dyn Transport>,
    events: mpsc::Sender<TuiEvent>,
    next_mount: u64,
}

impl App {
    /// Build the app and mount `initial_entity` (or the first entity),
    /// starting its main load.
    pub fn new(
        config: TuiConfig,
        registry: Arc<SchemaRegistry>,
        transport: Arc<dyn Transport>,
        events: mpsc::Sender<TuiEvent>,
        initial_entity: Option<&str>,
    ) -> Result<Self, SchemaError> {
        let mut nav = Nav::from_registry(&registry)
            .ok_or_else(|| SchemaError::Parse("model declares no entities".to_string()))?;
        if let Some(index) = initial_entity.and_then(|name| nav.position(name)) {
            nav.set_active(index);
        }
        let schema = registry.get_schema(nav.active())?;
        let forms = Arc::new(FormRegistry::from_schemas(&registry));
        let theme = Theme::from_name(&config.theme.name).unwrap_or_else(Theme::dark);

        let mut view = MasterDetailController::new(
            1,
            schema,
            Arc::clone(&forms),
            Arc::clone(&transport),
            events.clone(),
        );
        view.load();

        Ok(Self {
            config,
            theme,
            registry,
            nav,
            view,
            focus: Focus::Main,
            main_cursor: None,
            related_cursor: None,
            notifications: Vec::new(),
            command_palette: None,
            modal: None,
            forms,
            transport,
            events,
            next_mount: 1,
        })
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let excess = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            active_entity: self.nav.active().to_string(),
        }
    }

    /// Unmount the current view and mount the entity at `index`. Work still
    /// in flight for the old view is dropped when it completes.
    pub fn switch_view(&mut self, index: usize) {
        if index == self.nav.index() {
            return;
        }
        let Some(schema) = self.registry.entities().get(index).cloned() else {
            return;
        };
        self.nav.set_active(index);
        self.next_mount += 1;
        tracing::info!(entity = %schema.name, mount = self.next_mount, "Mounting view");
        self.view = MasterDetailController::new(
            self.next_mount,
            schema,
            Arc::clone(&self.forms),
            Arc::clone(&self.transport),
            self.events.clone(),
        );
        self.view.load();
        self.focus = Focus::Main;
        self.main_cursor = None;
        self.related_cursor = None;
    }

    pub fn handle_view_event(&mut self, mount: u64, event: ViewEvent) {
        if mount != self.view.mount() {
            tracing::debug!(mount, current = self.view.mount(), "Dropping completion for unmounted view");
            return;
        }
        self.view.handle_event(event);
        for notice in self.view.take_notifications() {
            self.notify(notice.level, notice.message);
        }
        self.clamp_cursors();
    }

    /// Apply a key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.command_palette.is_some() {
            return self.palette_key(key);
        }
        if self.modal.is_some() {
            self.modal = None;
            return false;
        }
        if self.view.related_form().is_some() {
            self.form_key(FormSlot::Related, key);
            return false;
        }
        if self.view.main_form().is_some() {
            self.form_key(FormSlot::Main, key);
            return false;
        }
        if self.view.delete_confirm().is_some() {
            match key.code {
                KeyCode::Enter | KeyCode::Char('y') => self.view.confirm_delete(),
                KeyCode::Esc | KeyCode::Char('n') => self.view.cancel_delete(),
                _ => {}
            }
            return false;
        }
        match map_key(key) {
            Some(action) => self.handle_action(action),
            None => false,
        }
    }

    fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::NextView => self.switch_view(self.nav.next_index()),
            Action::PrevView => self.switch_view(self.nav.previous_index()),
            Action::SwitchView(index) => self.switch_view(index),
            Action::MoveDown => self.move_cursor(true),
            Action::MoveUp => self.move_cursor(false),
            Action::MoveLeft => {
                self.view.previous_tab();
                self.related_cursor = None;
                self.clamp_cursors();
            }
            Action::MoveRight => {
                self.view.next_tab();
                self.related_cursor = None;
                self.clamp_cursors();
            }
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    Focus::Main if self.view.active_tab().is_some() => Focus::Related,
                    _ => Focus::Main,
                };
            }
            Action::Confirm => self.click(RowTarget::Row),
            Action::EditItem => self.click(RowTarget::EditButton),
            Action::DeleteItem => self.click(RowTarget::DeleteButton),
            Action::NewItem => self.new_item(),
            Action::Refresh => self.view.load(),
            Action::OpenHelp => {
                self.modal = Some(Modal {
                    title: "Keybindings".to_string(),
                    message: HELP_TEXT.to_string(),
                })
            }
            Action::OpenCommand => self.command_palette = Some(CommandPalette::default()),
            Action::Cancel => self.focus = Focus::Main,
        }
        false
    }

    fn new_item(&mut self) {
        match self.focus {
            Focus::Main => self.view.create_new(),
            Focus::Related => {
                let Some(tab) = self.view.active_tab().map(str::to_string) else {
                    return;
                };
                if self.view.selected().is_none() {
                    self.notify(
                        NotificationLevel::Info,
                        format!("Select a {} first", self.view.schema().name),
                    );
                    return;
                }
                if let Err(err) = self.view.add_related(&tab) {
                    self.notify(NotificationLevel::Error, err.to_string());
                }
            }
        }
    }

    /// Dispatch a row click on the focused table at its cursor.
    fn click(&mut self, target: RowTarget) {
        let command = match self.focus {
            Focus::Main => {
                let Some(row) = self.main_cursor else {
                    return;
                };
                let table = main_table(self.view.main_collection(), self.view.schema());
                table.click(row, target)
            }
            Focus::Related => {
                let (Some(row), Some(tab)) = (self.related_cursor, self.view.active_tab()) else {
                    return;
                };
                let (Some(collection), Ok(schema)) =
                    (self.view.related(tab), self.registry.get_schema(tab))
                else {
                    return;
                };
                let table = related_table(collection, &schema, tab);
                table.click(row, target)
            }
        };
        if let Some(command) = command {
            self.view.apply(command);
            self.clamp_cursors();
        }
    }

    fn form_key(&mut self, slot: FormSlot, key: KeyEvent) {
        let form = match slot {
            FormSlot::Main => self.view.main_form_mut(),
            FormSlot::Related => self.view.related_form_mut().map(|r| &mut r.form),
        };
        let Some(form) = form else {
            return;
        };
        match map_form_key(key) {
            FormKey::Cancel => self.close_form(slot),
            FormKey::Submit => {
                if matches!(form.phase(), FormPhase::LoadFailed(_)) {
                    self.close_form(slot);
                } else {
                    match slot {
                        FormSlot::Main => self.view.submit_main_form(),
                        FormSlot::Related => self.view.submit_related_form(),
                    }
                }
            }
            FormKey::NextField => form.focus_next(),
            FormKey::PrevField => form.focus_prev(),
            FormKey::Edit(key) => {
                self.view.form_key(slot, key);
            }
        }
    }

    fn close_form(&mut self, slot: FormSlot) {
        match slot {
            FormSlot::Main => self.view.close_main_form(),
            FormSlot::Related => self.view.close_related_form(),
        }
    }

    fn palette_key(&mut self, key: KeyEvent) -> bool {
        let Some(palette) = self.command_palette.as_mut() else {
            return false;
        };
        match key.code {
            KeyCode::Esc => self.command_palette = None,
            KeyCode::Enter => {
                let input = std::mem::take(&mut palette.input);
                self.command_palette = None;
                return self.run_command(&input);
            }
            KeyCode::Backspace => {
                palette.input.pop();
            }
            KeyCode::Char(c) => palette.input.push(c),
            _ => {}
        }
        false
    }

    /// Execute a command palette line. Returns true on quit.
    pub fn run_command(&mut self, input: &str) -> bool {
        let line = input.trim().trim_start_matches(':');
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("q") | Some("quit"), _) => return true,
            (Some("reload"), _) => self.view.load(),
            (Some("new"), _) => {
                self.focus = Focus::Main;
                self.view.create_new();
            }
            (Some("edit"), Some(raw)) => self.view.edit_by_id(parse_record_id(raw)),
            (Some("tab"), Some(name)) => {
                if self.view.set_active_tab(name) {
                    self.focus = Focus::Related;
                    self.related_cursor = None;
                    self.clamp_cursors();
                } else {
                    self.notify(NotificationLevel::Warning, format!("No related tab: {}", name));
                }
            }
            (Some("view"), Some(name)) => match self.nav.position(name) {
                Some(index) => self.switch_view(index),
                None => self.notify(NotificationLevel::Warning, format!("Unknown view: {}", name)),
            },
            (None, _) => {}
            _ => self.notify(NotificationLevel::Warning, format!("Unknown command: {}", line)),
        }
        false
    }

    fn move_cursor(&mut self, forward: bool) {
        let len = match self.focus {
            Focus::Main => self.view.main_collection().len(),
            Focus::Related => self.related_len(),
        };
        let cursor = match self.focus {
            Focus::Main => &mut self.main_cursor,
            Focus::Related => &mut self.related_cursor,
        };
        *cursor = step_cursor(*cursor, len, forward);
    }

    fn related_len(&self) -> usize {
        self.view
            .active_tab()
            .and_then(|tab| self.view.related(tab))
            .map_or(0, <[_]>::len)
    }

    fn clamp_cursors(&mut self) {
        self.main_cursor = clamp_cursor(self.main_cursor, self.view.main_collection().len());
        self.related_cursor = clamp_cursor(self.related_cursor, self.related_len());
    }
}

/// Numeric text becomes an integer id, anything else a string id.
pub fn parse_record_id(raw: &str) -> RecordId {
    raw.parse::<i64>()
        .map(RecordId::Int)
        .unwrap_or_else(|_| RecordId::Text(raw.to_string()))
}

fn step_cursor(cursor: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match (cursor, forward) {
        (None, true) => 0,
        (None, false) => len - 1,
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => {
            if i == 0 || i >= len {
                len - 1
            } else {
                i - 1
            }
        }
    };
    Some(next)
}

fn clamp_cursor(cursor: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(cursor.unwrap_or(0).min(len - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_cursor_empty_list() {
        assert_eq!(step_cursor(None, 0, true), None);
        assert_eq!(step_cursor(Some(3), 0, false), None);
    }

    #[test]
    fn test_step_cursor_starts_at_ends() {
        assert_eq!(step_cursor(None, 3, true), Some(0));
        assert_eq!(step_cursor(None, 3, false), Some(2));
    }

    #[test]
    fn test_step_cursor_wraps() {
        assert_eq!(step_cursor(Some(2), 3, true), Some(0));
        assert_eq!(step_cursor(Some(0), 3, false), Some(2));
        assert_eq!(step_cursor(Some(1), 3, false), Some(0));
    }

    #[test]
    fn test_clamp_cursor() {
        assert_eq!(clamp_cursor(None, 2), Some(0));
        assert_eq!(clamp_cursor(Some(5), 2), Some(1));
        assert_eq!(clamp_cursor(Some(1), 0), None);
    }

    #[test]
    fn test_parse_record_id() {
        assert_eq!(parse_record_id("12"), RecordId::Int(12));
        assert_eq!(parse_record_id("a-7"), RecordId::Text("a-7".to_string()));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Cursor movement stays in bounds whatever the sequence.
        #[test]
        fn prop_cursor_stays_in_bounds(
            len in 0usize..20,
            ops in prop::collection::vec(any::<bool>(), 0..40),
        ) {
            let mut cursor = None;
            for forward in ops {
                cursor = step_cursor(cursor, len, forward);
                match cursor {
                    Some(i) => prop_assert!(i < len),
                    None => prop_assert_eq!(len, 0),
                }
            }
        }

        /// A full lap of next moves returns to the start.
        #[test]
        fn prop_cursor_lap_returns(len in 1usize..20, start in 0usize..20) {
            let start = start % len;
            let mut cursor = Some(start);
            for _ in 0..len {
                cursor = step_cursor(cursor, len, true);
            }
            prop_assert_eq!(cursor, Some(start));
        }
    }
}
