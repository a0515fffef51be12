//! Application state for the TUI.

mod form;
mod tasks;

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use crossterm::event::{KeyCode, KeyEvent};
use wrapcard_core::editor::{Edit, Editor};
use wrapcard_core::{Card, Config, Error, Session, WrappedData};

pub use form::FormField;
pub use tasks::TaskEvent;

/// What keystrokes currently do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Moving between fields
    Navigate,
    /// Typing into the selected text field; every key is applied immediately
    EditField,
    /// Typing a photo path
    PhotoPath(String),
    /// Typing a persona for autofill
    Persona(String),
}

/// A blocking message, dismissed with any key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

/// Main application state.
pub struct App {
    /// Authoritative card record and export flag
    session: Session,
    config: Config,
    fields: Vec<FormField>,
    /// Index into `fields`
    pub selected: usize,
    pub mode: InputMode,
    pub notice: Option<Notice>,
    /// One-line status shown in the footer
    pub status: Option<String>,
    pub autofilling: bool,
    pub should_quit: bool,
    tx: Sender<TaskEvent>,
    rx: Receiver<TaskEvent>,
}

impl App {
    pub fn new(data: WrappedData, config: Config) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            session: Session::new(data),
            config,
            fields: FormField::all(),
            selected: 0,
            mode: InputMode::Navigate,
            notice: None,
            status: None,
            autofilling: false,
            should_quit: false,
            tx,
            rx,
        }
    }

    pub fn data(&self) -> &WrappedData {
        self.session.data()
    }

    pub fn card(&self) -> Card {
        self.session.card()
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn selected_field(&self) -> FormField {
        self.fields[self.selected.min(self.fields.len() - 1)]
    }

    pub fn is_exporting(&self) -> bool {
        self.session.is_exporting()
    }

    /// Run one editor operation against the current record.
    fn edit(&mut self, f: impl FnOnce(&mut Editor<'_, &mut dyn FnMut(WrappedData)>)) {
        let current = self.session.data().clone();
        let session = &mut self.session;
        let mut apply = |next: WrappedData| session.apply_change(next);
        let mut editor = Editor::new(&current, &mut apply as &mut dyn FnMut(WrappedData));
        f(&mut editor);
    }

    // ========== Background results ==========

    /// Apply every finished background task.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.apply_event(event);
        }
    }

    pub fn apply_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::ImageDecoded(result) => {
                let ok = result.is_ok();
                self.edit(|editor| editor.image_decoded(result));
                if ok {
                    self.status = Some("Photo updated".to_string());
                }
            }
            TaskEvent::Exported(Ok(path)) => {
                self.status = Some(format!("Saved {}", path.display()));
            }
            TaskEvent::Exported(Err(e)) => {
                self.status = None;
                self.show_notice("Export failed", e.to_string());
            }
            TaskEvent::Autofilled(result) => {
                self.autofilling = false;
                match result {
                    Ok(patch) => {
                        self.session.merge_autofill(patch);
                        self.status = Some("Stats generated".to_string());
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Autofill failed");
                        self.status = None;
                        self.show_notice("Autofill failed", e.to_string());
                    }
                }
            }
        }
    }

    fn show_notice(&mut self, title: &str, message: String) {
        self.notice = Some(Notice {
            title: title.to_string(),
            message,
        });
    }

    // ========== Keyboard ==========

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.notice.take().is_some() {
            return;
        }

        match self.mode.clone() {
            InputMode::Navigate => self.handle_navigate_key(key),
            InputMode::EditField => self.handle_edit_key(key),
            InputMode::PhotoPath(buffer) => self.handle_prompt_key(key, buffer, true),
            InputMode::Persona(buffer) => self.handle_prompt_key(key, buffer, false),
        }
    }

    fn handle_navigate_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.selected = (self.selected + 1) % self.fields.len();
            }
            KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => {
                self.selected = (self.selected + self.fields.len() - 1) % self.fields.len();
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let next = self.data().language.next();
                self.edit(|editor| editor.update(Edit::Language(next)));
            }
            KeyCode::Left | KeyCode::Char('h') => {
                let previous = self.data().language.previous();
                self.edit(|editor| editor.update(Edit::Language(previous)));
            }
            KeyCode::Enter => match self.selected_field() {
                FormField::Language => {
                    let next = self.data().language.next();
                    self.edit(|editor| editor.update(Edit::Language(next)));
                }
                FormField::Photo => self.mode = InputMode::PhotoPath(String::new()),
                field if field.is_text() => self.mode = InputMode::EditField,
                _ => {}
            },
            KeyCode::Char('p') => {
                self.mode = InputMode::PhotoPath(String::new());
            }
            KeyCode::Char('a') => {
                if self.autofilling {
                    self.status = Some("Already generating...".to_string());
                } else {
                    self.mode = InputMode::Persona(String::new());
                }
            }
            KeyCode::Char('e') => self.start_export(),
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let field = self.selected_field();
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.mode = InputMode::Navigate;
            }
            KeyCode::Up | KeyCode::Down | KeyCode::Tab | KeyCode::BackTab => {
                self.mode = InputMode::Navigate;
                self.handle_navigate_key(key);
            }
            KeyCode::Backspace => {
                let mut value = field.value(self.data());
                value.pop();
                self.edit(|editor| field.set_text(editor, value));
            }
            KeyCode::Char(c) => {
                let mut value = field.value(self.data());
                value.push(c);
                self.edit(|editor| field.set_text(editor, value));
            }
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent, mut buffer: String, photo: bool) {
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Navigate;
                return;
            }
            KeyCode::Enter => {
                self.mode = InputMode::Navigate;
                if photo {
                    self.select_photo(buffer);
                } else {
                    self.start_autofill(buffer);
                }
                return;
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => {}
        }
        self.mode = if photo {
            InputMode::PhotoPath(buffer)
        } else {
            InputMode::Persona(buffer)
        };
    }

    // ========== Actions ==========

    fn select_photo(&mut self, path: String) {
        let path = path.trim();
        if path.is_empty() {
            return;
        }
        let path = expand_home(path);
        self.status = Some("Loading photo...".to_string());
        tasks::spawn_decode(self.tx.clone(), path);
    }

    fn start_autofill(&mut self, persona: String) {
        if persona.trim().is_empty() {
            self.status = Some("Describe a persona first".to_string());
            return;
        }
        self.autofilling = true;
        self.status = Some("Generating...".to_string());
        tasks::spawn_autofill(self.tx.clone(), persona, self.config.autofill.clone());
    }

    fn start_export(&mut self) {
        match self.session.prepare_export() {
            Ok(job) => {
                self.status = Some("Exporting...".to_string());
                tasks::spawn_export(self.tx.clone(), job, self.config.export.clone());
            }
            Err(Error::ExportInProgress) => {
                self.status = Some("Export already running".to_string());
            }
            Err(e) => self.show_notice("Export failed", e.to_string()),
        }
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use std::time::Duration;
    use wrapcard_core::{Language, StatsPatch};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn select(app: &mut App, field: FormField) {
        app.selected = app.fields().iter().position(|f| *f == field).unwrap();
    }

    fn recv(app: &mut App) {
        let event = app.rx.recv_timeout(Duration::from_secs(10)).unwrap();
        app.apply_event(event);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = App::new(WrappedData::sample(), Config::default());
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.selected_field(), FormField::Song(4));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected_field(), FormField::Language);
    }

    #[test]
    fn test_every_keystroke_updates_the_record() {
        let mut app = App::new(WrappedData::sample(), Config::default());
        select(&mut app, FormField::Year);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode, InputMode::EditField);

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.data().year, "202");
        type_text(&mut app, "4");
        assert_eq!(app.data().year, "2024");

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode, InputMode::Navigate);
        assert_eq!(app.card().text(wrapcard_core::card::TextRole::Year).unwrap().content, "2024");
    }

    #[test]
    fn test_ranked_slot_edit() {
        let mut app = App::new(WrappedData::sample(), Config::default());
        select(&mut app, FormField::Artist(4));
        app.handle_key(key(KeyCode::Enter));
        type_text(&mut app, "!");
        assert_eq!(app.data().top_artists[4], "NF!");
        assert_eq!(app.data().top_artists.len(), 5);
    }

    #[test]
    fn test_language_cycles() {
        let mut app = App::new(WrappedData::sample(), Config::default());
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.data().language, Language::En);
        app.handle_key(key(KeyCode::Left));
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.data().language, Language::Pt);
    }

    #[test]
    fn test_enter_edits_text_fields_only() {
        let mut app = App::new(WrappedData::sample(), Config::default());
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode, InputMode::Navigate);
        assert_eq!(app.data().language, Language::En);

        select(&mut app, FormField::Year);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode, InputMode::EditField);
    }

    #[test]
    fn test_export_rejected_while_running() {
        let mut app = App::new(WrappedData::sample(), Config::default());
        let _held = app.session.prepare_export().unwrap();

        app.handle_key(key(KeyCode::Char('e')));
        assert_eq!(app.status.as_deref(), Some("Export already running"));
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_failure_notice_is_dismissed_by_any_key() {
        let mut app = App::new(WrappedData::sample(), Config::default());
        app.apply_event(TaskEvent::Exported(Err(Error::Export("no usable font".into()))));
        assert_eq!(app.notice.as_ref().map(|n| n.title.as_str()), Some("Export failed"));

        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.notice.is_none());
        assert!(!app.should_quit, "dismissing key must not act");
    }

    #[test]
    fn test_autofill_result_merges_stats() {
        let mut app = App::new(WrappedData::sample(), Config::default());
        app.autofilling = true;
        app.apply_event(TaskEvent::Autofilled(Ok(StatsPatch {
            top_artists: vec!["A".into()],
            top_songs: vec!["B".into()],
            minutes_listened: "1.000".into(),
            top_genre: "Pop".into(),
        })));
        assert!(!app.autofilling);
        assert_eq!(app.data().top_artists, vec!["A"]);
        assert_eq!(app.data().year, "2023");
    }

    #[test]
    fn test_autofill_without_key_shows_notice() {
        let mut config = Config::default();
        config.autofill.api_key = None;
        config.autofill.api_key_env = "WRAPCARD_TUI_TEST_UNSET_KEY".to_string();
        let mut app = App::new(WrappedData::sample(), config);

        app.handle_key(key(KeyCode::Char('a')));
        type_text(&mut app, "jazz lover");
        app.handle_key(key(KeyCode::Enter));
        assert!(app.autofilling);

        recv(&mut app);
        assert!(!app.autofilling);
        assert!(app.notice.is_some());
        assert_eq!(app.data(), &WrappedData::sample());
    }

    #[test]
    fn test_photo_path_loads_image() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("p.png");
        // Smallest valid PNG: 1x1 transparent pixel.
        let png: [u8; 67] = [
            0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
            0x00, 0x1f, 0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78,
            0x9c, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00,
            0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
        ];
        std::fs::write(&path, png).unwrap();

        let mut app = App::new(WrappedData::sample(), Config::default());
        app.handle_key(key(KeyCode::Char('p')));
        type_text(&mut app, path.to_str().unwrap());
        app.handle_key(key(KeyCode::Enter));

        recv(&mut app);
        assert!(app.data().image_src.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_bad_photo_keeps_previous_value() {
        let mut app = App::new(WrappedData::sample(), Config::default());
        app.handle_key(key(KeyCode::Char('p')));
        type_text(&mut app, "/definitely/not/here.png");
        app.handle_key(key(KeyCode::Enter));

        let status_before = app.status.clone();
        recv(&mut app);
        assert_eq!(app.data().image_src, WrappedData::sample().image_src);
        assert!(app.notice.is_none());
        assert_eq!(app.status, status_before);
    }
}
