use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use parley_core::persistence::Persistence;
use parley_core::{
    EngineCommand, Notice, PendingMessage, ProcessingStep, SessionRegistry, UiEvent,
};
use parley_speech::Dictation;
use tokio::sync::mpsc;

use crate::event::{AppEvent, SpeechEvent};
use crate::layout::AppLayout;
use crate::theme::Theme;
use crate::widgets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Insert,
}

/// A one-line path prompt layered over the input box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    AttachFile,
    SpeechAudio,
}

pub struct App {
    input: String,
    cursor_position: usize,
    input_mode: InputMode,
    prompt: Option<Prompt>,
    prompt_buffer: String,
    attachments: Vec<PathBuf>,
    registry: Arc<Mutex<SessionRegistry>>,
    commands_tx: mpsc::UnboundedSender<EngineCommand>,
    speech_tx: Option<mpsc::UnboundedSender<PathBuf>>,
    persistence: Arc<dyn Persistence>,
    dictation: Dictation,
    pending: Option<PendingMessage>,
    step: Option<ProcessingStep>,
    notice: Option<Notice>,
    scroll_offset: usize,
    dark_mode: bool,
    show_sessions: bool,
    show_json: bool,
    pub should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(
        registry: Arc<Mutex<SessionRegistry>>,
        commands_tx: mpsc::UnboundedSender<EngineCommand>,
        speech_tx: Option<mpsc::UnboundedSender<PathBuf>>,
        persistence: Arc<dyn Persistence>,
        show_side_panels: bool,
    ) -> Self {
        let dark_mode = persistence.load_dark_mode();
        Self {
            input: String::new(),
            cursor_position: 0,
            input_mode: InputMode::Insert,
            prompt: None,
            prompt_buffer: String::new(),
            attachments: Vec::new(),
            registry,
            commands_tx,
            speech_tx,
            persistence,
            dictation: Dictation::new(),
            pending: None,
            step: None,
            notice: None,
            scroll_offset: 0,
            dark_mode,
            show_sessions: show_side_panels,
            show_json: show_side_panels,
            should_quit: false,
        }
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    #[must_use]
    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    #[must_use]
    pub fn prompt(&self) -> Option<Prompt> {
        self.prompt
    }

    #[must_use]
    pub fn prompt_buffer(&self) -> &str {
        &self.prompt_buffer
    }

    #[must_use]
    pub fn attachments(&self) -> &[PathBuf] {
        &self.attachments
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Mutex<SessionRegistry>> {
        &self.registry
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingMessage> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn step(&self) -> Option<ProcessingStep> {
        self.step
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    #[must_use]
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        Theme::for_mode(self.dark_mode)
    }

    #[must_use]
    pub fn show_sessions(&self) -> bool {
        self.show_sessions
    }

    #[must_use]
    pub fn show_json(&self) -> bool {
        self.show_json
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.dictation.is_listening()
    }

    #[must_use]
    pub fn speech_available(&self) -> bool {
        self.speech_tx.is_some()
    }

    /// An answer or pipeline stage is in flight; submits are gated off.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || self.step.is_some()
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
            AppEvent::MouseScroll(delta) => {
                if delta > 0 {
                    self.scroll_offset = self.scroll_offset.saturating_add(1);
                } else {
                    self.scroll_offset = self.scroll_offset.saturating_sub(1);
                }
            }
            AppEvent::Engine(engine_event) => self.handle_engine_event(engine_event),
            AppEvent::Speech(speech_event) => self.handle_speech_event(speech_event),
        }
    }

    pub fn handle_engine_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::SessionStarted(_) | UiEvent::Transcript => {
                self.scroll_offset = 0;
            }
            UiEvent::StructuredData => {}
            UiEvent::Step(step) => self.step = step,
            UiEvent::Pending(pending) => self.pending = pending,
            UiEvent::Notice(notice) => self.notice = Some(notice),
        }
    }

    fn handle_speech_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::Transcript(text) => {
                if let Some(merged) = self.dictation.apply(&text) {
                    self.cursor_position = merged.chars().count();
                    self.input = merged;
                }
            }
            SpeechEvent::Ended => self.dictation.stop(),
            SpeechEvent::Failed(reason) => {
                self.dictation.fail();
                self.notice = Some(Notice::error(format!("Dictation failed: {reason}")));
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // A fresh keypress dismisses the last notice.
        self.notice = None;

        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Insert => self.handle_insert_key(key),
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                self.prompt_buffer.clear();
            }
            KeyCode::Enter => self.confirm_prompt(),
            KeyCode::Backspace => {
                self.prompt_buffer.pop();
            }
            KeyCode::Char(c) => self.prompt_buffer.push(c),
            _ => {}
        }
    }

    fn confirm_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        let path = PathBuf::from(self.prompt_buffer.trim());
        self.prompt_buffer.clear();
        if path.as_os_str().is_empty() {
            return;
        }
        match prompt {
            Prompt::AttachFile => self.attachments.push(path),
            Prompt::SpeechAudio => {
                if let Some(tx) = &self.speech_tx {
                    self.dictation.start(&self.input);
                    if tx.send(path).is_err() {
                        self.dictation.fail();
                        self.notice = Some(Notice::error("Dictation is not available"));
                    }
                }
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('i') => self.input_mode = InputMode::Insert,
            KeyCode::Char('n') => {
                let _ = self.commands_tx.send(EngineCommand::NewChat);
            }
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Char('s') => self.show_sessions = !self.show_sessions,
            KeyCode::Char('d') => self.show_json = !self.show_json,
            KeyCode::Char('a') => self.prompt = Some(Prompt::AttachFile),
            KeyCode::Char('v') if self.speech_available() => {
                self.prompt = Some(Prompt::SpeechAudio);
            }
            KeyCode::Tab => self.switch_next_session(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_add(10);
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            KeyCode::End => self.scroll_offset = 0,
            _ => {}
        }
    }

    fn toggle_theme(&mut self) {
        self.dark_mode = !self.dark_mode;
        self.persistence.store_dark_mode(self.dark_mode);
    }

    fn switch_next_session(&mut self) {
        let mut registry = self.registry.lock().unwrap();
        let ids: Vec<_> = registry.sessions().iter().map(|s| s.id.clone()).collect();
        if ids.is_empty() {
            return;
        }
        let current = registry.active_id().cloned();
        let next_idx = current
            .and_then(|id| ids.iter().position(|other| *other == id))
            .map_or(0, |idx| (idx + 1) % ids.len());
        if let Err(e) = registry.switch(&ids[next_idx]) {
            tracing::error!(error = %e, "session switch failed");
        }
        drop(registry);
        self.scroll_offset = 0;
    }

    /// Returns the byte offset of the char at the given char index.
    fn byte_offset_of_char(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map_or(self.input.len(), |(i, _)| i)
    }

    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    fn handle_insert_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_input(),
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Backspace => {
                if self.cursor_position > 0 {
                    let byte_offset = self.byte_offset_of_char(self.cursor_position - 1);
                    self.input.remove(byte_offset);
                    self.cursor_position -= 1;
                }
            }
            KeyCode::Delete => {
                if self.cursor_position < self.char_count() {
                    let byte_offset = self.byte_offset_of_char(self.cursor_position);
                    self.input.remove(byte_offset);
                }
            }
            KeyCode::Left => {
                self.cursor_position = self.cursor_position.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.cursor_position < self.char_count() {
                    self.cursor_position += 1;
                }
            }
            KeyCode::Home => self.cursor_position = 0,
            KeyCode::End => self.cursor_position = self.char_count(),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                self.cursor_position = 0;
            }
            KeyCode::Char(c) => {
                let byte_offset = self.byte_offset_of_char(self.cursor_position);
                self.input.insert(byte_offset, c);
                self.cursor_position += 1;
            }
            _ => {}
        }
    }

    fn submit_input(&mut self) {
        if self.is_busy() {
            self.notice = Some(Notice::info("Still working on the previous request"));
            return;
        }
        let text = self.input.trim().to_string();
        let files = std::mem::take(&mut self.attachments);
        if text.is_empty() && files.is_empty() {
            return;
        }
        self.input.clear();
        self.cursor_position = 0;
        self.scroll_offset = 0;
        if self.dictation.is_listening() {
            self.dictation.stop();
        }
        let _ = self.commands_tx.send(EngineCommand::Submit { text, files });
    }

    pub fn draw(&self, frame: &mut ratatui::Frame) {
        let layout = AppLayout::compute(frame.area(), self.show_sessions, self.show_json);

        self.draw_header(frame, layout.header);
        widgets::sessions::render(self, frame, layout.sessions);
        widgets::chat::render(self, frame, layout.chat);
        widgets::json_panel::render(self, frame, layout.json_panel);
        widgets::input::render(self, frame, layout.input);
        widgets::status::render(self, frame, layout.status);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame, area: ratatui::layout::Rect) {
        use ratatui::text::{Line, Span};
        use ratatui::widgets::Paragraph;

        let theme = self.theme();

        let title = {
            let registry = self.registry.lock().unwrap();
            registry
                .active()
                .map_or_else(|| "No session".to_owned(), |s| s.title.clone())
        };
        let step = self
            .step
            .map(|s| format!(" | {}", s.label()))
            .unwrap_or_default();

        let text = format!(" Parley v{} | {title}{step}", env!("CARGO_PKG_VERSION"));
        let line = Line::from(Span::styled(text, theme.header));
        frame.render_widget(Paragraph::new(line).style(theme.header), area);
    }
}

#[cfg(test)]
mod tests {
    use parley_core::persistence::MemoryPersistence;
    use parley_core::{Response, SessionId};

    use super::*;

    struct Harness {
        app: App,
        commands_rx: mpsc::UnboundedReceiver<EngineCommand>,
        speech_rx: Option<mpsc::UnboundedReceiver<PathBuf>>,
        persistence: Arc<MemoryPersistence>,
    }

    fn make_app(speech: bool) -> Harness {
        let registry = Arc::new(Mutex::new(SessionRegistry::new()));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (speech_tx, speech_rx) = if speech {
            let (tx, rx) = mpsc::unbounded_channel();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };
        let persistence = Arc::new(MemoryPersistence::default());
        let app = App::new(
            registry,
            commands_tx,
            speech_tx,
            Arc::clone(&persistence) as Arc<dyn Persistence>,
            true,
        );
        Harness {
            app,
            commands_rx,
            speech_rx,
            persistence,
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn initial_state() {
        let h = make_app(false);
        assert!(h.app.input().is_empty());
        assert_eq!(h.app.input_mode(), InputMode::Insert);
        assert!(!h.app.should_quit);
        assert!(!h.app.is_busy());
        assert!(!h.app.speech_available());
    }

    #[test]
    fn ctrl_c_quits() {
        let mut h = make_app(false);
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        h.app.handle_event(AppEvent::Key(key));
        assert!(h.app.should_quit);
    }

    #[test]
    fn typing_updates_input_and_cursor() {
        let mut h = make_app(false);
        type_text(&mut h.app, "hi");
        assert_eq!(h.app.input(), "hi");
        assert_eq!(h.app.cursor_position(), 2);
    }

    #[test]
    fn enter_submits_text_and_attachments() {
        let mut h = make_app(false);
        type_text(&mut h.app, "what is covered?");
        press(&mut h.app, KeyCode::Esc);
        press(&mut h.app, KeyCode::Char('a'));
        type_text(&mut h.app, "/tmp/policy.pdf");
        press(&mut h.app, KeyCode::Enter);
        assert_eq!(h.app.attachments().len(), 1);

        press(&mut h.app, KeyCode::Char('i'));
        press(&mut h.app, KeyCode::Enter);

        match h.commands_rx.try_recv().unwrap() {
            EngineCommand::Submit { text, files } => {
                assert_eq!(text, "what is covered?");
                assert_eq!(files, vec![PathBuf::from("/tmp/policy.pdf")]);
            }
            EngineCommand::NewChat => panic!("expected submit"),
        }
        assert!(h.app.input().is_empty());
        assert!(h.app.attachments().is_empty());
    }

    #[test]
    fn submit_is_gated_while_busy() {
        let mut h = make_app(false);
        h.app
            .handle_engine_event(UiEvent::Pending(Some(PendingMessage::new("earlier"))));
        type_text(&mut h.app, "second question");
        press(&mut h.app, KeyCode::Enter);

        assert!(h.commands_rx.try_recv().is_err());
        // The input is preserved for after the answer lands.
        assert_eq!(h.app.input(), "second question");
        assert!(h.app.notice().is_some());
    }

    #[test]
    fn empty_submit_sends_nothing() {
        let mut h = make_app(false);
        press(&mut h.app, KeyCode::Enter);
        assert!(h.commands_rx.try_recv().is_err());
    }

    #[test]
    fn n_requests_new_chat() {
        let mut h = make_app(false);
        press(&mut h.app, KeyCode::Esc);
        press(&mut h.app, KeyCode::Char('n'));
        assert!(matches!(
            h.commands_rx.try_recv().unwrap(),
            EngineCommand::NewChat
        ));
    }

    #[test]
    fn theme_toggle_persists() {
        let mut h = make_app(false);
        assert!(!h.app.dark_mode());
        press(&mut h.app, KeyCode::Esc);
        press(&mut h.app, KeyCode::Char('t'));
        assert!(h.app.dark_mode());
        assert!(h.persistence.load_dark_mode());
    }

    #[test]
    fn tab_cycles_sessions_and_replaces_view() {
        let mut h = make_app(false);
        {
            let mut registry = h.app.registry().lock().unwrap();
            registry.adopt(SessionId::from("first"));
            registry.adopt(SessionId::from("second"));
            let first = SessionId::from("first");
            registry
                .append_message(&first, "old question", Response::Text("old answer".into()), None)
                .unwrap();
        }
        press(&mut h.app, KeyCode::Esc);
        press(&mut h.app, KeyCode::Tab);

        let registry = h.app.registry().lock().unwrap();
        let active = registry.active().unwrap();
        // "second" was adopted last so it sat at index 0; Tab moved to "first".
        assert_eq!(active.id.as_str(), "first");
        assert_eq!(active.messages.len(), 1);
    }

    #[test]
    fn v_is_inert_without_speech() {
        let mut h = make_app(false);
        press(&mut h.app, KeyCode::Esc);
        press(&mut h.app, KeyCode::Char('v'));
        assert!(h.app.prompt().is_none());
    }

    #[test]
    fn speech_prompt_starts_dictation_and_sends_path() {
        let mut h = make_app(true);
        type_text(&mut h.app, "Hello ");
        press(&mut h.app, KeyCode::Esc);
        press(&mut h.app, KeyCode::Char('v'));
        assert_eq!(h.app.prompt(), Some(Prompt::SpeechAudio));
        type_text(&mut h.app, "/tmp/clip.wav");
        press(&mut h.app, KeyCode::Enter);

        assert!(h.app.is_listening());
        assert_eq!(
            h.speech_rx.as_mut().unwrap().try_recv().unwrap(),
            PathBuf::from("/tmp/clip.wav")
        );

        h.app
            .handle_event(AppEvent::Speech(SpeechEvent::Transcript("world".into())));
        assert_eq!(h.app.input(), "Hello world");

        h.app.handle_event(AppEvent::Speech(SpeechEvent::Ended));
        assert!(!h.app.is_listening());
    }

    #[test]
    fn speech_failure_forces_idle_with_notice() {
        let mut h = make_app(true);
        press(&mut h.app, KeyCode::Esc);
        press(&mut h.app, KeyCode::Char('v'));
        type_text(&mut h.app, "/tmp/clip.wav");
        press(&mut h.app, KeyCode::Enter);

        h.app.handle_event(AppEvent::Speech(SpeechEvent::Failed(
            "permission denied".into(),
        )));
        assert!(!h.app.is_listening());
        assert!(h.app.notice().is_some());
    }

    #[test]
    fn engine_events_update_step_and_pending() {
        let mut h = make_app(false);
        h.app
            .handle_engine_event(UiEvent::Step(Some(ProcessingStep::Thinking)));
        assert_eq!(h.app.step(), Some(ProcessingStep::Thinking));
        assert!(h.app.is_busy());

        h.app.handle_engine_event(UiEvent::Step(None));
        assert!(!h.app.is_busy());
    }

    #[test]
    fn keypress_dismisses_notice() {
        let mut h = make_app(false);
        h.app
            .handle_engine_event(UiEvent::Notice(Notice::error("boom")));
        assert!(h.app.notice().is_some());
        press(&mut h.app, KeyCode::Char('x'));
        assert!(h.app.notice().is_none());
    }

    #[test]
    fn prompt_escape_cancels() {
        let mut h = make_app(false);
        press(&mut h.app, KeyCode::Esc);
        press(&mut h.app, KeyCode::Char('a'));
        type_text(&mut h.app, "/tmp/x");
        press(&mut h.app, KeyCode::Esc);
        assert!(h.app.prompt().is_none());
        assert!(h.app.attachments().is_empty());
    }

    #[test]
    fn panel_toggles() {
        let mut h = make_app(false);
        press(&mut h.app, KeyCode::Esc);
        assert!(h.app.show_sessions());
        press(&mut h.app, KeyCode::Char('s'));
        assert!(!h.app.show_sessions());
        press(&mut h.app, KeyCode::Char('d'));
        assert!(!h.app.show_json());
    }
}
