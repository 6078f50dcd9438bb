use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, TableState},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::browser;
use crate::clipboard::SystemClipboard;
use crate::config::{APP_TITLE, Config};
use crate::cue::{Cue, CuePlayer, ring_bell};
use crate::dispatch::{LookupDispatcher, LookupEvent, LookupOutcome};
use crate::error::Result;
use crate::form::MovieForm;
use crate::instance::ActivationTarget;
use crate::movie::{MovieBackend, MovieRecord, imdb_url};
use crate::ui::{
    render_compact_view, render_form_view, render_help, render_select_dialog, widgets,
};

/// Event loop iterations between clipboard polls (about one second)
const CLIPBOARD_POLL_TICKS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Form,
    SelectRecord,
    Help,
}

#[derive(Debug)]
pub enum AppMessage {
    Lookup(LookupEvent),
    /// Another launch asked this instance to come to the front
    Activate,
}

impl From<LookupEvent> for AppMessage {
    fn from(event: LookupEvent) -> Self {
        AppMessage::Lookup(event)
    }
}

/// Handle given to the instance coordinator; it can only ask for activation
pub struct AppActivator {
    tx: mpsc::UnboundedSender<AppMessage>,
}

impl ActivationTarget for AppActivator {
    fn activate(&self) {
        if self.tx.send(AppMessage::Activate).is_err() {
            debug!("Activation requested after the app stopped");
        }
    }
}

pub struct App {
    pub config: Config,
    pub running: bool,
    pub view: View,
    pub previous_view: View,
    pub accent: Color,

    pub form: MovieForm,
    pub candidates: Vec<MovieRecord>,
    pub candidates_state: TableState,

    pub status: String,
    pub pending: usize,
    pub minimized: bool,
    ticks: u64,
    last_clipboard: Option<String>,

    pub msg_tx: mpsc::UnboundedSender<AppMessage>,
    pub msg_rx: mpsc::UnboundedReceiver<AppMessage>,

    dispatcher: LookupDispatcher,
    clipboard: Option<SystemClipboard>,
    cues: CuePlayer,
}

impl App {
    pub fn new(
        config: Config,
        backend: Arc<dyn MovieBackend + Send + Sync>,
        mut clipboard: Option<SystemClipboard>,
    ) -> Self {
        let accent = widgets::parse_accent_color(&config.ui.accent_color);
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let dispatcher = LookupDispatcher::spawn(backend, msg_tx.clone());
        let cues = CuePlayer::new(config.ui.audible_cues);

        // Only react to clipboard changes made after startup
        let last_clipboard = clipboard.as_mut().and_then(|c| c.text().ok());

        let status = if config.lookup.api_key.is_empty() {
            "No OMDb API key configured (lookup.api_key in config.toml)".to_string()
        } else {
            "Type a title or paste an IMDb link".to_string()
        };

        Self {
            config,
            running: true,
            view: View::Form,
            previous_view: View::Form,
            accent,

            form: MovieForm::new(),
            candidates: Vec::new(),
            candidates_state: TableState::default(),

            status,
            pending: 0,
            minimized: false,
            ticks: 0,
            last_clipboard,

            msg_tx,
            msg_rx,

            dispatcher,
            clipboard,
            cues,
        }
    }

    pub fn activator(&self) -> Arc<dyn ActivationTarget> {
        Arc::new(AppActivator {
            tx: self.msg_tx.clone(),
        })
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        while self.running {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
            self.process_messages();
            self.tick();
        }
        Ok(())
    }

    fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks % CLIPBOARD_POLL_TICKS == 0 {
            self.poll_clipboard();
        }
    }

    pub fn process_messages(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.handle_message(msg);
        }
    }

    pub fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Lookup(LookupEvent::Started { id }) => {
                debug!(id, "Lookup started");
                self.status = "Looking up movie...".to_string();
            }
            AppMessage::Lookup(LookupEvent::Finished { id, outcome }) => {
                debug!(id, "Lookup result received");
                self.handle_lookup_finished(outcome);
            }
            AppMessage::Activate => self.activate(),
        }
    }

    fn handle_lookup_finished(&mut self, outcome: LookupOutcome) {
        self.pending = self.pending.saturating_sub(1);

        let records = match outcome {
            LookupOutcome::Failed => {
                self.status = "Lookup failed (details in the log)".to_string();
                self.cues.play(Cue::Failure);
                return;
            }
            LookupOutcome::Records(records) => records,
        };

        match records.len() {
            0 => {
                self.status = "No matching movies found".to_string();
                self.cues.play(Cue::Failure);
            }
            1 => {
                self.cues.play(Cue::Found);
                self.apply_record(&records[0]);
            }
            n => {
                self.cues.play(Cue::Choose);
                self.status = format!("{} matches, choose one", n);
                self.candidates = records;
                self.candidates_state.select(Some(0));
                if self.view != View::SelectRecord {
                    self.previous_view = self.view;
                }
                self.view = View::SelectRecord;
            }
        }
    }

    fn apply_record(&mut self, record: &MovieRecord) {
        info!("{} ({:?})", record.title, record.year);
        self.form.apply_record(record);
        if self.form.folder().is_empty() {
            self.status = format!("{}: no release year known", record.title);
        } else {
            self.copy_folder();
        }
    }

    /// Bring the UI back from compact mode and grab the user's attention
    pub fn activate(&mut self) {
        info!("Activated by another launch");
        self.minimized = false;
        if self.view == View::Help {
            self.view = self.previous_view;
        }
        self.status = format!("{} is already running", APP_TITLE);

        if let Err(e) = crossterm::execute!(io::stdout(), crossterm::terminal::SetTitle(APP_TITLE))
        {
            debug!("Failed to set terminal title: {}", e);
        }
        ring_bell();
    }

    pub fn submit_lookup(&mut self) {
        let request = match self.form.lookup_request() {
            Ok(Some(request)) => request,
            Ok(None) => return,
            Err(e) => {
                warn!(class = e.class(), error = %e, "Lookup not submitted");
                self.status = e.to_string();
                return;
            }
        };

        match self.dispatcher.submit(request) {
            Ok(_) => {
                self.pending += 1;
                if self.pending > 1 {
                    self.status = format!("{} lookups queued", self.pending);
                }
            }
            Err(e) => {
                warn!(class = e.class(), error = %e, "Lookup not submitted");
                self.status = e.to_string();
            }
        }
    }

    pub fn copy_folder(&mut self) {
        let folder = self.form.folder().to_string();
        if folder.is_empty() {
            return;
        }

        let Some(clipboard) = self.clipboard.as_mut() else {
            self.status = folder;
            return;
        };

        match clipboard.set_text(&folder) {
            Ok(()) => {
                debug!(folder = %folder, "Copied folder name");
                self.status = format!("Copied: {}", folder);
                self.last_clipboard = Some(folder);
            }
            Err(e) => {
                warn!("Failed to copy folder name: {}", e);
                self.status = e.to_string();
            }
        }
    }

    pub fn reset(&mut self) {
        self.form.reset();
        self.status.clear();
    }

    fn poll_clipboard(&mut self) {
        if !self.config.ui.watch_clipboard || self.view != View::Form {
            return;
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            return;
        };
        let Ok(text) = clipboard.text() else {
            return;
        };
        if self.last_clipboard.as_deref() == Some(text.as_str()) {
            return;
        }

        let accepted = self.form.accept_clipboard(&text);
        self.last_clipboard = Some(text);
        if accepted {
            debug!(id = %self.form.imdb, "IMDb id detected in clipboard");
            self.submit_lookup();
        }
    }

    fn paste(&mut self, text: &str) {
        if self.form.paste(text) {
            self.submit_lookup();
        }
    }

    fn paste_from_clipboard(&mut self) {
        let Some(clipboard) = self.clipboard.as_mut() else {
            self.status = "Clipboard unavailable".to_string();
            return;
        };
        match clipboard.text() {
            Ok(text) => {
                self.last_clipboard = Some(text.clone());
                self.paste(&text);
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        if self.minimized {
            render_compact_view(frame, frame.area(), self.form.folder(), self.accent);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let main_area = chunks[0];
        let status_area = chunks[1];
        let help_area = chunks[2];

        render_form_view(frame, main_area, &self.form, self.accent);
        self.render_status(frame, status_area);

        let hints: &[(&str, &str)] = match self.view {
            View::Form => &[
                ("Enter", "look up"),
                ("Ctrl+Y", "copy"),
                ("Ctrl+R", "reset"),
                ("F1", "help"),
                ("Esc", "quit"),
            ],
            View::SelectRecord => &[
                ("j/k", "navigate"),
                ("Enter", "select"),
                ("o", "open IMDb"),
                ("Esc", "cancel"),
            ],
            View::Help => &[("Esc", "close")],
        };

        match self.view {
            View::Form => {}
            View::SelectRecord => render_select_dialog(
                frame,
                &self.candidates,
                &mut self.candidates_state,
                self.accent,
            ),
            View::Help => render_help(frame, self.accent),
        }

        frame.render_widget(widgets::help_bar(hints), help_area);
    }

    fn render_status(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let mut spans = Vec::new();
        if self.pending > 0 {
            spans.push(Span::styled(
                format!("{} ", widgets::spinner(self.ticks)),
                Style::default().fg(self.accent),
            ));
        }
        spans.push(Span::styled(
            self.status.as_str(),
            Style::default().fg(Color::Gray),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        return Ok(());
                    }
                    self.handle_key(key);
                }
                Event::Paste(text) => {
                    if self.view == View::Form && !self.minimized {
                        self.paste(&text);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('c') {
            self.running = false;
            return;
        }

        if self.minimized {
            if (ctrl && key.code == KeyCode::Char('n')) || key.code == KeyCode::Enter {
                self.minimized = false;
            }
            return;
        }

        if key.code == KeyCode::F(1) {
            self.toggle_help();
            return;
        }

        match self.view {
            View::Form => self.handle_form_input(key),
            View::SelectRecord => self.handle_select_input(key.code),
            View::Help => self.handle_help_input(key.code),
        }
    }

    fn handle_form_input(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl {
            match key.code {
                KeyCode::Char('g') => self.submit_lookup(),
                KeyCode::Char('y') => self.copy_folder(),
                KeyCode::Char('r') => self.reset(),
                KeyCode::Char('u') => self.form.clear_field(),
                KeyCode::Char('v') => self.paste_from_clipboard(),
                KeyCode::Char('n') => self.minimized = true,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Enter => self.submit_lookup(),
            KeyCode::Tab | KeyCode::Down => self.form.focus = self.form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus = self.form.focus.prev(),
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Char(c) => self.form.input_char(c),
            _ => {}
        }
    }

    fn handle_select_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Enter => self.choose_candidate(),
            KeyCode::Char('o') => self.open_candidate_page(),
            KeyCode::Esc | KeyCode::Char('q') => self.close_select(),
            _ => {}
        }
    }

    fn handle_help_input(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Esc | KeyCode::Char('q')) {
            self.toggle_help();
        }
    }

    fn toggle_help(&mut self) {
        if self.view == View::Help {
            self.view = self.previous_view;
        } else {
            self.previous_view = self.view;
            self.view = View::Help;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.candidates.is_empty() {
            return;
        }
        let len = self.candidates.len() as isize;
        let current = self.candidates_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.candidates_state.select(Some(next));
    }

    pub fn choose_candidate(&mut self) {
        let chosen = self
            .candidates_state
            .selected()
            .and_then(|i| self.candidates.get(i))
            .cloned();

        self.close_select();
        if let Some(record) = chosen {
            self.apply_record(&record);
        }
    }

    pub fn close_select(&mut self) {
        self.candidates.clear();
        self.candidates_state.select(None);
        self.view = View::Form;
        if self.status.ends_with("choose one") {
            self.status.clear();
        }
    }

    fn open_candidate_page(&mut self) {
        let Some(record) = self
            .candidates_state
            .selected()
            .and_then(|i| self.candidates.get(i))
        else {
            return;
        };

        if let Err(e) = browser::open_url(&imdb_url(&record.external_id)) {
            warn!("{}", e);
            self.status = e.to_string();
        }
    }

    #[cfg(test)]
    pub fn last_cue(&self) -> Option<Cue> {
        self.cues.last()
    }
}

pub fn init_terminal() -> io::Result<DefaultTerminal> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(
        io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableBracketedPaste,
        crossterm::terminal::SetTitle(APP_TITLE)
    )?;
    Ok(ratatui::init())
}

pub fn restore_terminal() -> io::Result<()> {
    crossterm::execute!(io::stdout(), crossterm::event::DisableBracketedPaste)?;
    ratatui::restore();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Field;
    use crate::movie::testing::{MockBackend, catalogue};

    fn test_app() -> App {
        let mut config = Config::default();
        config.ui.audible_cues = false;
        config.ui.watch_clipboard = false;
        let backend = Arc::new(MockBackend::with_movies(catalogue()));
        App::new(config, backend, None)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    async fn settle(app: &mut App) {
        for _ in 0..50 {
            app.process_messages();
            if app.pending == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("lookup did not finish");
    }

    #[tokio::test]
    async fn test_title_search_with_several_matches_asks_user() {
        let mut app = test_app();
        type_text(&mut app, "Inception");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.pending, 1);

        settle(&mut app).await;
        assert_eq!(app.view, View::SelectRecord);
        assert_eq!(app.candidates.len(), 3);
        assert_eq!(app.last_cue(), Some(Cue::Choose));

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.view, View::Form);
        assert!(app.candidates.is_empty());
        assert_eq!(app.form.folder(), "Inception (2010) [imdbid-1375666]");
    }

    #[tokio::test]
    async fn test_cancelled_selection_applies_nothing() {
        let mut app = test_app();
        type_text(&mut app, "Inception");
        app.handle_key(key(KeyCode::Enter));
        settle(&mut app).await;

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.view, View::Form);
        assert_eq!(app.form.folder(), "");
        assert!(app.running);
    }

    #[tokio::test]
    async fn test_pasted_id_is_looked_up_and_applied() {
        let mut app = test_app();
        app.form.focus = Field::Imdb;
        app.paste("https://www.imdb.com/title/tt0111161/");
        assert_eq!(app.pending, 1);

        settle(&mut app).await;
        assert_eq!(app.view, View::Form);
        assert_eq!(app.last_cue(), Some(Cue::Found));
        assert_eq!(
            app.form.folder(),
            "The Shawshank Redemption (1994) [imdbid-0111161]"
        );
        assert_eq!(app.form.title, "The Shawshank Redemption");
        assert_eq!(app.form.year, "1994");
    }

    #[tokio::test]
    async fn test_zero_matches_signals_failure() {
        let mut app = test_app();
        type_text(&mut app, "Nothing Like This");
        app.handle_key(ctrl('g'));

        settle(&mut app).await;
        assert_eq!(app.view, View::Form);
        assert_eq!(app.last_cue(), Some(Cue::Failure));
        assert_eq!(app.form.folder(), "");
    }

    #[tokio::test]
    async fn test_backend_failure_signals_failure() {
        let mut config = Config::default();
        config.ui.audible_cues = false;
        let mut app = App::new(config, Arc::new(MockBackend::failing()), None);
        type_text(&mut app, "Inception");
        app.handle_key(key(KeyCode::Enter));

        settle(&mut app).await;
        assert_eq!(app.last_cue(), Some(Cue::Failure));
        assert_eq!(app.form.folder(), "");
        assert!(app.running);
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_submitted() {
        let mut app = test_app();
        app.form.focus = Field::Imdb;
        type_text(&mut app, "tt12x");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.pending, 0);
        assert!(app.status.contains("Invalid IMDb id"));
    }

    #[tokio::test]
    async fn test_activation_restores_minimized_ui() {
        let mut app = test_app();
        app.handle_key(ctrl('n'));
        assert!(app.minimized);

        app.activator().activate();
        app.process_messages();
        assert!(!app.minimized);
    }

    #[tokio::test]
    async fn test_reset_clears_form() {
        let mut app = test_app();
        type_text(&mut app, "Heat");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "1995");
        assert_eq!(app.form.folder(), "Heat (1995)");

        app.handle_key(ctrl('r'));
        assert_eq!(app.form.folder(), "");
        assert_eq!(app.form.title, "");
    }

    #[tokio::test]
    async fn test_help_toggles_back_to_previous_view() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::F(1)));
        assert_eq!(app.view, View::Help);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.view, View::Form);
        assert!(app.running);
    }
}
