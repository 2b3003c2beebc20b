use std::io;
use std::io::Stdout;
use std::sync::Arc;

use anyhow::Result;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use futures_util::StreamExt;
use ratatui::prelude::*;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use slide_core::Action;
use slide_core::GenerationInput;
use slide_core::GenerationSession;
use slide_core::Phase;
use slide_core::SlidesBackend;
use slide_protocol::GenerateRequest;
use slide_protocol::Slide;
use slide_protocol::SlideContent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio::time::Duration;
use tracing::debug;
use tracing::info;

use crate::app_event_sender::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::progress::AgentProgress;
use crate::render::editable_fields;
use crate::render::render_slide;
use crate::render::EditorKey;
use crate::render::FieldId;
use crate::render::RenderContext;
use crate::render::TextEditor;
use crate::status_bar::StatusBar;
use crate::theme::ThemeRegistry;

const TICK: Duration = Duration::from_millis(120);
const MAX_SLIDES: u32 = 20;

/// Slides are drawn at 16:9 on cells about twice as tall as wide.
const SLIDE_ASPECT: (u16, u16) = (32, 9);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Compose,
    Generating,
    Viewer,
}

/// Where the app opens.
pub enum StartScreen {
    Compose { text: Option<String> },
    /// Starts this run right away.
    Generate(GenerationInput),
    /// Shows the presentation already loaded into the session.
    Viewer,
}

#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Whether slide fields can be edited in the viewer.
    pub editable: bool,
    /// Whether the user can go back to the compose screen.
    pub allow_compose: bool,
    pub default_slide_count: u32,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            editable: true,
            allow_compose: true,
            default_slide_count: slide_common::DEFAULT_SLIDE_COUNT,
        }
    }
}

struct ComposeForm {
    editor: TextEditor,
    slide_count: u32,
}

pub struct App {
    session: GenerationSession,
    registry: ThemeRegistry,
    options: AppOptions,
    events: AppEventSender,
    screen: Screen,
    compose: ComposeForm,
    selected: Option<FieldId>,
    editor: Option<TextEditor>,
    /// Slide position the open editor writes to.
    editing_at: usize,
    /// Keep the newest streamed slide in view.
    follow: bool,
    generation: Option<JoinHandle<()>>,
    notice: Option<String>,
    tick: usize,
    running: bool,
}

impl App {
    pub fn new(
        session: GenerationSession,
        registry: ThemeRegistry,
        options: AppOptions,
        events: AppEventSender,
    ) -> Self {
        let compose = ComposeForm {
            editor: TextEditor::new(FieldId::Body, None),
            slide_count: options.default_slide_count.clamp(1, MAX_SLIDES),
        };
        Self {
            session,
            registry,
            options,
            events,
            screen: Screen::Compose,
            compose,
            selected: None,
            editor: None,
            editing_at: 0,
            follow: true,
            generation: None,
            notice: None,
            tick: 0,
            running: true,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> &GenerationSession {
        &self.session
    }

    pub fn into_session(self) -> GenerationSession {
        self.session
    }

    pub fn selected(&self) -> Option<FieldId> {
        self.selected
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn open(&mut self, start: StartScreen) {
        match start {
            StartScreen::Compose { text } => {
                self.compose.editor = TextEditor::new(FieldId::Body, text.as_deref());
                self.screen = Screen::Compose;
            }
            StartScreen::Generate(input) => self.start_generation(input),
            StartScreen::Viewer => self.screen = Screen::Viewer,
        }
    }

    fn theme_name(&self) -> &str {
        self.session.state().theme()
    }

    fn cycle_theme(&mut self) {
        let next = self.registry.next_theme_name(self.theme_name()).to_string();
        debug!("switching theme to {next}");
        let _ = self.session.dispatch(Action::SetTheme(next));
    }

    fn compose_request(&self) -> Option<GenerationInput> {
        let text = self.compose.editor.value().trim();
        if text.is_empty() {
            return None;
        }
        Some(GenerationInput::Text(GenerateRequest {
            text: text.to_string(),
            slide_count: Some(self.compose.slide_count),
            title: None,
            theme: Some(self.theme_name().to_string()),
        }))
    }

    /// Starts a run and forwards its stream to the app loop from a task.
    fn start_generation(&mut self, input: GenerationInput) {
        let start = Action::Start {
            theme: input.theme(),
            requested_slide_count: input.slide_count(),
        };
        if let Err(err) = self.session.dispatch(start) {
            self.notice = Some(err.to_string());
            return;
        }
        self.screen = Screen::Generating;
        self.follow = true;
        self.selected = None;
        self.editor = None;
        self.notice = None;

        let backend: Arc<dyn SlidesBackend> = self.session.backend();
        let events = self.events.clone();
        self.generation = Some(tokio::spawn(async move {
            match backend.open_generation(&input).await {
                Ok(mut stream) => loop {
                    let item = stream.next().await;
                    let more = matches!(item, Some(Ok(_)));
                    events.send(AppEvent::Generation(item));
                    if !more {
                        break;
                    }
                },
                Err(err) => events.send(AppEvent::Generation(Some(Err(err)))),
            }
        }));
    }

    fn cancel_generation(&mut self) {
        if let Some(task) = self.generation.take() {
            task.abort();
        }
        if self.session.state().is_generating() {
            info!("generation cancelled by user");
            let _ = self
                .session
                .dispatch(Action::TransportFailed("generation cancelled".to_string()));
        }
    }

    pub fn on_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Generation(item) => {
                let more = self.session.apply_stream_item(item);
                if !more {
                    self.generation = None;
                }
                let state = self.session.state();
                if state.phase() == Phase::Completed && state.presentation().is_some() {
                    if self.screen == Screen::Generating {
                        self.screen = Screen::Viewer;
                        self.selected = None;
                    }
                } else if self.follow && state.is_generating() {
                    let last = state.total_slides().saturating_sub(1);
                    if last != state.current_slide_index() && self.editor.is_none() {
                        let _ = self.session.dispatch(Action::SetCurrentSlide(last));
                    }
                }
            }
            AppEvent::Saved(result) => {
                if result.is_ok() {
                    self.notice = Some("Saved".to_string());
                }
                self.session.finish_save(result);
            }
        }
    }

    fn commit(&mut self, position: usize, field: FieldId, value: String) {
        let patch = match self.session.state().slides().get(position) {
            Some(slide) => field.patch(slide, value),
            None => return,
        };
        match self.session.edit(position, &patch) {
            Ok((_, Some(save))) => {
                let backend = self.session.backend();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = backend
                        .update_slide(save.presentation_id, save.index, &save.patch)
                        .await;
                    events.send(AppEvent::Saved(result));
                });
            }
            Ok((_, None)) => {}
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    fn current_fields(&self) -> Vec<FieldId> {
        self.session
            .state()
            .current_slide()
            .map(editable_fields)
            .unwrap_or_default()
    }

    fn move_selection(&mut self, forward: bool) {
        let fields = self.current_fields();
        if fields.is_empty() {
            self.selected = None;
            return;
        }
        let position = self
            .selected
            .and_then(|field| fields.iter().position(|f| *f == field));
        let next = match (position, forward) {
            (None, true) => 0,
            (None, false) => fields.len() - 1,
            (Some(i), true) => (i + 1) % fields.len(),
            (Some(i), false) => (i + fields.len() - 1) % fields.len(),
        };
        self.selected = Some(fields[next]);
    }

    fn open_editor(&mut self) {
        let state = self.session.state();
        let (Some(field), Some(slide)) = (self.selected, state.current_slide()) else {
            return;
        };
        let position = state.current_slide_index();
        self.editor = Some(
            TextEditor::new(field, field.value(slide)).on_commit(move |field, value| {
                debug!("slide {position}: {} set to {} chars", field.label(), value.len());
            }),
        );
        self.editing_at = position;
    }

    fn go_to(&mut self, action: Action) {
        let _ = self.session.dispatch(action);
        self.selected = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.cancel_generation();
            self.running = false;
            return;
        }
        match self.screen {
            Screen::Compose => self.handle_compose_key(key),
            Screen::Generating | Screen::Viewer => {
                if self.editor.is_some() {
                    self.handle_editor_key(key);
                } else {
                    self.handle_slide_key(key);
                }
            }
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter if !key.modifiers.contains(KeyModifiers::ALT) => {
                if let Some(input) = self.compose_request() {
                    self.start_generation(input);
                } else {
                    self.notice = Some("Describe your presentation first".to_string());
                }
            }
            KeyCode::Tab => self.cycle_theme(),
            KeyCode::Up => self.compose.slide_count = (self.compose.slide_count + 1).min(MAX_SLIDES),
            KeyCode::Down => self.compose.slide_count = self.compose.slide_count.saturating_sub(1).max(1),
            KeyCode::Esc => self.running = false,
            _ => {
                self.compose.editor.handle_key(key);
            }
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        match editor.handle_key(key) {
            EditorKey::Blur => {
                // Applied before the next frame or stream event.
                if let Some(editor) = self.editor.take() {
                    let field = editor.field();
                    if let Some(value) = editor.blur() {
                        self.commit(self.editing_at, field, value);
                    }
                }
                match key.code {
                    KeyCode::Tab => self.move_selection(true),
                    KeyCode::BackTab => self.move_selection(false),
                    _ => {}
                }
            }
            EditorKey::Cancel => self.editor = None,
            EditorKey::Edited | EditorKey::Ignored => {}
        }
    }

    fn handle_slide_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Right | KeyCode::Char('l') => {
                self.follow = false;
                self.go_to(Action::NextSlide);
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.follow = false;
                self.go_to(Action::PreviousSlide);
            }
            KeyCode::Home => {
                self.follow = false;
                self.go_to(Action::SetCurrentSlide(0));
            }
            KeyCode::End => {
                self.follow = true;
                let last = self.session.state().total_slides().saturating_sub(1);
                self.go_to(Action::SetCurrentSlide(last));
            }
            KeyCode::Tab if self.options.editable => self.move_selection(true),
            KeyCode::BackTab if self.options.editable => self.move_selection(false),
            KeyCode::Enter | KeyCode::Char('e') if self.options.editable => {
                if self.selected.is_none() {
                    self.move_selection(true);
                }
                self.open_editor();
            }
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Char('n') if self.options.allow_compose && !self.session.state().is_generating() => {
                let _ = self.session.dispatch(Action::Reset);
                self.selected = None;
                self.notice = None;
                self.screen = Screen::Compose;
            }
            KeyCode::Esc if self.selected.is_some() => self.selected = None,
            KeyCode::Esc if self.session.state().is_generating() => self.cancel_generation(),
            KeyCode::Esc | KeyCode::Char('q') => self.running = false,
            _ => {}
        }
    }

    fn status(&self) -> (String, bool) {
        let state = self.session.state();
        if let Some(error) = state.error() {
            return (error.to_string(), true);
        }
        if state.is_saving() {
            return ("Saving...".to_string(), false);
        }
        if let Some(notice) = &self.notice {
            return (notice.clone(), false);
        }
        let text = match self.screen {
            Screen::Compose => "Ready".to_string(),
            _ if state.total_slides() == 0 => "No slides yet".to_string(),
            _ => format!(
                "Slide {} of {}",
                state.current_slide_index() + 1,
                state.total_slides()
            ),
        };
        (text, false)
    }

    fn mode(&self) -> &'static str {
        match (self.screen, self.editor.is_some()) {
            (_, true) => "EDIT",
            (Screen::Compose, _) => "COMPOSE",
            (Screen::Generating, _) => "GENERATING",
            (Screen::Viewer, _) => "VIEW",
        }
    }

    fn hints(&self) -> &'static str {
        if self.editor.is_some() {
            return "Enter/Tab save  Esc cancel  Alt+Enter newline";
        }
        match self.screen {
            Screen::Compose => "Enter generate  Tab theme  ↑/↓ slides  Esc quit",
            Screen::Generating => "←/→ slides  Tab field  Enter edit  t theme  Esc stop",
            Screen::Viewer if self.options.editable => {
                "←/→ slides  Tab field  Enter edit  t theme  n new  q quit"
            }
            Screen::Viewer => "←/→ slides  t theme  q quit",
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let [body, status_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).areas(frame.area());
        match self.screen {
            Screen::Compose => self.draw_compose(frame, body),
            Screen::Generating => {
                let [progress, preview] =
                    Layout::horizontal([Constraint::Percentage(38), Constraint::Fill(1)])
                        .areas(body);
                frame.render_widget(AgentProgress::new(self.session.state(), self.tick), progress);
                self.draw_slide(frame.buffer_mut(), preview);
            }
            Screen::Viewer => {
                let [header, slide] =
                    Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(body);
                let title = self
                    .session
                    .state()
                    .presentation()
                    .map(|p| p.title.as_str())
                    .filter(|t| !t.is_empty())
                    .unwrap_or("Untitled presentation");
                frame.render_widget(Line::from(title).bold().centered(), header);
                self.draw_slide(frame.buffer_mut(), slide);
            }
        }

        let (status, is_error) = self.status();
        let theme = &self.registry.resolve_theme(self.theme_name()).display_name;
        frame.render_widget(
            StatusBar::new(self.mode(), &status, self.hints())
                .theme(theme)
                .error(is_error),
            status_area,
        );
    }

    fn draw_compose(&self, frame: &mut Frame, area: Rect) {
        let [input_area, side] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Fill(1)]).areas(area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" What should the presentation be about? ");
        let inner = block.inner(input_area);
        frame.render_widget(block, input_area);
        let editor = &self.compose.editor;
        let (rows, (row, col)) = editor.rows(inner.width);
        let lines: Vec<Line> = rows.into_iter().map(Line::from).collect();
        frame.render_widget(Paragraph::new(lines), inner);
        if row < inner.height {
            frame.set_cursor_position((inner.x + col, inner.y + row));
        }

        let [settings, preview] =
            Layout::vertical([Constraint::Length(4), Constraint::Fill(1)]).areas(side);
        let theme = self.registry.resolve_theme(self.theme_name());
        let settings_text = vec![
            Line::from(vec![
                "Theme: ".into(),
                Span::styled(theme.display_name.clone(), Style::default().bold()),
                format!("  {}", theme.description).dim(),
            ]),
            Line::from(vec![
                "Slides: ".into(),
                Span::styled(self.compose.slide_count.to_string(), Style::default().bold()),
            ]),
        ];
        frame.render_widget(
            Paragraph::new(settings_text).block(Block::default().borders(Borders::ALL)),
            settings,
        );
        let sample = Slide::new(
            1,
            SlideContent::Title {
                title: Some(theme.display_name.clone()),
                subtitle: Some(theme.description.clone()),
            },
        );
        let ctx = RenderContext::new(theme);
        render_slide(
            &self.registry,
            self.theme_name(),
            &sample,
            &ctx,
            fit_slide(preview),
            frame.buffer_mut(),
        );
    }

    fn draw_slide(&self, buf: &mut Buffer, area: Rect) {
        let state = self.session.state();
        let Some(slide) = state.current_slide() else {
            let text = if state.is_generating() {
                "Waiting for the first slide..."
            } else {
                "No slides"
            };
            Paragraph::new(Line::from(text).dim().centered())
                .render(Rect::new(area.x, area.y + area.height / 2, area.width, 1), buf);
            return;
        };
        let theme = self.registry.resolve_theme(self.theme_name());
        let ctx = RenderContext::new(theme)
            .editable(self.options.editable)
            .selected(self.selected, self.editor.as_ref());
        render_slide(
            &self.registry,
            self.theme_name(),
            slide,
            &ctx,
            fit_slide(area),
            buf,
        );
    }

    /// Runs the app until the user quits, multiplexing terminal input,
    /// stream events and save results on this task.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        mut rx: UnboundedReceiver<AppEvent>,
    ) -> Result<()> {
        let mut input = EventStream::new();
        let mut ticker = interval(TICK);
        while self.running {
            terminal.draw(|f| self.draw(f))?;
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick = self.tick.wrapping_add(1);
                }
                Some(event) = rx.recv() => self.on_app_event(event),
                maybe_event = input.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err.into()),
                    None => self.running = false,
                },
            }
        }
        self.cancel_generation();
        Ok(())
    }
}

/// The largest 16:9 slide that fits in `area`, centered.
pub fn fit_slide(area: Rect) -> Rect {
    let (aw, ah) = (SLIDE_ASPECT.0 as u32, SLIDE_ASPECT.1 as u32);
    let width = (area.width as u32).min(area.height as u32 * aw / ah) as u16;
    let height = ((width as u32 * ah / aw) as u16).min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Sets up the terminal, runs the app and restores the terminal even when
/// the app fails. Returns the session so callers can use its final state.
pub async fn run_app(
    session: GenerationSession,
    registry: ThemeRegistry,
    options: AppOptions,
    start: StartScreen,
) -> Result<GenerationSession> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut app = App::new(session, registry, options, AppEventSender::new(tx));
    app.open(start);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal, rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.map(|()| app.into_session())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ratatui::backend::TestBackend;
    use serde_json::json;
    use slide_client::ClientError;
    use slide_client::GenerationStream;
    use slide_protocol::Completion;
    use slide_protocol::GenerationEvent;
    use slide_protocol::Presentation;
    use slide_protocol::SlidePatch;
    use slide_protocol::ToolCall;

    /// Backend for tests that never reach the network.
    struct Offline;

    #[async_trait]
    impl SlidesBackend for Offline {
        async fn open_generation(
            &self,
            _input: &GenerationInput,
        ) -> std::result::Result<GenerationStream, ClientError> {
            Err(ClientError::Http {
                status: 503,
                detail: "offline".into(),
            })
        }

        async fn get_presentation(&self, _id: i64) -> std::result::Result<Presentation, ClientError> {
            Err(ClientError::Http {
                status: 404,
                detail: "offline".into(),
            })
        }

        async fn update_slide(
            &self,
            _presentation_id: i64,
            _index: usize,
            _patch: &SlidePatch,
        ) -> std::result::Result<(), ClientError> {
            Ok(())
        }
    }

    fn slide(value: serde_json::Value) -> Slide {
        serde_json::from_value(value).unwrap()
    }

    fn app() -> (App, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = GenerationSession::new(Arc::new(Offline), "minimal");
        let app = App::new(
            session,
            ThemeRegistry::builtin().unwrap(),
            AppOptions::default(),
            AppEventSender::new(tx),
        );
        (app, rx)
    }

    fn viewer() -> (App, UnboundedReceiver<AppEvent>) {
        let (mut app, rx) = app();
        let presentation = Presentation {
            title: "Deck".into(),
            theme: "minimal".into(),
            slides: vec![
                slide(json!({"type": "title", "title": "Hello", "subtitle": "World"})),
                slide(json!({"type": "content", "title": "Second", "body": "Text"})),
            ],
            ..Presentation::default()
        };
        app.session
            .dispatch(Action::PresentationLoaded(presentation))
            .unwrap();
        app.open(StartScreen::Viewer);
        (app, rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn title_of(app: &App, index: usize) -> Option<String> {
        app.session().state().slides()[index]
            .title()
            .map(str::to_string)
    }

    #[test]
    fn viewer_moves_between_slides() {
        let (mut app, _rx) = viewer();
        press(&mut app, KeyCode::Right);
        assert_eq!(app.session().state().current_slide_index(), 1);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.session().state().current_slide_index(), 1);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.session().state().current_slide_index(), 0);
    }

    #[test]
    fn tab_cycles_fields_of_the_current_slide() {
        let (mut app, _rx) = viewer();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.selected(), Some(FieldId::Title));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.selected(), Some(FieldId::Subtitle));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.selected(), Some(FieldId::Title));
        press(&mut app, KeyCode::Right);
        assert_eq!(app.selected(), None);
    }

    #[test]
    fn committed_edit_updates_the_slide() {
        let (mut app, mut rx) = viewer();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        assert!(app.is_editing());
        press(&mut app, KeyCode::Char('!'));
        press(&mut app, KeyCode::Enter);
        assert!(!app.is_editing());

        // applied by the key press itself, nothing queued
        assert_eq!(title_of(&app, 0).as_deref(), Some("Hello!"));
        assert!(rx.try_recv().is_err());
        // no id, nothing to save
        assert!(!app.session().state().is_saving());

        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let buf = terminal.backend().buffer();
        let screen: String = (0..buf.area.height)
            .flat_map(|y| (0..buf.area.width).map(move |x| (x, y)))
            .map(|pos| buf[pos].symbol().to_string())
            .collect();
        assert!(screen.contains("Hello!"));
    }

    #[test]
    fn escape_abandons_the_edit() {
        let (mut app, mut rx) = viewer();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.selected(), Some(FieldId::Title));
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Esc);
        assert!(!app.is_editing());
        assert!(rx.try_recv().is_err());
        assert_eq!(title_of(&app, 0).as_deref(), Some("Hello"));
    }

    #[test]
    fn read_only_viewer_ignores_edit_keys() {
        let (mut app, _rx) = viewer();
        app.options.editable = false;
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.selected(), None);
        assert!(!app.is_editing());
    }

    #[test]
    fn theme_key_cycles_themes() {
        let (mut app, _rx) = viewer();
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.session().state().theme(), "dark");
    }

    #[test]
    fn compose_form_edits_text_and_count() {
        let (mut app, _rx) = app();
        app.open(StartScreen::Compose { text: None });
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Compose);

        for c in "Rust".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Tab);
        let Some(GenerationInput::Text(request)) = app.compose_request() else {
            panic!("expected a text request");
        };
        assert_eq!(request.text, "Rust");
        assert_eq!(request.slide_count, Some(slide_common::DEFAULT_SLIDE_COUNT + 1));
        assert_eq!(request.theme.as_deref(), Some("dark"));
    }

    #[test]
    fn streamed_slides_are_followed_until_complete() {
        let (mut app, _rx) = app();
        app.session
            .dispatch(Action::Start {
                theme: None,
                requested_slide_count: Some(2),
            })
            .unwrap();
        app.screen = Screen::Generating;
        for n in 1..=2 {
            let event = GenerationEvent::ToolCall(ToolCall::add_slide(
                n,
                slide(json!({"type": "section", "title": format!("Part {n}")})),
            ));
            app.on_app_event(AppEvent::Generation(Some(Ok(event))));
        }
        assert_eq!(app.session().state().current_slide_index(), 1);

        let presentation = Presentation {
            id: Some(7),
            title: "Done".into(),
            slides: vec![slide(json!({"type": "section", "title": "Part 1"}))],
            ..Presentation::default()
        };
        app.on_app_event(AppEvent::Generation(Some(Ok(GenerationEvent::Complete(
            Completion {
                presentation: Some(presentation),
                ..Completion::default()
            },
        )))));
        assert_eq!(app.screen(), Screen::Viewer);
        assert_eq!(app.session().state().total_slides(), 1);
    }

    #[test]
    fn fits_a_wide_slide() {
        let fitted = fit_slide(Rect::new(0, 0, 100, 40));
        assert_eq!(fitted.width, 100);
        assert_eq!(fitted.height, 28);
        assert_eq!(fitted.y, 6);
        let tall = fit_slide(Rect::new(0, 0, 200, 18));
        assert_eq!(tall.height, 18);
        assert_eq!(tall.width, 64);
    }
}
