//! Single source of truth for a generation session.
//!
//! [`GenerationState`] is a plain reducer: every change goes through one of
//! its `&mut self` methods (or [`GenerationState::dispatch`]) on the task
//! that owns it, so no locking is involved.

use chrono::DateTime;
use chrono::Utc;
use serde_json::Value;
use slide_protocol::GenerationEvent;
use slide_protocol::PatchReport;
use slide_protocol::Presentation;
use slide_protocol::Slide;
use slide_protocol::SlidePatch;
use slide_protocol::DEFAULT_ERROR_MESSAGE;
use uuid::Uuid;

use crate::error::StateError;

pub const STREAM_CLOSED_EARLY: &str = "generation stream closed before completion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    Completed,
    Errored,
}

/// Identity of the current (or last) generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl RunInfo {
    /// Wall time since the run started, zero if the clock went backwards.
    pub fn elapsed(&self) -> std::time::Duration {
        (Utc::now() - self.started_at).to_std().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Start {
        theme: Option<String>,
        requested_slide_count: Option<u32>,
    },
    Event(GenerationEvent),
    TransportFailed(String),
    StreamClosed,
    EditSlide {
        index: usize,
        patch: SlidePatch,
    },
    EditStreamedSlide {
        slide_number: u32,
        patch: SlidePatch,
    },
    SetCurrentSlide(usize),
    NextSlide,
    PreviousSlide,
    SetTheme(String),
    LoadStarted,
    PresentationLoaded(Presentation),
    LoadFailed(String),
    SavingStarted,
    SavingFinished(Result<(), String>),
    ClearPresentation,
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationState {
    presentation: Option<Presentation>,
    current_slide: usize,
    phase: Phase,
    is_loading: bool,
    is_saving: bool,
    error: Option<String>,
    history: Vec<GenerationEvent>,
    theme: String,
    requested_slide_count: Option<u32>,
    run: Option<RunInfo>,
}

impl Default for GenerationState {
    fn default() -> Self {
        Self::new(slide_common::DEFAULT_THEME)
    }
}

impl GenerationState {
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            presentation: None,
            current_slide: 0,
            phase: Phase::Idle,
            is_loading: false,
            is_saving: false,
            error: None,
            history: Vec::new(),
            theme: theme.into(),
            requested_slide_count: None,
            run: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_generating(&self) -> bool {
        self.phase == Phase::Generating
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn history(&self) -> &[GenerationEvent] {
        &self.history
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn requested_slide_count(&self) -> Option<u32> {
        self.requested_slide_count
    }

    pub fn presentation(&self) -> Option<&Presentation> {
        self.presentation.as_ref()
    }

    pub fn run(&self) -> Option<&RunInfo> {
        self.run.as_ref()
    }

    pub fn current_slide_index(&self) -> usize {
        self.current_slide
    }

    /// Slides of every `add_slide` call that carries a slide, in event order.
    pub fn live_slides(&self) -> Vec<&Slide> {
        self.history
            .iter()
            .filter_map(|event| event.as_add_slide())
            .filter_map(|call| call.slide.as_ref())
            .collect()
    }

    /// History index of each live slide, parallel to [`Self::live_slides`].
    pub(crate) fn live_event_indices(&self) -> Vec<usize> {
        self.history
            .iter()
            .enumerate()
            .filter(|(_, event)| {
                event
                    .as_add_slide()
                    .is_some_and(|call| call.slide.is_some())
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// `slide_number` of the add_slide event at `history_index`, if any.
    pub(crate) fn slide_number_at(&self, history_index: usize) -> Option<u32> {
        self.history
            .get(history_index)
            .and_then(GenerationEvent::as_add_slide)
            .and_then(|call| call.slide_number)
    }

    /// The finalized slides when a presentation is set, the live list otherwise.
    pub fn slides(&self) -> Vec<&Slide> {
        match &self.presentation {
            Some(presentation) => presentation.slides.iter().collect(),
            None => self.live_slides(),
        }
    }

    pub fn total_slides(&self) -> usize {
        match &self.presentation {
            Some(presentation) => presentation.slides.len(),
            None => self.live_slides().len(),
        }
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        self.slides().get(self.current_slide).copied()
    }

    /// Number of streamed slides so far, for progress display.
    pub fn streamed_slide_count(&self) -> usize {
        self.history
            .iter()
            .filter(|event| event.as_add_slide().is_some())
            .count()
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Option<PatchReport>, StateError> {
        match action {
            Action::Start {
                theme,
                requested_slide_count,
            } => self.start(theme, requested_slide_count)?,
            Action::Event(event) => self.on_event(event),
            Action::TransportFailed(message) => self.transport_failed(message),
            Action::StreamClosed => self.stream_closed(),
            Action::EditSlide { index, patch } => {
                return self.edit_slide(index, &patch).map(Some);
            }
            Action::EditStreamedSlide {
                slide_number,
                patch,
            } => return self.edit_streamed_slide(slide_number, &patch).map(Some),
            Action::SetCurrentSlide(index) => self.set_current_slide(index),
            Action::NextSlide => self.next_slide(),
            Action::PreviousSlide => self.previous_slide(),
            Action::SetTheme(theme) => self.set_theme(theme),
            Action::LoadStarted => self.load_started()?,
            Action::PresentationLoaded(presentation) => self.presentation_loaded(presentation),
            Action::LoadFailed(message) => self.load_failed(message),
            Action::SavingStarted => self.saving_started(),
            Action::SavingFinished(result) => self.saving_finished(result),
            Action::ClearPresentation => self.clear_presentation(),
            Action::Reset => self.reset(),
        }
        Ok(None)
    }

    /// Begins a run. History, error and any previous presentation are
    /// dropped; the theme falls back to the default when not given.
    pub fn start(
        &mut self,
        theme: Option<String>,
        requested_slide_count: Option<u32>,
    ) -> Result<(), StateError> {
        if self.is_generating() {
            return Err(StateError::RunInProgress);
        }
        let run = RunInfo {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
        };
        tracing::info!(
            "generation run {} started (theme: {theme:?}, slides: {requested_slide_count:?})",
            run.id
        );

        self.history.clear();
        self.presentation = None;
        self.current_slide = 0;
        self.error = None;
        self.theme = theme
            .filter(|theme| !theme.is_empty())
            .unwrap_or_else(|| slide_common::DEFAULT_THEME.to_string());
        self.requested_slide_count = requested_slide_count;
        self.phase = Phase::Generating;
        self.run = Some(run);
        Ok(())
    }

    /// Records an event. Only a run in progress reacts to it; afterwards
    /// events are kept for the record and change nothing else.
    pub fn on_event(&mut self, event: GenerationEvent) {
        if !self.is_generating() {
            tracing::debug!(
                "`{}` event outside a running generation; recorded only",
                event.kind()
            );
            self.history.push(event);
            return;
        }

        match &event {
            GenerationEvent::Complete(completion) => {
                if let Some(presentation) = &completion.presentation {
                    self.presentation = Some(presentation.clone());
                    self.current_slide = 0;
                }
                self.error = None;
                self.phase = Phase::Completed;
                tracing::info!(
                    "generation run {} completed with {} slides",
                    self.run_id(),
                    self.total_slides()
                );
            }
            GenerationEvent::Error { message } => {
                let message = message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
                tracing::warn!("generation run {} failed: {message}", self.run_id());
                self.error = Some(message);
                self.phase = Phase::Errored;
            }
            GenerationEvent::ToolCall(call) => {
                tracing::debug!(
                    "tool call {:?} (slide {:?})",
                    call.tool,
                    call.slide_number
                );
            }
            GenerationEvent::Opaque { kind, .. } => {
                tracing::debug!("ignoring `{kind}` event");
            }
            GenerationEvent::Thinking { .. } | GenerationEvent::ToolResult(_) => {}
        }
        self.history.push(event);
    }

    pub fn transport_failed(&mut self, message: String) {
        if !self.is_generating() {
            tracing::debug!("transport failure outside a running generation: {message}");
            return;
        }
        tracing::warn!("generation run {} transport failure: {message}", self.run_id());
        self.error = Some(message);
        self.phase = Phase::Errored;
    }

    /// The body ended. A run that never saw a terminal event is failed.
    pub fn stream_closed(&mut self) {
        if self.is_generating() {
            tracing::warn!(
                "generation run {} stream closed before a terminal event",
                self.run_id()
            );
            self.error = Some(STREAM_CLOSED_EARLY.to_string());
            self.phase = Phase::Errored;
        }
    }

    /// Merges `patch` into `presentation.slides[index]`.
    pub fn edit_slide(
        &mut self,
        index: usize,
        patch: &SlidePatch,
    ) -> Result<PatchReport, StateError> {
        let presentation = self
            .presentation
            .as_mut()
            .ok_or(StateError::NoPresentation)?;
        let len = presentation.slides.len();
        let slide = presentation
            .slides
            .get_mut(index)
            .ok_or(StateError::SlideOutOfRange { index, len })?;
        let report = slide.apply_patch(patch)?;
        log_ignored(&report);
        Ok(report)
    }

    /// Merges `patch` into the most recent `add_slide` event numbered
    /// `slide_number`: every field into its raw `args`, the accepted ones
    /// into its slide.
    pub fn edit_streamed_slide(
        &mut self,
        slide_number: u32,
        patch: &SlidePatch,
    ) -> Result<PatchReport, StateError> {
        if self.presentation.is_some() {
            return Err(StateError::NotStreaming);
        }
        let index = self
            .history
            .iter()
            .rposition(|event| {
                event
                    .as_add_slide()
                    .is_some_and(|call| call.slide_number == Some(slide_number))
            })
            .ok_or(StateError::StreamedSlideNotFound(slide_number))?;
        self.edit_streamed_event(index, patch)
    }

    pub(crate) fn edit_streamed_event(
        &mut self,
        history_index: usize,
        patch: &SlidePatch,
    ) -> Result<PatchReport, StateError> {
        if self.presentation.is_some() {
            return Err(StateError::NotStreaming);
        }
        let slide_number = self.slide_number_at(history_index).unwrap_or_default();
        let Some(GenerationEvent::ToolCall(call)) = self.history.get_mut(history_index) else {
            return Err(StateError::StreamedSlideNotFound(slide_number));
        };

        let report = match &call.slide {
            Some(slide) => {
                let mut edited = slide.clone();
                let report = edited.apply_patch(patch)?;
                call.slide = Some(edited);
                report
            }
            None => PatchReport {
                accepted: patch.clone(),
                ignored: Vec::new(),
            },
        };
        for (field, value) in patch.iter() {
            call.args.insert(field.clone(), value.clone());
        }
        log_ignored(&report);
        Ok(report)
    }

    pub fn set_current_slide(&mut self, index: usize) {
        let last = self.total_slides().saturating_sub(1);
        self.current_slide = index.min(last);
    }

    pub fn next_slide(&mut self) {
        self.set_current_slide(self.current_slide.saturating_add(1));
    }

    pub fn previous_slide(&mut self) {
        self.current_slide = self.current_slide.saturating_sub(1);
    }

    pub fn set_theme(&mut self, theme: String) {
        self.theme = theme;
    }

    pub fn load_started(&mut self) -> Result<(), StateError> {
        if self.is_generating() {
            return Err(StateError::RunInProgress);
        }
        self.is_loading = true;
        self.error = None;
        Ok(())
    }

    /// Replaces the presentation with a saved one. Its theme becomes active
    /// when it names one.
    pub fn presentation_loaded(&mut self, presentation: Presentation) {
        if !presentation.theme.is_empty() {
            self.theme = presentation.theme.clone();
        }
        self.presentation = Some(presentation);
        self.current_slide = 0;
        self.is_loading = false;
        self.error = None;
    }

    pub fn load_failed(&mut self, message: String) {
        self.is_loading = false;
        self.error = Some(message);
    }

    pub fn saving_started(&mut self) {
        self.is_saving = true;
    }

    /// A failed save surfaces its message; the edit itself is kept.
    pub fn saving_finished(&mut self, result: Result<(), String>) {
        self.is_saving = false;
        if let Err(message) = result {
            tracing::warn!("failed to save slide: {message}");
            self.error = Some(message);
        }
    }

    pub fn clear_presentation(&mut self) {
        self.presentation = None;
        self.current_slide = 0;
    }

    /// Back to idle with an empty history; the active theme is kept.
    pub fn reset(&mut self) {
        let theme = std::mem::take(&mut self.theme);
        *self = Self::new(theme);
    }

    fn run_id(&self) -> String {
        self.run
            .as_ref()
            .map(|run| run.id.to_string())
            .unwrap_or_default()
    }

    /// Raw `args` of the add_slide event backing live slide `position`.
    pub fn live_slide_args(&self, position: usize) -> Option<&serde_json::Map<String, Value>> {
        let index = *self.live_event_indices().get(position)?;
        self.history
            .get(index)
            .and_then(GenerationEvent::as_add_slide)
            .map(|call| &call.args)
    }
}

fn log_ignored(report: &PatchReport) {
    if !report.ignored.is_empty() {
        tracing::warn!(
            "ignored slide fields that do not belong to its type: {}",
            report.ignored.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slide_protocol::Completion;
    use slide_protocol::SlideContent;
    use slide_protocol::ToolCall;
    use slide_protocol::ToolName;

    fn slide(value: Value) -> Slide {
        serde_json::from_value(value).unwrap()
    }

    fn add_slide(number: u32, value: Value) -> GenerationEvent {
        GenerationEvent::ToolCall(ToolCall::add_slide(number, slide(value)))
    }

    fn thinking(message: &str) -> GenerationEvent {
        GenerationEvent::Thinking {
            message: message.to_string(),
            iteration: None,
        }
    }

    fn complete_with(slides: Vec<Slide>) -> GenerationEvent {
        GenerationEvent::Complete(Completion {
            presentation: Some(Presentation {
                id: Some(1),
                title: "Deck".into(),
                slides,
                ..Default::default()
            }),
            presentation_id: Some(1),
            title: Some("Deck".into()),
            slide_count: None,
        })
    }

    fn generating() -> GenerationState {
        let mut state = GenerationState::default();
        state.start(Some("dark".into()), Some(2)).unwrap();
        state
    }

    #[test]
    fn start_resets_previous_run() {
        let mut state = generating();
        state.on_event(add_slide(1, json!({"type": "title", "title": "A"})));
        state.on_event(GenerationEvent::Error {
            message: Some("boom".into()),
        });
        assert_eq!(state.phase(), Phase::Errored);
        let first_run = state.run().unwrap().id;

        state.start(None, None).unwrap();
        assert!(state.history().is_empty());
        assert!(state.error().is_none());
        assert_eq!(state.theme(), slide_common::DEFAULT_THEME);
        assert_eq!(state.requested_slide_count(), None);
        assert!(state.is_generating());
        assert_ne!(state.run().unwrap().id, first_run);
    }

    #[test]
    fn start_is_rejected_while_generating() {
        let mut state = generating();
        assert!(matches!(
            state.start(None, None),
            Err(StateError::RunInProgress)
        ));
    }

    #[test]
    fn streaming_scenario_builds_live_list_then_final_deck() {
        let mut state = generating();
        let first = json!({"type": "title", "title": "Hello"});
        let second = json!({"type": "bullets", "bullets": ["a", "b"]});

        state.on_event(thinking("Analyzing..."));
        state.on_event(add_slide(1, first.clone()));
        state.on_event(add_slide(2, second.clone()));

        let live: Vec<Slide> = state.live_slides().into_iter().cloned().collect();
        assert_eq!(live, vec![slide(first.clone()), slide(second.clone())]);
        assert_eq!(state.total_slides(), 2);
        assert!(state.presentation().is_none());

        state.on_event(complete_with(vec![slide(first), slide(second)]));
        assert_eq!(state.phase(), Phase::Completed);
        let slides = &state.presentation().unwrap().slides;
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].title(), Some("Hello"));
        assert_eq!(
            slides[1].content,
            SlideContent::Bullets {
                title: None,
                bullets: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn complete_presentation_replaces_live_slides() {
        let mut state = generating();
        for n in 1..=5 {
            state.on_event(add_slide(n, json!({"title": format!("draft {n}")})));
        }
        state.on_event(complete_with(vec![slide(json!({"title": "final"}))]));
        let titles: Vec<_> = state.slides().iter().map(|s| s.title()).collect();
        assert_eq!(titles, vec![Some("final")]);
    }

    #[test]
    fn complete_without_presentation_still_ends_run() {
        let mut state = generating();
        state.on_event(GenerationEvent::Complete(Completion::default()));
        assert_eq!(state.phase(), Phase::Completed);
        assert!(state.presentation().is_none());
        assert!(!state.is_generating());
    }

    #[test]
    fn terminal_events_freeze_state() {
        let mut state = generating();
        state.on_event(GenerationEvent::Error { message: None });
        assert_eq!(state.error(), Some(DEFAULT_ERROR_MESSAGE));

        let before_error = state.error().map(str::to_string);
        state.on_event(add_slide(1, json!({"title": "late"})));
        state.on_event(complete_with(vec![slide(json!({"title": "late"}))]));

        assert_eq!(state.history().len(), 3);
        assert!(state.presentation().is_none());
        assert_eq!(state.error().map(str::to_string), before_error);
        assert_eq!(state.phase(), Phase::Errored);

        let mut state = generating();
        state.on_event(complete_with(vec![slide(json!({"title": "kept"}))]));
        state.on_event(add_slide(9, json!({"title": "late"})));
        state.on_event(GenerationEvent::Error { message: None });
        assert_eq!(state.phase(), Phase::Completed);
        assert!(state.error().is_none());
        assert_eq!(state.slides()[0].title(), Some("kept"));
    }

    #[test]
    fn live_list_skips_calls_without_slide_and_other_tools() {
        let mut state = generating();
        state.on_event(add_slide(1, json!({"title": "one"})));
        state.on_event(GenerationEvent::ToolCall(ToolCall {
            tool: ToolName::AddSlide,
            slide_number: Some(2),
            args: Default::default(),
            slide: None,
            iteration: None,
        }));
        state.on_event(GenerationEvent::ToolCall(ToolCall {
            tool: ToolName::FinishPresentation,
            slide_number: None,
            args: Default::default(),
            slide: None,
            iteration: None,
        }));
        state.on_event(GenerationEvent::Opaque {
            kind: "heartbeat".into(),
            payload: json!({}),
        });
        assert_eq!(state.live_slides().len(), 1);
        assert_eq!(state.streamed_slide_count(), 2);
        assert_eq!(state.history().len(), 4);
        assert!(state.is_generating());
    }

    #[test]
    fn streamed_edit_updates_args_and_projection() {
        let mut state = generating();
        state.on_event(add_slide(1, json!({"type": "title", "title": "Hello"})));
        state.on_event(add_slide(2, json!({"type": "content", "title": "Two"})));

        let report = state
            .edit_streamed_slide(1, &SlidePatch::new().with("title", "Updated"))
            .unwrap();
        assert!(report.ignored.is_empty());
        assert_eq!(state.live_slides().len(), 2);
        assert_eq!(state.live_slides()[0].title(), Some("Updated"));
        assert_eq!(state.live_slides()[1].title(), Some("Two"));
        assert_eq!(state.live_slide_args(0).unwrap()["title"], "Updated");
    }

    #[test]
    fn streamed_edit_targets_latest_tie() {
        let mut state = generating();
        state.on_event(add_slide(3, json!({"title": "first"})));
        state.on_event(add_slide(3, json!({"title": "second"})));
        state
            .edit_streamed_slide(3, &SlidePatch::new().with("title", "edited"))
            .unwrap();
        let titles: Vec<_> = state.live_slides().iter().map(|s| s.title()).collect();
        assert_eq!(titles, vec![Some("first"), Some("edited")]);
    }

    #[test]
    fn streamed_edit_keeps_foreign_fields_in_args_only() {
        let mut state = generating();
        state.on_event(add_slide(1, json!({"type": "quote", "quote": "Q"})));
        let report = state
            .edit_streamed_slide(1, &SlidePatch::new().with("bullets", json!(["x"])))
            .unwrap();
        assert_eq!(report.ignored, vec!["bullets".to_string()]);
        assert_eq!(state.live_slide_args(0).unwrap()["bullets"], json!(["x"]));
        assert_eq!(state.live_slides()[0].kind(), slide(json!({"type": "quote"})).kind());
    }

    #[test]
    fn streamed_edit_errors() {
        let mut state = generating();
        assert!(matches!(
            state.edit_streamed_slide(4, &SlidePatch::new().with("title", "x")),
            Err(StateError::StreamedSlideNotFound(4))
        ));
        state.on_event(complete_with(vec![]));
        assert!(matches!(
            state.edit_streamed_slide(4, &SlidePatch::new()),
            Err(StateError::NotStreaming)
        ));
    }

    #[test]
    fn edit_slide_round_trip() {
        let mut state = generating();
        state.on_event(complete_with(vec![
            slide(json!({"type": "title", "title": "T", "subtitle": "S", "order": 1})),
            slide(json!({"type": "content", "title": "C", "body": "B", "order": 2})),
        ]));
        let before = state.presentation().unwrap().slides[1].clone();

        state
            .edit_slide(1, &SlidePatch::new().with("title", "X"))
            .unwrap();
        let after = &state.presentation().unwrap().slides[1];
        assert_eq!(after.title(), Some("X"));
        let mut expected = before;
        expected.content = SlideContent::Content {
            title: Some("X".into()),
            body: Some("B".into()),
        };
        assert_eq!(after, &expected);
    }

    #[test]
    fn edit_slide_errors() {
        let mut state = GenerationState::default();
        assert!(matches!(
            state.edit_slide(0, &SlidePatch::new()),
            Err(StateError::NoPresentation)
        ));
        state.presentation_loaded(Presentation::default());
        assert!(matches!(
            state.edit_slide(2, &SlidePatch::new()),
            Err(StateError::SlideOutOfRange { index: 2, len: 0 })
        ));
    }

    #[test]
    fn stream_failures_end_run_but_keep_history() {
        let mut state = generating();
        state.on_event(add_slide(1, json!({"title": "kept"})));
        state.transport_failed("connection reset".into());
        assert_eq!(state.phase(), Phase::Errored);
        assert_eq!(state.error(), Some("connection reset"));
        assert_eq!(state.live_slides().len(), 1);

        let mut state = generating();
        state.stream_closed();
        assert_eq!(state.error(), Some(STREAM_CLOSED_EARLY));

        let mut state = generating();
        state.on_event(complete_with(vec![]));
        state.stream_closed();
        assert!(state.error().is_none());
    }

    #[test]
    fn navigation_is_clamped() {
        let mut state = generating();
        state.on_event(complete_with(vec![
            slide(json!({"title": "1"})),
            slide(json!({"title": "2"})),
        ]));
        state.previous_slide();
        assert_eq!(state.current_slide_index(), 0);
        state.next_slide();
        state.next_slide();
        assert_eq!(state.current_slide_index(), 1);
        state.set_current_slide(10);
        assert_eq!(state.current_slide().and_then(Slide::title), Some("2"));
    }

    #[test]
    fn saving_failure_keeps_edit() {
        let mut state = GenerationState::default();
        state.presentation_loaded(Presentation {
            theme: "ocean".into(),
            slides: vec![slide(json!({"title": "old"}))],
            ..Default::default()
        });
        assert_eq!(state.theme(), "ocean");
        state
            .dispatch(Action::EditSlide {
                index: 0,
                patch: SlidePatch::new().with("title", "new"),
            })
            .unwrap();
        state.dispatch(Action::SavingStarted).unwrap();
        assert!(state.is_saving());
        state
            .dispatch(Action::SavingFinished(Err("HTTP 500".into())))
            .unwrap();
        assert!(!state.is_saving());
        assert_eq!(state.error(), Some("HTTP 500"));
        assert_eq!(state.slides()[0].title(), Some("new"));
    }

    #[test]
    fn reset_returns_to_idle_keeping_theme() {
        let mut state = generating();
        state.on_event(thinking("..."));
        state.dispatch(Action::Reset).unwrap();
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.history().is_empty());
        assert_eq!(state.theme(), "dark");
    }

    #[test]
    fn run_elapsed_counts_from_start() {
        let mut run = RunInfo {
            id: Uuid::new_v4(),
            started_at: Utc::now() - chrono::Duration::seconds(90),
        };
        assert!(run.elapsed() >= std::time::Duration::from_secs(90));

        run.started_at = Utc::now() + chrono::Duration::seconds(60);
        assert_eq!(run.elapsed(), std::time::Duration::ZERO);
    }
}
