use std::sync::Arc;

use slide_client::ClientError;
use slide_client::GenerationStream;
use slide_protocol::GenerationEvent;
use slide_protocol::SlidePatch;

use crate::backend::GenerationInput;
use crate::backend::SlidesBackend;
use crate::error::Result;
use crate::reconcile;
use crate::reconcile::EditOutcome;
use crate::reconcile::PendingSave;
use crate::state::Action;
use crate::state::GenerationState;

/// A [`GenerationState`] bound to the backend it talks to.
///
/// The session is owned by one task. Long calls either run inline
/// (`generate`, `edit_slide`) or are split so the owner can spawn the
/// network half and feed the result back (`begin` / `apply_stream_item`,
/// `edit` / `finish_save`).
pub struct GenerationSession {
    state: GenerationState,
    backend: Arc<dyn SlidesBackend>,
}

impl GenerationSession {
    pub fn new(backend: Arc<dyn SlidesBackend>, theme: impl Into<String>) -> Self {
        Self {
            state: GenerationState::new(theme),
            backend,
        }
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn backend(&self) -> Arc<dyn SlidesBackend> {
        Arc::clone(&self.backend)
    }

    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        self.state.dispatch(action)?;
        Ok(())
    }

    /// Starts a run and opens its stream. A request that fails before any
    /// event arrives still ends the run with the error recorded.
    pub async fn begin(&mut self, input: &GenerationInput) -> Result<GenerationStream> {
        self.state.start(input.theme(), input.slide_count())?;
        match self.backend.open_generation(input).await {
            Ok(stream) => Ok(stream),
            Err(err) => {
                self.state.transport_failed(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Feeds one read of the stream into the reducer. Returns `false` once
    /// the stream is done.
    pub fn apply_stream_item(
        &mut self,
        item: Option<std::result::Result<GenerationEvent, ClientError>>,
    ) -> bool {
        match item {
            Some(Ok(event)) => {
                self.state.on_event(event);
                true
            }
            Some(Err(err)) => {
                self.state.transport_failed(err.to_string());
                false
            }
            None => {
                self.state.stream_closed();
                false
            }
        }
    }

    /// Runs a whole generation, applying events in arrival order.
    pub async fn generate(&mut self, input: &GenerationInput) -> Result<()> {
        let mut stream = match self.begin(input).await {
            Ok(stream) => stream,
            // the failure is already in the state
            Err(crate::error::SlideError::Client(_)) => return Ok(()),
            Err(err) => return Err(err),
        };
        while self.apply_stream_item(stream.next().await) {}
        Ok(())
    }

    pub async fn load_presentation(&mut self, id: i64) -> Result<()> {
        self.state.load_started()?;
        match self.backend.get_presentation(id).await {
            Ok(presentation) => self.state.presentation_loaded(presentation),
            Err(err) => self.state.load_failed(err.to_string()),
        }
        Ok(())
    }

    /// Applies an edit and, when it needs saving, marks the session as
    /// saving. The caller performs the save and reports back through
    /// [`Self::finish_save`].
    pub fn edit(
        &mut self,
        position: usize,
        patch: &SlidePatch,
    ) -> Result<(EditOutcome, Option<PendingSave>)> {
        let outcome = reconcile::edit(&mut self.state, position, patch)?;
        let pending = outcome.pending_save();
        if pending.is_some() {
            self.state.saving_started();
        }
        Ok((outcome, pending))
    }

    pub fn finish_save(&mut self, result: std::result::Result<(), ClientError>) {
        self.state
            .saving_finished(result.map_err(|err| err.to_string()));
    }

    /// Edit and save inline. A failed save is recorded in the state and the
    /// edit stays applied.
    pub async fn edit_slide(&mut self, position: usize, patch: &SlidePatch) -> Result<EditOutcome> {
        let (outcome, pending) = self.edit(position, patch)?;
        if let Some(save) = pending {
            let result = self
                .backend
                .update_slide(save.presentation_id, save.index, &save.patch)
                .await;
            self.finish_save(result);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use slide_protocol::Completion;
    use slide_protocol::GenerateRequest;
    use slide_protocol::Presentation;
    use slide_protocol::Slide;
    use slide_protocol::ToolCall;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    use crate::state::Phase;

    /// Backend that replays scripted events and records saves.
    #[derive(Default)]
    struct MemoryBackend {
        script: Mutex<Vec<std::result::Result<GenerationEvent, ClientError>>>,
        presentations: Mutex<Vec<Presentation>>,
        saves: Mutex<Vec<(i64, usize, SlidePatch)>>,
        fail_saves: bool,
        fail_open: bool,
    }

    #[async_trait]
    impl SlidesBackend for MemoryBackend {
        async fn open_generation(
            &self,
            _input: &GenerationInput,
        ) -> std::result::Result<GenerationStream, ClientError> {
            if self.fail_open {
                return Err(ClientError::Http {
                    status: 503,
                    detail: "HTTP 503".into(),
                });
            }
            let items: Vec<_> = self.script.lock().unwrap().drain(..).collect();
            let (tx, rx) = mpsc::channel(items.len().max(1));
            for item in items {
                tx.send(item).await.unwrap();
            }
            Ok(GenerationStream::from_receiver(rx))
        }

        async fn get_presentation(&self, id: i64) -> std::result::Result<Presentation, ClientError> {
            self.presentations
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == Some(id))
                .cloned()
                .ok_or(ClientError::Http {
                    status: 404,
                    detail: "Presentation not found".into(),
                })
        }

        async fn update_slide(
            &self,
            presentation_id: i64,
            index: usize,
            patch: &SlidePatch,
        ) -> std::result::Result<(), ClientError> {
            if self.fail_saves {
                return Err(ClientError::Http {
                    status: 500,
                    detail: "Failed to save slide".into(),
                });
            }
            self.saves
                .lock()
                .unwrap()
                .push((presentation_id, index, patch.clone()));
            Ok(())
        }
    }

    fn slide(value: serde_json::Value) -> Slide {
        serde_json::from_value(value).unwrap()
    }

    fn text_input() -> GenerationInput {
        GenerationInput::Text(GenerateRequest {
            text: "A long enough text about the quarterly results.".into(),
            slide_count: Some(2),
            theme: Some("minimal".into()),
            ..Default::default()
        })
    }

    fn deck() -> Presentation {
        Presentation {
            id: Some(21),
            title: "Deck".into(),
            slides: vec![
                slide(json!({"type": "title", "title": "Hello"})),
                slide(json!({"type": "bullets", "bullets": ["a", "b"]})),
            ],
            ..Default::default()
        }
    }

    fn scripted_run() -> Vec<std::result::Result<GenerationEvent, ClientError>> {
        vec![
            Ok(GenerationEvent::Thinking {
                message: "Analyzing...".into(),
                iteration: Some(1),
            }),
            Ok(GenerationEvent::ToolCall(ToolCall::add_slide(
                1,
                slide(json!({"type": "title", "title": "Hello"})),
            ))),
            Ok(GenerationEvent::ToolCall(ToolCall::add_slide(
                2,
                slide(json!({"type": "bullets", "bullets": ["a", "b"]})),
            ))),
            Ok(GenerationEvent::Complete(Completion {
                presentation: Some(deck()),
                presentation_id: Some(21),
                title: Some("Deck".into()),
                slide_count: Some(2),
            })),
        ]
    }

    #[tokio::test]
    async fn generate_applies_events_in_order() {
        let backend = Arc::new(MemoryBackend {
            script: Mutex::new(scripted_run()),
            ..Default::default()
        });
        let mut session = GenerationSession::new(backend, "neobrutalism");
        session.generate(&text_input()).await.unwrap();

        let state = session.state();
        assert_eq!(state.phase(), Phase::Completed);
        assert_eq!(state.theme(), "minimal");
        assert_eq!(state.requested_slide_count(), Some(2));
        assert_eq!(state.history().len(), 4);
        assert_eq!(state.presentation(), Some(&deck()));
        assert_eq!(state.live_slides().len(), 2);
    }

    #[tokio::test]
    async fn transport_error_mid_stream_keeps_history() {
        let mut script = scripted_run();
        script.truncate(2);
        script.push(Err(ClientError::Http {
            status: 502,
            detail: "HTTP 502".into(),
        }));
        let backend = Arc::new(MemoryBackend {
            script: Mutex::new(script),
            ..Default::default()
        });
        let mut session = GenerationSession::new(backend, "neobrutalism");
        session.generate(&text_input()).await.unwrap();

        assert_eq!(session.state().phase(), Phase::Errored);
        assert_eq!(session.state().error(), Some("HTTP 502"));
        assert_eq!(session.state().history().len(), 2);
    }

    #[tokio::test]
    async fn failed_open_is_recorded() {
        let backend = Arc::new(MemoryBackend {
            fail_open: true,
            ..Default::default()
        });
        let mut session = GenerationSession::new(backend, "neobrutalism");
        session.generate(&text_input()).await.unwrap();
        assert_eq!(session.state().phase(), Phase::Errored);
        assert_eq!(session.state().error(), Some("HTTP 503"));
        assert!(!session.state().is_generating());
    }

    #[tokio::test]
    async fn finalized_edit_is_saved() {
        let backend = Arc::new(MemoryBackend {
            script: Mutex::new(scripted_run()),
            ..Default::default()
        });
        let mut session = GenerationSession::new(backend.clone(), "neobrutalism");
        session.generate(&text_input()).await.unwrap();

        session
            .edit_slide(0, &SlidePatch::new().with("subtitle", "Q3"))
            .await
            .unwrap();
        let saves = backend.saves.lock().unwrap().clone();
        assert_eq!(saves, vec![(21, 0, SlidePatch::new().with("subtitle", "Q3"))]);
        assert!(!session.state().is_saving());
        assert!(session.state().error().is_none());
    }

    #[tokio::test]
    async fn failed_save_surfaces_error_without_rollback() {
        let backend = Arc::new(MemoryBackend {
            presentations: Mutex::new(vec![deck()]),
            fail_saves: true,
            ..Default::default()
        });
        let mut session = GenerationSession::new(backend, "neobrutalism");
        session.load_presentation(21).await.unwrap();

        session
            .edit_slide(0, &SlidePatch::new().with("title", "Edited"))
            .await
            .unwrap();
        let state = session.state();
        assert_eq!(state.error(), Some("Failed to save slide"));
        assert!(!state.is_saving());
        assert_eq!(state.slides()[0].title(), Some("Edited"));
    }

    #[tokio::test]
    async fn missing_presentation_sets_error() {
        let backend = Arc::new(MemoryBackend::default());
        let mut session = GenerationSession::new(backend, "neobrutalism");
        session.load_presentation(99).await.unwrap();
        assert_eq!(session.state().error(), Some("Presentation not found"));
        assert!(!session.state().is_loading());
    }
}
