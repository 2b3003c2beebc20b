//! One edit path for both halves of a run: before `complete` an edit lands
//! on the streamed `add_slide` event, afterwards on the finalized slide.

use slide_protocol::PatchReport;
use slide_protocol::SlidePatch;

use crate::error::StateError;
use crate::state::GenerationState;

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The edit changed a streamed slide; nothing to persist.
    Streamed {
        slide_number: Option<u32>,
        report: PatchReport,
    },
    /// The edit changed a finalized slide and should be saved.
    Finalized {
        presentation_id: Option<i64>,
        index: usize,
        report: PatchReport,
    },
}

/// A post-completion edit waiting to be written to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub presentation_id: i64,
    pub index: usize,
    pub patch: SlidePatch,
}

impl EditOutcome {
    pub fn report(&self) -> &PatchReport {
        match self {
            EditOutcome::Streamed { report, .. } | EditOutcome::Finalized { report, .. } => report,
        }
    }

    /// Only finalized edits of a saved presentation that changed something
    /// need a save.
    pub fn pending_save(&self) -> Option<PendingSave> {
        match self {
            EditOutcome::Finalized {
                presentation_id: Some(presentation_id),
                index,
                report,
            } if !report.is_noop() => Some(PendingSave {
                presentation_id: *presentation_id,
                index: *index,
                patch: report.accepted.clone(),
            }),
            _ => None,
        }
    }
}

/// Applies `patch` to the slide shown at `position`.
///
/// The mode follows the state: with a presentation loaded `position`
/// indexes its slides, otherwise it indexes the live list and the edit is
/// routed to the backing `add_slide` event. Either way the state is updated
/// before this returns.
pub fn edit(
    state: &mut GenerationState,
    position: usize,
    patch: &SlidePatch,
) -> Result<EditOutcome, StateError> {
    if let Some(presentation) = state.presentation() {
        let presentation_id = presentation.id;
        let report = state.edit_slide(position, patch)?;
        return Ok(EditOutcome::Finalized {
            presentation_id,
            index: position,
            report,
        });
    }

    let indices = state.live_event_indices();
    let history_index = *indices.get(position).ok_or(StateError::SlideOutOfRange {
        index: position,
        len: indices.len(),
    })?;
    // Slide numbers may repeat, so the edit goes to this exact event.
    let slide_number = state.slide_number_at(history_index);
    let report = state.edit_streamed_event(history_index, patch)?;
    Ok(EditOutcome::Streamed {
        slide_number,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slide_protocol::Completion;
    use slide_protocol::GenerationEvent;
    use slide_protocol::Presentation;
    use slide_protocol::Slide;
    use slide_protocol::ToolCall;

    fn slide(title: &str) -> Slide {
        serde_json::from_value(json!({"type": "content", "title": title})).unwrap()
    }

    fn streaming_state() -> GenerationState {
        let mut state = GenerationState::default();
        state.start(None, None).unwrap();
        state.on_event(GenerationEvent::ToolCall(ToolCall::add_slide(1, slide("one"))));
        state.on_event(GenerationEvent::ToolCall(ToolCall::add_slide(2, slide("two"))));
        state
    }

    #[test]
    fn edits_streamed_slide_before_completion() {
        let mut state = streaming_state();
        let outcome = edit(&mut state, 1, &SlidePatch::new().with("title", "2!")).unwrap();
        assert!(matches!(
            outcome,
            EditOutcome::Streamed {
                slide_number: Some(2),
                ..
            }
        ));
        assert!(outcome.pending_save().is_none());
        assert_eq!(state.slides()[1].title(), Some("2!"));
        assert_eq!(state.slides().len(), 2);
    }

    #[test]
    fn edits_presentation_after_completion() {
        let mut state = streaming_state();
        state.on_event(GenerationEvent::Complete(Completion {
            presentation: Some(Presentation {
                id: Some(11),
                slides: vec![slide("one"), slide("two")],
                ..Default::default()
            }),
            ..Default::default()
        }));

        let outcome = edit(&mut state, 0, &SlidePatch::new().with("body", "b")).unwrap();
        let pending = outcome.pending_save().unwrap();
        assert_eq!(pending.presentation_id, 11);
        assert_eq!(pending.index, 0);
        assert_eq!(pending.patch, SlidePatch::new().with("body", "b"));

        // the streamed event is no longer the edit target
        assert_eq!(state.live_slides()[0].title(), Some("one"));
    }

    #[test]
    fn rejected_fields_do_not_trigger_a_save() {
        let mut state = GenerationState::default();
        state.presentation_loaded(Presentation {
            id: Some(3),
            slides: vec![slide("only")],
            ..Default::default()
        });
        let outcome = edit(&mut state, 0, &SlidePatch::new().with("quote", "q")).unwrap();
        assert_eq!(outcome.report().ignored, vec!["quote".to_string()]);
        assert!(outcome.pending_save().is_none());
    }

    #[test]
    fn repeated_slide_numbers_edit_the_slide_at_the_position() {
        let mut state = GenerationState::default();
        state.start(None, None).unwrap();
        state.on_event(GenerationEvent::ToolCall(ToolCall::add_slide(3, slide("first"))));
        state.on_event(GenerationEvent::ToolCall(ToolCall::add_slide(3, slide("second"))));

        edit(&mut state, 0, &SlidePatch::new().with("title", "edited")).unwrap();
        let titles: Vec<_> = state.slides().iter().map(|s| s.title()).collect();
        assert_eq!(titles, vec![Some("edited"), Some("second")]);
    }

    #[test]
    fn position_out_of_live_range() {
        let mut state = streaming_state();
        assert!(matches!(
            edit(&mut state, 5, &SlidePatch::new()),
            Err(StateError::SlideOutOfRange { index: 5, len: 2 })
        ));
    }
}
