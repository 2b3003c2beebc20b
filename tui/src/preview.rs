//! Opens a stored presentation in the viewer, from the API or a JSON file.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use slide_core::Action;
use slide_core::GenerationSession;
use slide_protocol::Presentation;
use tracing::info;

use crate::app::run_app;
use crate::app::AppOptions;
use crate::app::StartScreen;
use crate::theme::ThemeRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewSource {
    Remote(i64),
    File(PathBuf),
}

/// Reads a presentation saved as JSON. The id is dropped so edits made to a
/// local copy are never sent to the server.
pub fn read_presentation_file(path: &Path) -> Result<Presentation> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut presentation: Presentation = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a presentation", path.display()))?;
    presentation.id = None;
    Ok(presentation)
}

pub fn write_presentation_file(path: &Path, presentation: &Presentation) -> Result<()> {
    let json = serde_json::to_string_pretty(presentation)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Loads `source` into the session and shows it until the user quits. Edits
/// to a remote presentation are saved as they are made; edits to a file are
/// written back when the viewer closes.
pub async fn run_preview(
    mut session: GenerationSession,
    registry: ThemeRegistry,
    source: PreviewSource,
    editable: bool,
) -> Result<GenerationSession> {
    let original = match &source {
        PreviewSource::Remote(id) => {
            session.load_presentation(*id).await?;
            if let Some(error) = session.state().error() {
                bail!("could not load presentation {id}: {error}");
            }
            None
        }
        PreviewSource::File(path) => {
            let presentation = read_presentation_file(path)?;
            session.dispatch(Action::PresentationLoaded(presentation.clone()))?;
            Some(presentation)
        }
    };

    let options = AppOptions {
        editable,
        allow_compose: false,
        ..AppOptions::default()
    };
    let session = run_app(session, registry, options, StartScreen::Viewer).await?;

    if let (PreviewSource::File(path), Some(original)) = (&source, original) {
        if let Some(edited) = session.state().presentation() {
            if edited.slides != original.slides {
                info!("writing edited slides back to {}", path.display());
                write_presentation_file(path, edited)?;
            }
        }
    }
    Ok(session)
}
