use slide_client::ClientError;
use slide_protocol::GenerationEvent;
use tokio::sync::mpsc::UnboundedSender;

/// Results of background work, delivered to the app loop.
#[derive(Debug)]
pub enum AppEvent {
    /// One read of the generation stream. `None` means it ended.
    Generation(Option<Result<GenerationEvent, ClientError>>),
    /// A slide save finished.
    Saved(Result<(), ClientError>),
}

#[derive(Clone, Default)]
pub struct AppEventSender(Option<UnboundedSender<AppEvent>>);

impl AppEventSender {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self(Some(tx))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    pub fn send(&self, event: AppEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }
}
