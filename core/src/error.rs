use slide_client::ClientError;
use slide_protocol::PatchError;
use thiserror::Error;

/// A reducer action that does not apply to the current state.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("a generation run is already in progress")]
    RunInProgress,

    #[error("no presentation is loaded")]
    NoPresentation,

    #[error("slide {index} is out of range ({len} slides)")]
    SlideOutOfRange { index: usize, len: usize },

    #[error("no streamed slide with number {0}")]
    StreamedSlideNotFound(u32),

    #[error("the presentation is final; edit its slides instead")]
    NotStreaming,

    #[error("invalid slide edit: {0}")]
    InvalidPatch(#[from] PatchError),
}

#[derive(Error, Debug)]
pub enum SlideError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

pub type Result<T> = std::result::Result<T, SlideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slide_errors_show_their_source() {
        let state: SlideError = StateError::NoPresentation.into();
        assert_eq!(state.to_string(), "no presentation is loaded");

        let decode = serde_json::from_str::<u8>("x").unwrap_err();
        let client: SlideError = ClientError::Decode(decode).into();
        assert!(matches!(client, SlideError::Client(ClientError::Decode(_))));
    }
}
