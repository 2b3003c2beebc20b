//! Session state for slidestream: the generation reducer, the edit
//! reconciler and the session that ties them to a backend.

pub mod backend;
pub mod error;
pub mod reconcile;
pub mod session;
pub mod state;

pub use backend::GenerationInput;
pub use backend::SlidesBackend;
pub use error::Result;
pub use error::SlideError;
pub use error::StateError;
pub use reconcile::EditOutcome;
pub use reconcile::PendingSave;
pub use session::GenerationSession;
pub use state::Action;
pub use state::GenerationState;
pub use state::Phase;
pub use state::RunInfo;
