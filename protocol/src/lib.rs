//! Wire data model shared by the generation client, the session reducer and
//! the renderers.

pub mod event;
pub mod patch;
pub mod presentation;
pub mod slide;
pub mod template;

pub use event::*;
pub use patch::*;
pub use presentation::*;
pub use slide::*;
pub use template::*;
