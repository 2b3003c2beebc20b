//! HTTP side of slidestream: the generation stream and the persistence and
//! template endpoints.

mod client;
mod error;
pub mod interpret;
pub mod sse;

pub use client::GenerationStream;
pub use client::SlidesClient;
pub use error::ClientError;
pub use interpret::events;
pub use interpret::interpret;
pub use sse::payloads;
pub use sse::SseDecoder;
