//! Terminal front end: themes, slide renderers and the interactive app.

pub mod app;
mod app_event_sender;
pub mod preview;
pub mod progress;
pub mod render;
pub mod slides;
mod status_bar;
pub mod theme;

pub use app::run_app;
pub use app::AppOptions;
pub use app::StartScreen;
pub use app_event_sender::AppEvent;
pub use app_event_sender::AppEventSender;
pub use preview::run_preview;
pub use preview::PreviewSource;
pub use progress::AgentProgress;
pub use render::render_slide;
pub use render::RenderContext;
pub use theme::ThemeRegistry;
