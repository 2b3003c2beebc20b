//! Painting slides into a ratatui [`Buffer`].
//!
//! Every renderer reads theme tokens through a [`RenderContext`] and draws
//! into the area it is given. Nothing here can fail: malformed content is
//! drawn as empty, never reported.

mod bullet;
mod chart;
mod container;
mod editable;
mod field;
mod pattern;
pub mod style;

pub use bullet::BulletMarker;
pub use chart::ChartRenderer;
pub use chart::CHART_COLORS;
pub use container::ContainerLayout;
pub use container::SlideContainer;
pub use editable::EditableText;
pub use editable::EditorKey;
pub use editable::TextEditor;
pub use field::editable_fields;
pub use field::FieldId;
pub use pattern::BackgroundPattern;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use slide_protocol::Slide;

use crate::theme::Rgb;
use crate::theme::ThemeColors;
use crate::theme::ThemeDefinition;

/// Text colors used over a slide image.
pub const IMAGE_TEXT_PRIMARY: Rgb = Rgb::WHITE;
pub const IMAGE_TEXT_SECONDARY: Rgb = Rgb(0xe5, 0xe5, 0xe5);

/// Draws one slide type.
pub trait SlideRenderer: Send + Sync {
    /// Stable identifier, used in logs and to tell renderers apart.
    fn name(&self) -> &'static str;

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer);
}

/// Everything a renderer needs besides the slide itself.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub theme: &'a ThemeDefinition,
    /// The theme colors, possibly overridden for the slide being drawn.
    pub colors: ThemeColors,
    pub editable: bool,
    /// The field the user has moved to, if any.
    pub selected: Option<FieldId>,
    /// The open editor, when the selected field is being edited.
    pub editor: Option<&'a TextEditor>,
}

impl<'a> RenderContext<'a> {
    pub fn new(theme: &'a ThemeDefinition) -> Self {
        Self {
            theme,
            colors: theme.colors,
            editable: false,
            selected: None,
            editor: None,
        }
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn selected(mut self, field: Option<FieldId>, editor: Option<&'a TextEditor>) -> Self {
        self.selected = field;
        self.editor = editor.filter(|editor| Some(editor.field()) == field);
        self
    }

    /// Context for drawing `slide`: a slide with an image gets light text so
    /// it stays readable over the image overlay.
    pub fn for_slide(&self, slide: &Slide) -> Self {
        let mut ctx = *self;
        if slide.image.url.is_some() {
            ctx.colors.text_primary = IMAGE_TEXT_PRIMARY;
            ctx.colors.text_secondary = IMAGE_TEXT_SECONDARY;
        }
        ctx
    }

    pub fn is_selected(&self, field: FieldId) -> bool {
        self.editable && self.selected == Some(field)
    }

    pub fn editor_for(&self, field: FieldId) -> Option<&'a TextEditor> {
        if self.editable {
            self.editor.filter(|editor| editor.field() == field)
        } else {
            None
        }
    }
}

/// Resolves the renderer for `slide` and draws it.
pub fn render_slide(
    registry: &crate::theme::ThemeRegistry,
    theme_name: &str,
    slide: &Slide,
    ctx: &RenderContext<'_>,
    area: Rect,
    buf: &mut Buffer,
) {
    let ctx = ctx.for_slide(slide);
    registry
        .renderer_for(theme_name, slide)
        .render(slide, &ctx, area, buf);
}
