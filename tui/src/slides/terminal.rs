//! Prompt-style layouts used by the `terminal` theme.

use std::sync::Arc;

use ratatui::buffer::Buffer;
use ratatui::layout::Alignment;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Widget;
use ratatui::widgets::WidgetRef;
use slide_protocol::Slide;
use slide_protocol::SlideKind;

use super::body;
use super::frame;
use super::gap;
use super::shows;
use super::standard_renderers;
use super::title;
use super::Stack;
use crate::render::style;
use crate::render::EditableText;
use crate::render::FieldId;
use crate::render::RenderContext;
use crate::render::SlideRenderer;
use crate::theme::RendererSet;
use crate::theme::VerticalPosition;

/// The standard set with title and section slides drawn as a shell session.
pub fn terminal_renderers() -> RendererSet {
    standard_renderers()
        .with(SlideKind::Title, Arc::new(PromptTitleSlide))
        .with(SlideKind::Section, Arc::new(PromptSectionSlide))
}

/// `text` behind a fixed-width prompt column.
fn prompted<'a>(stack: &mut Stack<'a>, prompt: Span<'a>, text: EditableText<'a>) {
    let indent = prompt.width() as u16;
    let height = text.height(stack.width.saturating_sub(indent));
    stack.push(height, move |area, buf| {
        let [prompt_area, text_area] =
            Layout::horizontal([Constraint::Length(indent), Constraint::Fill(1)]).areas(area);
        prompt.render(prompt_area, buf);
        text.render_ref(text_area, buf);
    });
}

pub struct PromptTitleSlide;

impl SlideRenderer for PromptTitleSlide {
    fn name(&self) -> &'static str {
        "terminal_title"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let inner = frame(slide, ctx, area, buf);
        let prompt = style::accent(ctx).add_modifier(Modifier::BOLD);
        let mut stack = Stack::new(inner.width);
        prompted(
            &mut stack,
            Span::styled("$ ", prompt),
            title(ctx, slide.title(), "Presentation Title").alignment(Alignment::Left),
        );
        let subtitle = FieldId::Subtitle.value(slide);
        if shows(ctx, subtitle) {
            prompted(
                &mut stack,
                Span::styled("# ", style::secondary(ctx)),
                body(ctx, subtitle, "Subtitle", FieldId::Subtitle)
                    .style(style::secondary(ctx))
                    .alignment(Alignment::Left),
            );
        }
        stack.line(Line::from(vec![
            Span::styled("$ ", prompt),
            Span::styled("▌", style::accent(ctx).add_modifier(Modifier::SLOW_BLINK)),
        ]));
        stack.render(inner, buf, gap(ctx), VerticalPosition::Center);
    }
}

pub struct PromptSectionSlide;

impl SlideRenderer for PromptSectionSlide {
    fn name(&self) -> &'static str {
        "terminal_section"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let inner = frame(slide, ctx, area, buf);
        let mut stack = Stack::new(inner.width);
        let title = title(ctx, slide.title(), "Section Title").alignment(Alignment::Left);
        let rule_width = title.lines(inner.width).iter().map(Line::width).max().unwrap_or(0) + 2;
        prompted(&mut stack, Span::styled("> ", style::accent(ctx)), title);
        stack.line(Line::styled(
            "─".repeat(rule_width),
            Style::default().fg(ctx.colors.border.into()),
        ));
        stack.render(inner, buf, gap(ctx), VerticalPosition::Center);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_slide;
    use crate::theme::ThemeRegistry;
    use serde_json::json;

    fn draw(slide: serde_json::Value) -> String {
        let registry = ThemeRegistry::builtin().unwrap();
        let slide: Slide = serde_json::from_value(slide).unwrap();
        let mut buf = Buffer::empty(Rect::new(0, 0, 80, 24));
        let ctx = RenderContext::new(registry.resolve_theme("terminal"));
        render_slide(&registry, "terminal", &slide, &ctx, buf.area, &mut buf);
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn title_reads_like_a_prompt() {
        let text = draw(json!({"type": "title", "title": "boot sequence", "subtitle": "v2"}));
        assert!(text.contains("$ BOOT SEQUENCE"));
        assert!(text.contains("# v2"));
        assert!(text.contains("$ ▌"));
    }

    #[test]
    fn section_gets_a_rule_under_the_prompt() {
        let text = draw(json!({"type": "section", "title": "next"}));
        let rows: Vec<&str> = text.lines().collect();
        let at = rows.iter().position(|row| row.contains("> NEXT")).unwrap();
        assert!(rows[at + 1..at + 3]
            .iter()
            .any(|row| row.contains(" ──────")));
    }
}
