//! One renderer per slide type.
//!
//! Each renderer draws the themed frame first and then stacks its blocks
//! inside it, `element_gap` apart. Optional fields only take space when
//! they have a value or the slide is being edited.

mod terminal;

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
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::WidgetRef;
use slide_protocol::ComparisonColumn;
use slide_protocol::Slide;
use slide_protocol::SlideContent;
use slide_protocol::SlideKind;

use crate::render::style;
use crate::render::BulletMarker;
use crate::render::ChartRenderer;
use crate::render::EditableText;
use crate::render::FieldId;
use crate::render::RenderContext;
use crate::render::SlideContainer;
use crate::render::SlideRenderer;
use crate::theme::Em;
use crate::theme::QuoteDecoration;
use crate::theme::RendererSet;
use crate::theme::SectionDivider;
use crate::theme::VerticalPosition;

pub use terminal::terminal_renderers;

const DEFAULT_BIG_NUMBER: &str = "10x";
const DIVIDER_WIDTH: usize = 8;
/// Columns between side-by-side blocks.
const COLUMN_GAP: u16 = 2;

/// Renderers shared by every theme that does not register its own.
pub fn standard_renderers() -> RendererSet {
    let content: Arc<dyn SlideRenderer> = Arc::new(ContentSlide);
    RendererSet::new(Arc::clone(&content))
        .with(SlideKind::Title, Arc::new(TitleSlide))
        .with(SlideKind::Content, content)
        .with(SlideKind::Bullets, Arc::new(BulletsSlide))
        .with(SlideKind::Quote, Arc::new(QuoteSlide))
        .with(SlideKind::Section, Arc::new(SectionSlide))
        .with(SlideKind::Chart, Arc::new(ChartSlide))
        .with(SlideKind::BigNumber, Arc::new(BigNumberSlide))
        .with(SlideKind::Comparison, Arc::new(ComparisonSlide))
        .with(SlideKind::Stats, Arc::new(StatsSlide))
        .with(SlideKind::Timeline, Arc::new(TimelineSlide))
        .with(SlideKind::TwoColumn, Arc::new(TwoColumnSlide))
}

type Draw<'a> = Box<dyn FnOnce(Rect, &mut Buffer) + 'a>;

/// Blocks of known height laid out top to bottom.
struct Stack<'a> {
    width: u16,
    blocks: Vec<(u16, Draw<'a>)>,
}

impl<'a> Stack<'a> {
    fn new(width: u16) -> Self {
        Self {
            width,
            blocks: Vec::new(),
        }
    }

    fn push(&mut self, height: u16, draw: impl FnOnce(Rect, &mut Buffer) + 'a) {
        self.blocks.push((height, Box::new(draw)));
    }

    fn text(&mut self, text: EditableText<'a>) {
        let height = text.height(self.width);
        self.push(height, move |area, buf| text.render_ref(area, buf));
    }

    fn line(&mut self, line: Line<'a>) {
        self.push(1, move |area, buf| line.render(area, buf));
    }

    fn height(&self, gap: u16) -> u16 {
        let rows: u16 = self.blocks.iter().map(|(h, _)| *h).sum();
        rows + gap * (self.blocks.len() as u16).saturating_sub(1)
    }

    fn render(self, area: Rect, buf: &mut Buffer, gap: u16, position: VerticalPosition) {
        let heights: Vec<u16> = self.blocks.iter().map(|(h, _)| *h).collect();
        let areas = style::stack(area, &heights, gap, position);
        for ((_, draw), area) in self.blocks.into_iter().zip(areas) {
            draw(area, buf);
        }
    }
}

/// Draws the slide frame and returns the content area.
fn frame(slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) -> Rect {
    let inner = SlideContainer::new(ctx, &slide.image).render(area, buf);
    let theme = ctx.theme;
    style::content_width(
        inner,
        theme.spacing.content_max_width,
        theme.layout.content_alignment,
    )
}

fn gap(ctx: &RenderContext<'_>) -> u16 {
    ctx.theme.spacing.element_gap.rows()
}

fn shows(ctx: &RenderContext<'_>, value: Option<&str>) -> bool {
    ctx.editable || value.is_some_and(|v| !v.is_empty())
}

/// Headline text of title and section slides.
fn title<'a>(ctx: &RenderContext<'a>, value: Option<&'a str>, placeholder: &'a str) -> EditableText<'a> {
    let typography = &ctx.theme.typography;
    let mut style = style::title(ctx);
    if typography.title_size.is_display() {
        style = style.add_modifier(Modifier::BOLD);
    }
    EditableText::new(value)
        .placeholder(placeholder)
        .style(style)
        .alignment(ctx.theme.layout.title_alignment)
        .transform(typography.title_transform)
        .letter_spacing(typography.title_letter_spacing)
        .field(ctx, FieldId::Title)
}

/// Title of a content-bearing slide.
fn heading<'a>(ctx: &RenderContext<'a>, value: Option<&'a str>, placeholder: &'a str) -> EditableText<'a> {
    let typography = &ctx.theme.typography;
    EditableText::new(value)
        .placeholder(placeholder)
        .style(style::heading(ctx))
        .alignment(ctx.theme.layout.title_alignment)
        .transform(typography.title_transform)
        .letter_spacing(typography.heading_letter_spacing)
        .field(ctx, FieldId::Title)
}

fn body<'a>(
    ctx: &RenderContext<'a>,
    value: Option<&'a str>,
    placeholder: &'a str,
    field: FieldId,
) -> EditableText<'a> {
    EditableText::new(value)
        .placeholder(placeholder)
        .style(style::body(ctx))
        .alignment(ctx.theme.layout.content_alignment)
        .field(ctx, field)
}

fn wrapped(text: &str, width: u16, style: Style) -> Vec<Line<'static>> {
    style::wrap(text, width)
        .into_iter()
        .map(|line| Line::styled(line, style))
        .collect()
}

/// Plain heading and body. Also draws slides of unknown type.
pub struct ContentSlide;

impl SlideRenderer for ContentSlide {
    fn name(&self) -> &'static str {
        "content"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let inner = frame(slide, ctx, area, buf);
        let mut stack = Stack::new(inner.width);
        stack.text(heading(ctx, slide.title(), "Slide Title"));
        stack.text(body(
            ctx,
            FieldId::Body.value(slide),
            "Add content here...",
            FieldId::Body,
        ));
        stack.render(inner, buf, gap(ctx), ctx.theme.layout.vertical_position);
    }
}

pub struct TitleSlide;

impl SlideRenderer for TitleSlide {
    fn name(&self) -> &'static str {
        "title"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let inner = frame(slide, ctx, area, buf);
        let mut stack = Stack::new(inner.width);
        stack.text(title(ctx, slide.title(), "Presentation Title"));
        let subtitle = FieldId::Subtitle.value(slide);
        if shows(ctx, subtitle) {
            stack.text(
                body(ctx, subtitle, "Subtitle", FieldId::Subtitle)
                    .style(style::secondary(ctx))
                    .alignment(ctx.theme.layout.title_alignment),
            );
        }
        stack.render(inner, buf, gap(ctx), ctx.theme.layout.vertical_position);
    }
}

pub struct BulletsSlide;

impl SlideRenderer for BulletsSlide {
    fn name(&self) -> &'static str {
        "bullets"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let SlideContent::Bullets { bullets, .. } = &slide.content else {
            return ContentSlide.render(slide, ctx, area, buf);
        };
        let inner = frame(slide, ctx, area, buf);
        let mut stack = Stack::new(inner.width);
        stack.text(heading(ctx, slide.title(), "Slide Title"));

        let decorations = &ctx.theme.decorations;
        let mut items: Vec<Option<&str>> = bullets.iter().map(|b| Some(b.as_str())).collect();
        if items.is_empty() && ctx.editable {
            items.push(None);
        }
        let bullet_gap = ctx.theme.spacing.bullet_gap.rows();
        let mut list = Stack::new(inner.width);
        for (i, item) in items.into_iter().enumerate() {
            let marker = BulletMarker::new(
                decorations.bullet_style,
                decorations.bullet_size,
                ctx.colors.accent,
                i,
            );
            let indent = marker.width() + 1;
            let text = body(ctx, item, "Bullet point", FieldId::Bullet(i)).alignment(Alignment::Left);
            let height = text.height(inner.width.saturating_sub(indent));
            list.push(height, move |area, buf| {
                let [marker_area, text_area] =
                    Layout::horizontal([Constraint::Length(indent), Constraint::Fill(1)])
                        .areas(area);
                marker.render(marker_area, buf);
                text.render_ref(text_area, buf);
            });
        }
        if !list.blocks.is_empty() {
            let height = list.height(bullet_gap);
            stack.push(height, move |area, buf| {
                list.render(area, buf, bullet_gap, VerticalPosition::Top);
            });
        }
        stack.render(inner, buf, gap(ctx), ctx.theme.layout.vertical_position);
    }
}

pub struct QuoteSlide;

impl SlideRenderer for QuoteSlide {
    fn name(&self) -> &'static str {
        "quote"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let inner = frame(slide, ctx, area, buf);
        let mut stack = Stack::new(inner.width);
        let align = ctx.theme.layout.content_alignment;
        let accent = style::accent(ctx).add_modifier(Modifier::BOLD);
        let quote = body(ctx, FieldId::Quote.value(slide), "Enter quote...", FieldId::Quote)
            .style(style::quote(ctx));

        match ctx.theme.decorations.quote_style {
            QuoteDecoration::LargeMark => {
                stack.line(Line::styled("“", accent).alignment(align.into()));
                stack.text(quote);
            }
            QuoteDecoration::Icon => {
                stack.line(Line::styled("❝", accent).alignment(align.into()));
                stack.text(quote);
            }
            QuoteDecoration::AccentBar => {
                let quote = quote.alignment(Alignment::Left);
                let height = quote.height(inner.width.saturating_sub(2));
                stack.push(height, move |area, buf| {
                    let [bar, text] =
                        Layout::horizontal([Constraint::Length(2), Constraint::Fill(1)])
                            .areas(area);
                    for y in bar.top()..bar.bottom() {
                        style::hline(buf, bar.x, y, 1, "▎", accent);
                    }
                    quote.render_ref(text, buf);
                });
            }
            QuoteDecoration::None => stack.text(quote),
        }

        let attribution = FieldId::Attribution.value(slide);
        if shows(ctx, attribution) {
            stack.text(
                body(ctx, attribution, "— Attribution", FieldId::Attribution)
                    .prefix("— ")
                    .style(style::secondary(ctx)),
            );
        }
        stack.render(inner, buf, gap(ctx), ctx.theme.layout.vertical_position);
    }
}

pub struct SectionSlide;

impl SectionSlide {
    fn divider(ctx: &RenderContext<'_>) -> Option<Line<'static>> {
        let accent = style::accent(ctx);
        let line = match ctx.theme.decorations.section_divider {
            SectionDivider::None => return None,
            SectionDivider::Line => Line::styled("─".repeat(DIVIDER_WIDTH), accent),
            SectionDivider::AccentBlock => Line::styled("█".repeat(DIVIDER_WIDTH), accent),
            SectionDivider::Gradient => Line::from(
                (0..DIVIDER_WIDTH)
                    .map(|i| {
                        let t = i as f32 / DIVIDER_WIDTH as f32;
                        let color = ctx.colors.accent.mix(ctx.colors.background, t);
                        Span::styled("━", Style::default().fg(color.into()))
                    })
                    .collect::<Vec<_>>(),
            ),
        };
        Some(line.alignment(ctx.theme.layout.title_alignment.into()))
    }
}

impl SlideRenderer for SectionSlide {
    fn name(&self) -> &'static str {
        "section"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let inner = frame(slide, ctx, area, buf);
        let mut stack = Stack::new(inner.width);
        stack.text(title(ctx, slide.title(), "Section Title"));
        if let Some(divider) = Self::divider(ctx) {
            stack.line(divider);
        }
        stack.render(inner, buf, gap(ctx), ctx.theme.layout.vertical_position);
    }
}

pub struct ChartSlide;

impl SlideRenderer for ChartSlide {
    fn name(&self) -> &'static str {
        "chart"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let SlideContent::Chart {
            chart_type,
            chart_data,
            chart_config,
            ..
        } = &slide.content
        else {
            return ContentSlide.render(slide, ctx, area, buf);
        };
        let inner = frame(slide, ctx, area, buf);
        let heading = heading(ctx, slide.title(), "Chart Title");
        let [heading_area, chart_area] = Layout::vertical([
            Constraint::Length(heading.height(inner.width)),
            Constraint::Fill(1),
        ])
        .spacing(gap(ctx))
        .areas(inner);
        heading.render_ref(heading_area, buf);
        ChartRenderer::new(*chart_type, chart_data, chart_config.as_ref(), ctx.colors)
            .render(chart_area, buf);
    }
}

pub struct BigNumberSlide;

impl SlideRenderer for BigNumberSlide {
    fn name(&self) -> &'static str {
        "big_number"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let SlideContent::BigNumber {
            big_number_value,
            big_number_label,
            big_number_context,
            ..
        } = &slide.content
        else {
            return ContentSlide.render(slide, ctx, area, buf);
        };
        let inner = frame(slide, ctx, area, buf);
        let align = ctx.theme.layout.title_alignment;
        let mut stack = Stack::new(inner.width);
        stack.text(heading(ctx, slide.title(), "The Impact").style(style::secondary(ctx)));
        let value = big_number_value
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_BIG_NUMBER);
        stack.text(
            EditableText::new(Some(value))
                .style(style::accent(ctx).add_modifier(Modifier::BOLD))
                .letter_spacing(Em::SPACED)
                .alignment(align),
        );
        if let Some(label) = big_number_label.as_deref().filter(|v| !v.is_empty()) {
            stack.text(EditableText::new(Some(label)).style(style::heading(ctx)).alignment(align));
        }
        if let Some(context) = big_number_context.as_deref().filter(|v| !v.is_empty()) {
            stack.text(EditableText::new(Some(context)).style(style::secondary(ctx)).alignment(align));
        }
        stack.render(inner, buf, gap(ctx), ctx.theme.layout.vertical_position);
    }
}

pub struct ComparisonSlide;

impl ComparisonSlide {
    fn defaults() -> [ComparisonColumn; 2] {
        [
            ComparisonColumn {
                title: "Before".to_string(),
                items: Vec::new(),
                highlight: false,
            },
            ComparisonColumn {
                title: "After".to_string(),
                items: Vec::new(),
                highlight: true,
            },
        ]
    }
}

impl SlideRenderer for ComparisonSlide {
    fn name(&self) -> &'static str {
        "comparison"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let SlideContent::Comparison {
            comparison_columns, ..
        } = &slide.content
        else {
            return ContentSlide.render(slide, ctx, area, buf);
        };
        let defaults = Self::defaults();
        let columns: &[ComparisonColumn] = if comparison_columns.is_empty() {
            &defaults
        } else {
            comparison_columns
        };

        let inner = frame(slide, ctx, area, buf);
        let mut stack = Stack::new(inner.width);
        stack.text(heading(ctx, slide.title(), "Before vs After"));

        let n = columns.len() as u16;
        let column_width = inner.width.saturating_sub(COLUMN_GAP * (n - 1)) / n;
        let text_width = column_width.saturating_sub(2);
        let rounded = !ctx.theme.style.border_radius.is_zero();
        let panels: Vec<(Line<'static>, Vec<Line<'static>>, Style)> = columns
            .iter()
            .map(|column| {
                let (border, title) = if column.highlight {
                    (style::accent(ctx), style::accent(ctx).add_modifier(Modifier::BOLD))
                } else {
                    (
                        Style::default().fg(ctx.colors.border_dark.into()),
                        style::heading(ctx),
                    )
                };
                let items = column
                    .items
                    .iter()
                    .flat_map(|item| wrapped(&format!("• {item}"), text_width, style::body(ctx)))
                    .collect();
                (Line::styled(column.title.clone(), title), items, border)
            })
            .collect();
        let height = panels.iter().map(|(_, items, _)| items.len() as u16).max().unwrap_or(0) + 3;
        stack.push(height, move |area, buf| {
            let areas = Layout::horizontal(panels.iter().map(|_| Constraint::Fill(1)))
                .spacing(COLUMN_GAP)
                .split(area);
            for ((title, items, border), area) in panels.into_iter().zip(areas.iter()) {
                let block = Block::bordered()
                    .border_style(border)
                    .border_type(if rounded {
                        BorderType::Rounded
                    } else {
                        BorderType::Plain
                    });
                let mut lines = vec![title];
                lines.extend(items);
                Paragraph::new(lines).block(block).render(*area, buf);
            }
        });
        stack.render(inner, buf, gap(ctx), ctx.theme.layout.vertical_position);
    }
}

pub struct StatsSlide;

impl StatsSlide {
    /// Grid columns for `n` stats.
    pub fn columns(n: usize) -> usize {
        match n {
            0..=2 => 2,
            3 => 3,
            _ => 4,
        }
    }
}

impl SlideRenderer for StatsSlide {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let SlideContent::Stats { stats, .. } = &slide.content else {
            return ContentSlide.render(slide, ctx, area, buf);
        };
        let inner = frame(slide, ctx, area, buf);
        let mut stack = Stack::new(inner.width);
        stack.text(heading(ctx, slide.title(), "Key Metrics"));

        let cols = Self::columns(stats.len());
        let cell_width = inner
            .width
            .saturating_sub(COLUMN_GAP * (cols as u16 - 1))
            / cols as u16;
        let align: Alignment = ctx.theme.layout.content_alignment.into();
        for row in stats.chunks(cols) {
            let cells: Vec<Vec<Line<'static>>> = row
                .iter()
                .map(|stat| {
                    let mut lines = vec![
                        Line::styled(stat.value.clone(), style::accent(ctx).add_modifier(Modifier::BOLD)),
                        Line::styled(stat.label.clone(), style::heading(ctx)),
                    ];
                    if let Some(description) = stat.description.as_deref() {
                        lines.extend(wrapped(description, cell_width, style::secondary(ctx)));
                    }
                    lines
                })
                .collect();
            let height = cells.iter().map(Vec::len).max().unwrap_or(0) as u16;
            stack.push(height, move |area, buf| {
                let areas = Layout::horizontal((0..cols).map(|_| Constraint::Fill(1)))
                    .spacing(COLUMN_GAP)
                    .split(area);
                for (lines, area) in cells.into_iter().zip(areas.iter()) {
                    Paragraph::new(lines).alignment(align).render(*area, buf);
                }
            });
        }
        stack.render(inner, buf, gap(ctx), ctx.theme.layout.vertical_position);
    }
}

pub struct TimelineSlide;

impl SlideRenderer for TimelineSlide {
    fn name(&self) -> &'static str {
        "timeline"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let SlideContent::Timeline { timeline_items, .. } = &slide.content else {
            return ContentSlide.render(slide, ctx, area, buf);
        };
        let inner = frame(slide, ctx, area, buf);
        let mut stack = Stack::new(inner.width);
        stack.text(heading(ctx, slide.title(), "Timeline"));

        let text_width = inner.width.saturating_sub(2);
        let connector = Style::default().fg(ctx.colors.border.into());
        let mut entries = Stack::new(inner.width);
        for (i, item) in timeline_items.iter().enumerate() {
            if i > 0 {
                entries.line(Line::styled("│", connector));
            }
            let mut head = Vec::new();
            if let Some(date) = item.date.as_deref().filter(|d| !d.is_empty()) {
                head.push(Span::styled(
                    format!("{date}  "),
                    style::accent(ctx).add_modifier(Modifier::BOLD),
                ));
            }
            head.push(Span::styled(item.title.clone(), style::heading(ctx)));
            let mut lines = vec![Line::from(head)];
            if let Some(description) = item.description.as_deref() {
                lines.extend(wrapped(description, text_width, style::secondary(ctx)));
            }
            let marker = Span::styled("●", style::accent(ctx));
            entries.push(lines.len() as u16, move |area, buf| {
                let [marker_area, text_area] =
                    Layout::horizontal([Constraint::Length(2), Constraint::Fill(1)]).areas(area);
                marker.render(marker_area, buf);
                Paragraph::new(lines).render(text_area, buf);
            });
        }
        if !entries.blocks.is_empty() {
            stack.push(entries.height(0), move |area, buf| {
                entries.render(area, buf, 0, VerticalPosition::Top);
            });
        }
        stack.render(inner, buf, gap(ctx), ctx.theme.layout.vertical_position);
    }
}

pub struct TwoColumnSlide;

impl SlideRenderer for TwoColumnSlide {
    fn name(&self) -> &'static str {
        "two_column"
    }

    fn render(&self, slide: &Slide, ctx: &RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let inner = frame(slide, ctx, area, buf);
        let mut stack = Stack::new(inner.width);
        stack.text(heading(ctx, slide.title(), "Slide Title"));

        let width = inner.width.saturating_sub(COLUMN_GAP * 2) / 2;
        let column_gap = gap(ctx).min(1);
        let columns = [
            (FieldId::LeftTitle, "Left Title", FieldId::LeftBody),
            (FieldId::RightTitle, "Right Title", FieldId::RightBody),
        ]
        .map(|(title_field, placeholder, body_field)| {
            let mut column = Stack::new(width);
            let column_title = title_field.value(slide);
            if shows(ctx, column_title) {
                column.text(
                    body(ctx, column_title, placeholder, title_field)
                        .style(style::heading(ctx))
                        .alignment(Alignment::Left),
                );
            }
            column.text(
                body(ctx, body_field.value(slide), "Add content here...", body_field)
                    .alignment(Alignment::Left),
            );
            column
        });
        let height = columns.iter().map(|c| c.height(column_gap)).max().unwrap_or(0);
        stack.push(height, move |area, buf| {
            let areas = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)])
                .spacing(COLUMN_GAP * 2)
                .split(area);
            for (column, area) in columns.into_iter().zip(areas.iter()) {
                column.render(*area, buf, column_gap, VerticalPosition::Top);
            }
        });
        stack.render(inner, buf, gap(ctx), ctx.theme.layout.vertical_position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_slide;
    use crate::render::TextEditor;
    use crate::theme::ThemeRegistry;
    use serde_json::json;

    fn slide(value: serde_json::Value) -> Slide {
        serde_json::from_value(value).unwrap()
    }

    fn draw(theme: &str, slide: &Slide, editable: bool) -> String {
        let registry = ThemeRegistry::builtin().unwrap();
        let mut buf = Buffer::empty(Rect::new(0, 0, 80, 24));
        let ctx = RenderContext::new(registry.resolve_theme(theme)).editable(editable);
        render_slide(&registry, theme, slide, &ctx, buf.area, &mut buf);
        buffer_text(&buf)
    }

    fn buffer_text(buf: &Buffer) -> String {
        let mut text = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                text.push_str(buf[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn title_slide_shows_title_and_subtitle() {
        let text = draw(
            "minimal",
            &slide(json!({"type": "title", "title": "Quarterly Review", "subtitle": "2024"})),
            false,
        );
        assert!(text.contains("Quarterly Review"));
        assert!(text.contains("2024"));
    }

    #[test]
    fn placeholders_only_in_edit_mode() {
        let empty = slide(json!({"type": "title"}));
        let read_only = draw("minimal", &empty, false);
        assert!(read_only.contains("Presentation Title"));
        assert!(!read_only.contains("Subtitle"));
        assert!(draw("minimal", &empty, true).contains("Subtitle"));
    }

    #[test]
    fn bullets_get_markers() {
        let text = draw(
            "corporate",
            &slide(json!({"type": "bullets", "title": "Plan", "bullets": ["Hire", "Ship"]})),
            false,
        );
        assert!(text.contains("1. Hire") || text.contains(" 1  Hire"));
        assert!(text.contains("Ship"));
    }

    #[test]
    fn quote_decorations_follow_the_theme() {
        let quote = slide(json!({"type": "quote", "quote": "Less is more", "attribution": "Mies"}));
        let neo = draw("neobrutalism", &quote, false);
        assert!(neo.contains('“'));
        assert!(neo.contains("— Mies"));
        assert!(draw("playful", &quote, false).contains('❝'));
        assert!(draw("dark", &quote, false).contains('▎'));
        let minimal = draw("minimal", &quote, false);
        assert!(!minimal.contains('“') && !minimal.contains('▎'));
    }

    /// Whether one of the few rows under the row holding `anchor` contains
    /// `needle`.
    fn below(text: &str, anchor: &str, needle: &str) -> bool {
        let rows: Vec<&str> = text.lines().collect();
        let Some(at) = rows.iter().position(|row| row.contains(anchor)) else {
            return false;
        };
        rows.iter().skip(at + 1).take(3).any(|row| row.contains(needle))
    }

    #[test]
    fn section_dividers() {
        let section = slide(json!({"type": "section", "title": "Part Two"}));
        assert!(below(&draw("neobrutalism", &section, false), "Part Two", "████████"));
        assert!(below(&draw("corporate", &section, false), "Part Two", "────────"));
        assert!(below(&draw("dark", &section, false), "Part Two", "━━━━━━━━"));
        assert!(!below(&draw("minimal", &section, false), "Part Two", "────────"));
    }

    #[test]
    fn big_number_defaults() {
        let text = draw("minimal", &slide(json!({"type": "big_number"})), false);
        assert!(text.contains("1 0 x"));
        assert!(text.contains("The Impact"));
    }

    #[test]
    fn comparison_defaults_to_before_and_after() {
        let text = draw("minimal", &slide(json!({"type": "comparison"})), false);
        assert!(text.contains("Before"));
        assert!(text.contains("After"));
    }

    #[test]
    fn stats_grid_width() {
        assert_eq!(StatsSlide::columns(1), 2);
        assert_eq!(StatsSlide::columns(2), 2);
        assert_eq!(StatsSlide::columns(3), 3);
        assert_eq!(StatsSlide::columns(6), 4);
        let text = draw(
            "minimal",
            &slide(json!({"type": "stats", "stats": [
                {"value": 42, "label": "Users"},
                {"value": "3x", "label": "Speed", "description": "faster"}
            ]})),
            false,
        );
        assert!(text.contains("42"));
        assert!(text.contains("faster"));
    }

    #[test]
    fn timeline_lists_dated_items() {
        let text = draw(
            "minimal",
            &slide(json!({"type": "timeline", "title": "Road", "timeline_items": [
                {"title": "Alpha", "date": "Q1"},
                {"title": "Beta"}
            ]})),
            false,
        );
        assert!(text.contains("Q1  Alpha"));
        assert!(below(&text, "Alpha", "│"));
        assert!(below(&text, "│", "Beta"));
    }

    #[test]
    fn two_column_shows_both_sides() {
        let text = draw(
            "minimal",
            &slide(json!({"type": "two_column", "title": "Compare",
                "left_title": "Pros", "left_body": "Fast", "right_body": "Costly"})),
            false,
        );
        assert!(text.contains("Pros"));
        assert!(text.contains("Fast"));
        assert!(text.contains("Costly"));
        assert!(!text.contains("Right Title"));
    }

    #[test]
    fn unknown_type_renders_title_and_body() {
        let text = draw(
            "minimal",
            &slide(json!({"type": "hologram", "title": "Future", "body": "Soon"})),
            false,
        );
        assert!(text.contains("Future"));
        assert!(text.contains("Soon"));
    }

    #[test]
    fn empty_chart_draws_only_the_title() {
        let text = draw(
            "minimal",
            &slide(json!({"type": "chart", "title": "Sales", "chart_type": "bar"})),
            false,
        );
        assert!(text.contains("Sales"));
        assert!(!text.contains('■'));
    }

    #[test]
    fn open_editor_replaces_field_text() {
        let registry = ThemeRegistry::builtin().unwrap();
        let slide = slide(json!({"type": "content", "title": "Old", "body": "Body"}));
        let mut editor = TextEditor::new(FieldId::Title, Some("Old"));
        editor.insert('!');
        let ctx = RenderContext::new(registry.resolve_theme("minimal"))
            .editable(true)
            .selected(Some(FieldId::Title), Some(&editor));
        let mut buf = Buffer::empty(Rect::new(0, 0, 80, 24));
        render_slide(&registry, "minimal", &slide, &ctx, buf.area, &mut buf);
        assert!(buffer_text(&buf).contains("Old!"));
    }
}
