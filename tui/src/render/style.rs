//! Token-to-terminal conversions shared by the renderers.

use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Flex;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;

use super::RenderContext;
use crate::theme::Em;
use crate::theme::FontStyle;
use crate::theme::Percent;
use crate::theme::Rgb;
use crate::theme::TextAlign;
use crate::theme::TextTransform;
use crate::theme::VerticalPosition;

/// Weights from semibold up render bold.
pub fn weight(weight: u16) -> Modifier {
    if weight >= 600 {
        Modifier::BOLD
    } else {
        Modifier::empty()
    }
}

pub fn title(ctx: &RenderContext<'_>) -> Style {
    let typography = &ctx.theme.typography;
    Style::default()
        .fg(ctx.colors.text_primary.into())
        .add_modifier(weight(typography.title_weight))
}

pub fn heading(ctx: &RenderContext<'_>) -> Style {
    Style::default()
        .fg(ctx.colors.text_primary.into())
        .add_modifier(weight(ctx.theme.typography.heading_weight))
}

pub fn body(ctx: &RenderContext<'_>) -> Style {
    Style::default()
        .fg(ctx.colors.text_primary.into())
        .add_modifier(weight(ctx.theme.typography.body_weight))
}

pub fn secondary(ctx: &RenderContext<'_>) -> Style {
    Style::default().fg(ctx.colors.text_secondary.into())
}

pub fn accent(ctx: &RenderContext<'_>) -> Style {
    Style::default().fg(ctx.colors.accent.into())
}

pub fn quote(ctx: &RenderContext<'_>) -> Style {
    let style = body(ctx);
    match ctx.theme.typography.quote_style {
        FontStyle::Italic => style.add_modifier(Modifier::ITALIC),
        FontStyle::Normal => style,
    }
}

pub fn transform(text: &str, transform: TextTransform) -> String {
    match transform {
        TextTransform::None => text.to_string(),
        TextTransform::Uppercase => text.to_uppercase(),
        TextTransform::Lowercase => text.to_lowercase(),
        TextTransform::Capitalize => text
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Wide letter spacing becomes one blank cell between letters; tighter
/// spacing cannot be expressed on a grid and is left alone.
pub fn letter_space(text: &str, spacing: Em) -> String {
    if !spacing.is_spaced() {
        return text.to_string();
    }
    let mut spaced = String::with_capacity(text.len() * 2);
    for (i, c) in text.chars().enumerate() {
        if i > 0 && c != ' ' {
            spaced.push(' ');
        }
        spaced.push(c);
    }
    spaced
}

/// Word-wraps `text` to `width` columns, keeping explicit line breaks.
pub fn wrap(text: &str, width: u16) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    text.split('\n')
        .flat_map(|line| {
            let wrapped = textwrap::wrap(line, width as usize);
            if wrapped.is_empty() {
                vec![String::new()]
            } else {
                wrapped.into_iter().map(|cow| cow.into_owned()).collect()
            }
        })
        .collect()
}

pub fn flex(position: VerticalPosition) -> Flex {
    match position {
        VerticalPosition::Top => Flex::Start,
        VerticalPosition::Center => Flex::Center,
        VerticalPosition::Bottom => Flex::End,
    }
}

/// Stacks blocks of the given heights in `area`, `gap` rows apart,
/// positioned per the theme's vertical position.
pub fn stack(area: Rect, heights: &[u16], gap: u16, position: VerticalPosition) -> Vec<Rect> {
    Layout::vertical(heights.iter().map(|h| Constraint::Length(*h)))
        .flex(flex(position))
        .spacing(gap)
        .split(area)
        .to_vec()
}

/// Narrows `area` to `max_width` of its width, aligned like the content.
pub fn content_width(area: Rect, max_width: Percent, align: TextAlign) -> Rect {
    let width = max_width.of(area.width).max(1).min(area.width);
    let flex = match align {
        TextAlign::Left => Flex::Start,
        TextAlign::Center => Flex::Center,
        TextAlign::Right => Flex::End,
    };
    let [narrowed] = Layout::horizontal([Constraint::Length(width)])
        .flex(flex)
        .areas(area);
    narrowed
}

/// Sets the background of every cell in `area`.
pub fn fill(buf: &mut Buffer, area: Rect, color: Rgb) {
    buf.set_style(area.intersection(buf.area), Style::default().bg(color.into()));
}

/// Draws a horizontal run of `symbol` starting at (`x`, `y`), clipped to
/// the buffer.
pub fn hline(buf: &mut Buffer, x: u16, y: u16, len: u16, symbol: &str, style: Style) {
    let area = buf.area;
    if y < area.top() || y >= area.bottom() {
        return;
    }
    for col in x..x.saturating_add(len).min(area.right()) {
        if col >= area.left() {
            if let Some(cell) = buf.cell_mut((col, y)) {
                cell.set_symbol(symbol).set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transforms_titles() {
        assert_eq!(transform("hello world", TextTransform::Uppercase), "HELLO WORLD");
        assert_eq!(transform("hello world", TextTransform::Capitalize), "Hello World");
        assert_eq!(transform("Hello", TextTransform::None), "Hello");
    }

    #[test]
    fn spaces_letters_only_when_wide() {
        assert_eq!(letter_space("AI now", Em(0.05)), "A I  n o w");
        assert_eq!(letter_space("AI", Em(-0.02)), "AI");
    }

    #[test]
    fn wraps_and_keeps_breaks() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("a\n\nb", 10), vec!["a", "", "b"]);
        assert!(wrap("anything", 0).is_empty());
    }

    #[test]
    fn stacks_blocks_by_vertical_position() {
        let area = Rect::new(0, 0, 10, 10);
        let top = stack(area, &[2, 2], 1, VerticalPosition::Top);
        assert_eq!(top[0].y, 0);
        assert_eq!(top[1].y, 3);
        let center = stack(area, &[2, 2], 1, VerticalPosition::Center);
        assert!(center[0].y > 0);
        assert_eq!(center[1].y - center[0].y, 3);
        let bottom = stack(area, &[2, 2], 1, VerticalPosition::Bottom);
        assert_eq!(bottom[1].bottom(), 10);
    }

    #[test]
    fn narrows_content_width() {
        let area = Rect::new(0, 0, 100, 5);
        let narrowed = content_width(area, Percent(0.8), TextAlign::Center);
        assert_eq!(narrowed.width, 80);
        assert_eq!(narrowed.x, 10);
        assert_eq!(content_width(area, Percent(1.0), TextAlign::Left), area);
    }
}
