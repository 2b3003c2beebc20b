use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthStr;

use crate::theme::BulletStyle;
use crate::theme::Px;
use crate::theme::Rgb;

/// Marker sizes from this up use the heavy glyph.
const LARGE: Px = Px(12.0);
/// Number markers from this size up are drawn as a filled badge.
const BADGE: Px = Px(24.0);

/// The glyph in front of a bullet point.
#[derive(Debug, Clone, Copy)]
pub struct BulletMarker {
    style: BulletStyle,
    size: Px,
    color: Rgb,
    /// Zero-based position in the list, for numbered bullets.
    index: usize,
}

impl BulletMarker {
    pub fn new(style: BulletStyle, size: Px, color: Rgb, index: usize) -> Self {
        Self {
            style,
            size,
            color,
            index,
        }
    }

    pub fn symbol(&self) -> String {
        let large = self.size >= LARGE;
        match self.style {
            BulletStyle::Disc if large => "●".to_string(),
            BulletStyle::Disc => "•".to_string(),
            BulletStyle::Square if large => "■".to_string(),
            BulletStyle::Square => "▪".to_string(),
            BulletStyle::Dash => "—".to_string(),
            BulletStyle::Arrow => ">".to_string(),
            BulletStyle::Check => "✓".to_string(),
            BulletStyle::Number if self.size >= BADGE => format!(" {} ", self.index + 1),
            BulletStyle::Number => format!("{}.", self.index + 1),
        }
    }

    pub fn width(&self) -> u16 {
        self.symbol().width() as u16
    }

    fn style(&self) -> Style {
        if self.style == BulletStyle::Number && self.size >= BADGE {
            let text = if self.color.luminance() > 0.6 {
                Rgb::BLACK
            } else {
                Rgb::WHITE
            };
            Style::default()
                .fg(text.into())
                .bg(self.color.into())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.color.into())
        }
    }
}

impl Widget for BulletMarker {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Span::styled(self.symbol(), self.style()).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: Rgb = Rgb(0x25, 0x63, 0xeb);

    fn symbol(style: BulletStyle, size: f32, index: usize) -> String {
        BulletMarker::new(style, Px(size), BLUE, index).symbol()
    }

    #[test]
    fn glyph_per_style() {
        assert_eq!(symbol(BulletStyle::Disc, 10.0, 0), "•");
        assert_eq!(symbol(BulletStyle::Disc, 12.0, 0), "●");
        assert_eq!(symbol(BulletStyle::Square, 8.0, 0), "▪");
        assert_eq!(symbol(BulletStyle::Dash, 20.0, 0), "—");
        assert_eq!(symbol(BulletStyle::Arrow, 16.0, 0), ">");
        assert_eq!(symbol(BulletStyle::Check, 14.0, 0), "✓");
    }

    #[test]
    fn numbers_are_one_based() {
        assert_eq!(symbol(BulletStyle::Number, 16.0, 0), "1.");
        assert_eq!(symbol(BulletStyle::Number, 24.0, 2), " 3 ");
    }

    #[test]
    fn badge_is_filled_with_the_marker_color() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 4, 1));
        BulletMarker::new(BulletStyle::Number, Px(24.0), BLUE, 0).render(buf.area, &mut buf);
        assert_eq!(buf[(1, 0)].symbol(), "1");
        assert_eq!(buf[(1, 0)].bg, BLUE.into());
        assert_eq!(buf[(1, 0)].fg, Rgb::WHITE.into());
    }
}
