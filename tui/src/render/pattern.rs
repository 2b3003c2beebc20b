use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;

use crate::theme::BackgroundPatternKind;
use crate::theme::Rgb;

/// Decorative tiling drawn between a slide's background and its content.
///
/// Only blank cells are touched, so drawing the pattern over text already
/// in place leaves the text alone.
#[derive(Debug, Clone, Copy)]
pub struct BackgroundPattern {
    kind: BackgroundPatternKind,
    tint: Rgb,
}

impl BackgroundPattern {
    /// `accent` blended into `background` at `opacity`.
    pub fn new(kind: BackgroundPatternKind, accent: Rgb, background: Rgb, opacity: f32) -> Self {
        Self {
            kind,
            tint: background.mix(accent, opacity),
        }
    }

    pub fn tint(&self) -> Rgb {
        self.tint
    }

    /// The glyph at `(x, y)` relative to the pattern's origin, if any. For
    /// scanlines the row is tinted instead.
    fn glyph(&self, x: u16, y: u16) -> Option<&'static str> {
        match self.kind {
            BackgroundPatternKind::None | BackgroundPatternKind::Scanlines => None,
            BackgroundPatternKind::Dots => (x % 4 == 0 && y % 2 == 0).then_some("·"),
            BackgroundPatternKind::Grid => match (x % 8 == 0, y % 4 == 0) {
                (true, true) => Some("┼"),
                (true, false) => Some("│"),
                (false, true) => Some("─"),
                (false, false) => None,
            },
            BackgroundPatternKind::Noise => (noise(x, y) % 7 == 0).then_some("░"),
        }
    }
}

fn noise(x: u16, y: u16) -> u32 {
    let mut h = (x as u32).wrapping_mul(73_856_093) ^ (y as u32).wrapping_mul(19_349_663);
    h ^= h >> 13;
    h = h.wrapping_mul(0x5bd1_e995);
    h ^ (h >> 15)
}

impl Widget for BackgroundPattern {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if self.kind == BackgroundPatternKind::None {
            return;
        }
        let style = Style::default().fg(self.tint.into());
        for y in area.top()..area.bottom() {
            let row = y - area.top();
            if self.kind == BackgroundPatternKind::Scanlines {
                if row % 2 == 0 {
                    buf.set_style(
                        Rect::new(area.x, y, area.width, 1),
                        Style::default().bg(self.tint.into()),
                    );
                }
                continue;
            }
            for x in area.left()..area.right() {
                let Some(glyph) = self.glyph(x - area.left(), row) else {
                    continue;
                };
                if let Some(cell) = buf.cell_mut((x, y)) {
                    if cell.symbol() == " " {
                        cell.set_symbol(glyph).set_style(style);
                    }
                }
            }
        }
    }
}
