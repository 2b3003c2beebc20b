use ratatui::buffer::Buffer;
use ratatui::layout::Alignment;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;

/// Bottom line of every screen: mode badge, status, theme and key hints.
pub struct StatusBar<'a> {
    mode: &'a str,
    status: &'a str,
    hints: &'a str,
    theme: Option<&'a str>,
    is_error: bool,
}

impl<'a> StatusBar<'a> {
    pub fn new(mode: &'a str, status: &'a str, hints: &'a str) -> Self {
        Self {
            mode,
            status,
            hints,
            theme: None,
            is_error: false,
        }
    }

    pub fn theme(mut self, theme: &'a str) -> Self {
        self.theme = Some(theme);
        self
    }

    /// Shows the status as an error.
    pub fn error(mut self, is_error: bool) -> Self {
        self.is_error = is_error;
        self
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let status_color = if self.is_error {
            Color::Red
        } else {
            Color::Yellow
        };
        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.mode),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(self.status, Style::default().fg(status_color)),
        ];
        if let Some(theme) = self.theme {
            spans.push(Span::raw("  |  "));
            spans.push(Span::styled(
                format!("theme: {theme}"),
                Style::default().fg(Color::Magenta),
            ));
        }
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(self.hints, Style::default().fg(Color::Gray)));
        Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Left)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_mode_status_theme_and_hints() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 80, 3));
        StatusBar::new("VIEW", "Saved", "q quit")
            .theme("dark")
            .error(true)
            .render(buf.area, &mut buf);
        let row: String = (0..80).map(|x| buf[(x, 1)].symbol()).collect();
        assert!(row.contains(" VIEW   Saved  |  theme: dark  |  q quit"));
        assert_eq!(buf[(2, 1)].bg, Color::Cyan);
        assert_eq!(buf[(9, 1)].fg, Color::Red);
    }
}
