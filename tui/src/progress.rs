//! Live view of a generation run: header, progress gauge and the agent's
//! event log.

use std::time::Duration;

use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Gauge;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use serde_json::Value;
use slide_core::GenerationState;
use slide_core::Phase;
use slide_protocol::GenerationEvent;
use slide_protocol::ToolName;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Slide count assumed when the request did not name one.
const ASSUMED_SLIDES: u32 = 5;
/// The gauge stops here until the run completes.
const PROGRESS_CAP: f64 = 0.9;

pub fn type_icon(slide_type: Option<&str>) -> &'static str {
    match slide_type {
        Some("title") => "🎯",
        Some("bullets") => "📝",
        Some("content") => "📄",
        Some("quote") => "💬",
        Some("section") => "📑",
        _ => "📊",
    }
}

/// `42s` under a minute, `3m 05s` after.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Share of the run done, from slides added against the requested count.
pub fn progress_ratio(state: &GenerationState) -> f64 {
    if state.phase() == Phase::Completed {
        return 1.0;
    }
    let target = state.requested_slide_count().unwrap_or(ASSUMED_SLIDES).max(1);
    (state.streamed_slide_count() as f64 / target as f64).min(PROGRESS_CAP)
}

pub struct AgentProgress<'a> {
    state: &'a GenerationState,
    /// Animation frame counter, advanced by the caller.
    tick: usize,
}

impl<'a> AgentProgress<'a> {
    pub fn new(state: &'a GenerationState, tick: usize) -> Self {
        Self { state, tick }
    }

    fn spinner(&self) -> Span<'static> {
        Span::styled(SPINNER[self.tick % SPINNER.len()], Style::default().fg(Color::Cyan))
    }

    pub fn header(&self) -> &'static str {
        if self.state.phase() == Phase::Completed {
            "Presentation ready!"
        } else {
            "Creating your slides..."
        }
    }

    /// Time since the run started, shown only while it is generating.
    pub fn elapsed(&self) -> Option<String> {
        if !self.state.is_generating() {
            return None;
        }
        self.state.run().map(|run| format_elapsed(run.elapsed()))
    }

    /// One row per visible event, oldest first.
    pub fn rows(&self) -> Vec<Line<'static>> {
        let history = self.state.history();
        let visible: Vec<&GenerationEvent> = history
            .iter()
            .filter(|event| !matches!(event, GenerationEvent::ToolResult(_)))
            .collect();
        if visible.is_empty() {
            return vec![Line::from(vec![self.spinner(), " Starting...".dim()])];
        }
        let last = visible.len() - 1;
        visible
            .into_iter()
            .enumerate()
            .filter_map(|(i, event)| self.row(event, i == last && self.state.is_generating()))
            .collect()
    }

    fn row(&self, event: &GenerationEvent, active: bool) -> Option<Line<'static>> {
        let done = Span::styled("✓", Style::default().fg(Color::Green));
        let line = match event {
            GenerationEvent::Thinking { message, .. } => Line::from(vec![
                if active { self.spinner() } else { "•".dim() },
                " ".into(),
                Span::styled(message.clone(), Style::default().add_modifier(Modifier::ITALIC)),
            ]),
            GenerationEvent::ToolCall(call) => match &call.tool {
                ToolName::AddSlide => {
                    let mut spans = vec![
                        if active { self.spinner() } else { done },
                        format!(" {} ", type_icon(call.slide_type())).into(),
                        Span::styled(
                            format!("Slide {}", call.slide_number.unwrap_or_default()),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        format!(" {}", call.slide_type().unwrap_or("content")).dim(),
                    ];
                    if let Some(title) = call.title() {
                        spans.push(format!("  {title}").into());
                    }
                    Line::from(spans)
                }
                ToolName::FinishPresentation => {
                    let title = call
                        .args
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or("Presentation");
                    Line::from(vec![
                        if active { self.spinner() } else { done },
                        format!(" Finalizing: {title}").into(),
                    ])
                }
                ToolName::Other(_) => return None,
            },
            GenerationEvent::Complete(completion) => {
                let title = completion
                    .title
                    .clone()
                    .or_else(|| completion.presentation.as_ref().map(|p| p.title.clone()))
                    .unwrap_or_else(|| "Presentation".to_string());
                let count = completion
                    .slide_count
                    .map(|n| n as usize)
                    .or_else(|| completion.presentation.as_ref().map(|p| p.slides.len()))
                    .unwrap_or_else(|| self.state.streamed_slide_count());
                Line::from(vec![
                    "🎉 ".into(),
                    Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
                    format!("  {count} slides created").dim(),
                ])
            }
            GenerationEvent::Error { .. } => Line::from(vec![
                "✗ ".red(),
                event.error_message().unwrap_or_default().to_string().red(),
            ]),
            GenerationEvent::ToolResult(_) | GenerationEvent::Opaque { .. } => return None,
        };
        Some(line)
    }
}

impl Widget for AgentProgress<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from(self.header()).bold());
        if let Some(elapsed) = self.elapsed() {
            block = block.title_top(Line::from(elapsed).dim().right_aligned());
        }
        let inner = block.inner(area);
        block.render(area, buf);

        let [gauge_area, events_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)])
                .spacing(1)
                .areas(inner);
        let ratio = progress_ratio(self.state);
        let target = self
            .state
            .requested_slide_count()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(ratio)
            .label(format!(
                "{} / {target} slides",
                self.state.streamed_slide_count()
            ))
            .render(gauge_area, buf);

        let mut rows = self.rows();
        if let Some(error) = self.state.error() {
            let shown = rows
                .iter()
                .any(|row| row.spans.iter().any(|span| span.content == error));
            if !shown {
                rows.push(Line::from(vec!["✗ ".red(), error.to_string().red()]));
            }
        }
        let skip = rows.len().saturating_sub(events_area.height as usize);
        Paragraph::new(rows.split_off(skip)).render(events_area, buf);
    }
}
