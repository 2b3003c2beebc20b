use std::f64::consts::TAU;

use ratatui::buffer::Buffer;
use ratatui::layout::Alignment;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Flex;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols::Marker;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::canvas::Canvas;
use ratatui::widgets::canvas::Points;
use ratatui::widgets::Axis;
use ratatui::widgets::Bar;
use ratatui::widgets::BarChart;
use ratatui::widgets::BarGroup;
use ratatui::widgets::Chart;
use ratatui::widgets::Dataset;
use ratatui::widgets::GraphType;
use ratatui::widgets::Sparkline;
use ratatui::widgets::Widget;
use slide_protocol::ChartConfig;
use slide_protocol::ChartPoint;
use slide_protocol::ChartType;

use crate::theme::Rgb;
use crate::theme::ThemeColors;

/// Series colors used after the theme accent, in order.
pub const CHART_COLORS: [Rgb; 7] = [
    Rgb(0x0f, 0x0f, 0x0f),
    Rgb(0x6b, 0x72, 0x80),
    Rgb(0xfb, 0xbf, 0x24),
    Rgb(0x34, 0xd3, 0x99),
    Rgb(0x60, 0xa5, 0xfa),
    Rgb(0xf8, 0x71, 0x71),
    Rgb(0xa7, 0x8b, 0xfa),
];

/// Bar values are scaled by this before being handed to [`BarChart`],
/// which only takes integers.
const BAR_SCALE: f64 = 100.0;

/// Share of the pie radius cut out of a donut.
const DONUT_HOLE: f64 = 0.4 / 0.7;

/// Draws chart data as a terminal chart.
///
/// Nothing is drawn for empty data or a missing or unsupported chart type.
pub struct ChartRenderer<'a> {
    chart_type: Option<ChartType>,
    data: &'a [ChartPoint],
    config: ChartConfig,
    colors: ThemeColors,
}

impl<'a> ChartRenderer<'a> {
    pub fn new(
        chart_type: Option<ChartType>,
        data: &'a [ChartPoint],
        config: Option<&ChartConfig>,
        colors: ThemeColors,
    ) -> Self {
        Self {
            chart_type,
            data,
            config: config.cloned().unwrap_or_default(),
            colors,
        }
    }

    /// Whether anything would be drawn.
    pub fn is_drawable(&self) -> bool {
        !self.data.is_empty()
            && matches!(
                self.chart_type,
                Some(
                    ChartType::Bar
                        | ChartType::HorizontalBar
                        | ChartType::Line
                        | ChartType::Area
                        | ChartType::Pie
                        | ChartType::Donut
                )
            )
    }

    /// Color of the point at `index`: its own color if it parses, else the
    /// next one in the accent-led cycle.
    pub fn point_color(&self, index: usize) -> Rgb {
        self.data
            .get(index)
            .and_then(|point| point.color.as_deref())
            .and_then(|color| Rgb::parse(color).ok())
            .unwrap_or_else(|| match index % (CHART_COLORS.len() + 1) {
                0 => self.colors.accent,
                i => CHART_COLORS[i - 1],
            })
    }

    fn text(&self) -> Style {
        Style::default().fg(self.colors.text_primary.into())
    }

    fn render_bars(&self, area: Rect, buf: &mut Buffer, direction: Direction) {
        let bars: Vec<Bar> = self
            .data
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let color = self.point_color(i);
                let value_text = if self.config.show_values {
                    format_value(point.value)
                } else {
                    String::new()
                };
                Bar::default()
                    .value((point.value.max(0.0) * BAR_SCALE).round() as u64)
                    .text_value(value_text)
                    .label(Line::from(point.label.clone()))
                    .style(Style::default().fg(color.into()))
                    .value_style(
                        Style::default()
                            .fg(contrast(color).into())
                            .bg(color.into()),
                    )
            })
            .collect();
        let n = bars.len() as u16;
        let bar_width = match direction {
            Direction::Vertical => (area.width / n.max(1)).saturating_sub(1).clamp(1, 12),
            Direction::Horizontal => 1,
        };
        BarChart::default()
            .direction(direction)
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(1)
            .label_style(self.text())
            .render(area, buf);
    }

    fn render_line(&self, area: Rect, buf: &mut Buffer) {
        let points: Vec<(f64, f64)> = self
            .data
            .iter()
            .enumerate()
            .map(|(i, point)| (i as f64, point.value))
            .collect();
        let (low, high) = value_bounds(self.data);
        let last = self.data.len().saturating_sub(1);
        let x_labels: Vec<String> = [self.data.first(), self.data.get(last)]
            .into_iter()
            .flatten()
            .map(|point| point.label.clone())
            .collect();
        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(self.colors.accent.into()))
            .data(&points);
        let axis_style = Style::default().fg(self.colors.text_secondary.into());
        let mut x_axis = Axis::default()
            .style(axis_style)
            .bounds([0.0, (last as f64).max(1.0)])
            .labels(x_labels);
        if let Some(label) = &self.config.x_axis_label {
            x_axis = x_axis.title(label.clone());
        }
        let mut y_axis = Axis::default()
            .style(axis_style)
            .bounds([low, high])
            .labels([format_value(low), format_value(high)]);
        if let Some(label) = &self.config.y_axis_label {
            y_axis = y_axis.title(label.clone());
        }
        Chart::new(vec![dataset])
            .x_axis(x_axis)
            .y_axis(y_axis)
            .legend_position(None)
            .render(area, buf);
    }

    /// The series resampled to one value per column.
    fn render_area(&self, area: Rect, buf: &mut Buffer) {
        let values: Vec<u64> = (0..area.width)
            .map(|col| {
                let t = if area.width <= 1 {
                    0.0
                } else {
                    col as f64 / (area.width - 1) as f64
                };
                (interpolate(self.data, t).max(0.0) * BAR_SCALE).round() as u64
            })
            .collect();
        Sparkline::default()
            .data(&values)
            .style(Style::default().fg(self.colors.accent.into()))
            .render(area, buf);
    }

    fn render_pie(&self, area: Rect, buf: &mut Buffer, donut: bool) {
        let total: f64 = self.data.iter().map(|p| p.value.max(0.0)).sum();
        if total <= 0.0 || area.is_empty() {
            return;
        }
        // Cells are about twice as tall as wide.
        let width = area.width.min(area.height.saturating_mul(2));
        let [area] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);

        let mut bounds = Vec::with_capacity(self.data.len());
        let mut acc = 0.0;
        for point in self.data {
            acc += point.value.max(0.0) / total;
            bounds.push(acc);
        }
        let hole = if donut { DONUT_HOLE } else { 0.0 };
        let mut slices: Vec<Vec<(f64, f64)>> = vec![Vec::new(); self.data.len()];
        let cols = area.width as usize * 2;
        let rows = area.height as usize * 4;
        for row in 0..rows {
            for col in 0..cols {
                let x = (col as f64 + 0.5) / cols as f64 * 2.0 - 1.0;
                let y = 1.0 - (row as f64 + 0.5) / rows as f64 * 2.0;
                let r = x.hypot(y);
                if r > 1.0 || r < hole {
                    continue;
                }
                // Clockwise from twelve o'clock.
                let turn = x.atan2(y).rem_euclid(TAU) / TAU;
                let slice = bounds.iter().position(|b| turn < *b).unwrap_or(bounds.len() - 1);
                slices[slice].push((x, y));
            }
        }
        let colored: Vec<(Vec<(f64, f64)>, Rgb)> = slices
            .into_iter()
            .enumerate()
            .map(|(i, coords)| (coords, self.point_color(i)))
            .collect();
        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([-1.0, 1.0])
            .y_bounds([-1.0, 1.0])
            .paint(|ctx| {
                for (coords, color) in &colored {
                    ctx.draw(&Points {
                        coords,
                        color: (*color).into(),
                    });
                }
            })
            .render(area, buf);
    }

    fn legend(&self) -> Line<'static> {
        let mut spans = Vec::new();
        match self.chart_type {
            Some(ChartType::Line | ChartType::Area) => {
                let name = self.config.y_axis_label.clone().unwrap_or_else(|| "value".to_string());
                spans.push(Span::styled("■ ", Style::default().fg(self.colors.accent.into())));
                spans.push(Span::styled(name, self.text()));
            }
            _ => {
                for (i, point) in self.data.iter().enumerate() {
                    if i > 0 {
                        spans.push(Span::raw("  "));
                    }
                    spans.push(Span::styled(
                        "■ ",
                        Style::default().fg(self.point_color(i).into()),
                    ));
                    let label = if self.config.show_values
                        && matches!(self.chart_type, Some(ChartType::Pie | ChartType::Donut))
                    {
                        format!("{} ({})", point.label, format_value(point.value))
                    } else {
                        point.label.clone()
                    };
                    spans.push(Span::styled(label, self.text()));
                }
            }
        }
        Line::from(spans).alignment(Alignment::Center)
    }

    /// Axis names for chart kinds whose widget has no axis of its own.
    fn caption(&self) -> Option<Line<'static>> {
        if matches!(self.chart_type, Some(ChartType::Line)) {
            return None;
        }
        let parts: Vec<&str> = [&self.config.y_axis_label, &self.config.x_axis_label]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();
        (!parts.is_empty()).then(|| {
            Line::styled(
                parts.join(" by "),
                Style::default().fg(self.colors.text_secondary.into()),
            )
        })
    }
}

impl Widget for ChartRenderer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if !self.is_drawable() || area.is_empty() {
            return;
        }
        let caption = self.caption().filter(|_| area.height > 4);
        let legend = self.config.show_legend && area.height > 3;
        let [caption_area, plot, legend_area] = Layout::vertical([
            Constraint::Length(u16::from(caption.is_some())),
            Constraint::Min(1),
            Constraint::Length(u16::from(legend)),
        ])
        .areas(area);

        if let Some(caption) = caption {
            caption.render(caption_area, buf);
        }
        match self.chart_type {
            Some(ChartType::Bar) => self.render_bars(plot, buf, Direction::Vertical),
            Some(ChartType::HorizontalBar) => self.render_bars(plot, buf, Direction::Horizontal),
            Some(ChartType::Line) => self.render_line(plot, buf),
            Some(ChartType::Area) => self.render_area(plot, buf),
            Some(ChartType::Pie) => self.render_pie(plot, buf, false),
            Some(ChartType::Donut) => self.render_pie(plot, buf, true),
            Some(ChartType::Unsupported) | None => {}
        }
        if legend {
            self.legend().render(legend_area, buf);
        }
    }
}

/// `12`, `12.5`, `0.25`: no trailing zeros.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Y range that always includes zero and is never empty.
fn value_bounds(data: &[ChartPoint]) -> (f64, f64) {
    let low = data.iter().map(|p| p.value).fold(0.0_f64, f64::min);
    let high = data.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    if high - low < f64::EPSILON {
        (low, low + 1.0)
    } else {
        (low, high)
    }
}

/// Value at fraction `t` of the way through the series.
fn interpolate(data: &[ChartPoint], t: f64) -> f64 {
    match data {
        [] => 0.0,
        [only] => only.value,
        _ => {
            let pos = t.clamp(0.0, 1.0) * (data.len() - 1) as f64;
            let i = (pos.floor() as usize).min(data.len() - 2);
            let frac = pos - i as f64;
            data[i].value + (data[i + 1].value - data[i].value) * frac
        }
    }
}

fn contrast(color: Rgb) -> Rgb {
    if color.luminance() > 0.6 {
        Rgb::BLACK
    } else {
        Rgb::WHITE
    }
}
