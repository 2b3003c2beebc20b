use ratatui::buffer::Buffer;
use ratatui::layout::Alignment;
use ratatui::layout::Margin;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols::border;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Widget;
use slide_protocol::SlideImage;

use super::BackgroundPattern;
use super::RenderContext;
use crate::theme::AccentBarPosition;
use crate::theme::BorderStyle;
use crate::theme::Px;
use crate::theme::Rgb;
use crate::theme::Shadow;
use crate::theme::ThemeDefinition;

/// Share of black laid over the theme background behind a slide image.
const IMAGE_OVERLAY: f32 = 0.7;

const DASHED: border::Set = border::Set {
    top_left: "┌",
    top_right: "┐",
    bottom_left: "└",
    bottom_right: "┘",
    vertical_left: "┆",
    vertical_right: "┆",
    horizontal_top: "┄",
    horizontal_bottom: "┄",
};

const DOTTED: border::Set = border::Set {
    top_left: "┌",
    top_right: "┐",
    bottom_left: "└",
    bottom_right: "┘",
    vertical_left: "┊",
    vertical_right: "┊",
    horizontal_top: "┈",
    horizontal_bottom: "┈",
};

/// Where the parts of a slide frame land inside the area it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerLayout {
    /// The slide itself, border included.
    pub frame: Rect,
    /// Offset shadow behind the frame.
    pub shadow: Option<Rect>,
    /// Glow ring around the frame.
    pub halo: Option<Rect>,
    pub accent_bar: Option<Rect>,
    /// Area left for content after border, accent bar and padding.
    pub inner: Rect,
}

/// The themed frame every slide is drawn in: background, border, shadow,
/// pattern and accent bar.
pub struct SlideContainer<'a> {
    theme: &'a ThemeDefinition,
    ctx: RenderContext<'a>,
    image: Option<&'a SlideImage>,
}

impl<'a> SlideContainer<'a> {
    pub fn new(ctx: &RenderContext<'a>, image: &'a SlideImage) -> Self {
        Self {
            theme: ctx.theme,
            ctx: *ctx,
            image: image.url.as_ref().map(|_| image),
        }
    }

    fn shadow(&self) -> Option<Shadow> {
        self.theme.style.shadow.as_deref().map(Shadow::parse)
    }

    /// The shadow as the web client writes it, for display in theme
    /// listings.
    pub fn shadow_css(&self) -> Option<String> {
        self.shadow()
            .map(|shadow| shadow.css(self.theme.colors.border_dark))
    }

    fn has_border(&self) -> bool {
        let style = &self.theme.style;
        style.border_style != BorderStyle::None && !style.border_width.is_zero()
    }

    pub fn layout(&self, area: Rect) -> ContainerLayout {
        let mut frame = area;
        let mut shadow = None;
        let mut halo = None;
        match self.shadow() {
            Some(Shadow::Offset { x, y, .. }) => {
                let dx = offset_cells(x, Px::cols).min(area.width.saturating_sub(1));
                let dy = offset_cells(y, Px::rows).min(area.height.saturating_sub(1));
                frame.width -= dx;
                frame.height -= dy;
                if dx > 0 || dy > 0 {
                    shadow = Some(Rect::new(frame.x + dx, frame.y + dy, frame.width, frame.height));
                }
            }
            Some(Shadow::Glow { .. }) if area.width > 4 && area.height > 4 => {
                frame = area.inner(Margin::new(1, 1));
                halo = Some(area);
            }
            _ => {}
        }

        let mut inner = if self.has_border() {
            frame.inner(Margin::new(1, 1))
        } else {
            frame
        };

        let style = &self.theme.style;
        let bar_rows = style.accent_bar_width.rows().max(1).min(inner.height);
        let bar_cols = style.accent_bar_width.cols().max(1).min(inner.width);
        let accent_bar = match style.accent_bar_position {
            AccentBarPosition::None => None,
            AccentBarPosition::Top => {
                let bar = Rect::new(inner.x, inner.y, inner.width, bar_rows);
                inner.y += bar_rows;
                inner.height -= bar_rows;
                Some(bar)
            }
            AccentBarPosition::Bottom => {
                inner.height -= bar_rows;
                Some(Rect::new(inner.x, inner.bottom(), inner.width, bar_rows))
            }
            AccentBarPosition::Left => {
                let bar = Rect::new(inner.x, inner.y, bar_cols, inner.height);
                inner.x += bar_cols;
                inner.width -= bar_cols;
                Some(bar)
            }
        }
        .filter(|bar| !bar.is_empty());

        if self.image.is_some() && inner.height > 1 {
            inner.height -= 1;
        }

        let padding = &self.theme.spacing.slide_padding;
        let pad_x = padding.cols().min(inner.width.saturating_sub(1) / 2);
        let pad_y = padding.rows().min(inner.height.saturating_sub(1) / 2);
        let inner = inner.inner(Margin::new(pad_x, pad_y));

        ContainerLayout {
            frame,
            shadow,
            halo,
            accent_bar,
            inner,
        }
    }

    /// Background color at a cell of `frame`.
    pub fn background_at(&self, frame: Rect, x: u16, y: u16) -> Rgb {
        let colors = &self.theme.colors;
        if self.image.is_some() {
            return colors.background.mix(Rgb::BLACK, IMAGE_OVERLAY);
        }
        match &self.theme.style.background_gradient {
            Some(gradient) => {
                let nx = unit(x - frame.x, frame.width);
                let ny = unit(y - frame.y, frame.height);
                gradient.sample(nx, ny)
            }
            None => colors.background,
        }
    }

    /// Draws the frame and returns the area left for content.
    pub fn render(&self, area: Rect, buf: &mut Buffer) -> Rect {
        let area = area.intersection(buf.area);
        let layout = self.layout(area);
        let colors = &self.theme.colors;

        if let Some(halo) = layout.halo {
            let glow = match self.shadow() {
                Some(Shadow::Glow {
                    color: Some((rgb, alpha)),
                    ..
                }) => colors.background.mix(rgb, alpha),
                _ => colors.background.mix(colors.accent, 0.15),
            };
            for y in halo.top()..halo.bottom() {
                for x in halo.left()..halo.right() {
                    if !layout.frame.contains((x, y).into()) {
                        paint(buf, x, y, glow);
                    }
                }
            }
        }
        if let Some(shadow) = layout.shadow {
            for y in shadow.top()..shadow.bottom() {
                for x in shadow.left()..shadow.right() {
                    if !layout.frame.contains((x, y).into()) {
                        paint(buf, x, y, colors.border_dark);
                    }
                }
            }
        }

        let frame = layout.frame;
        for y in frame.top()..frame.bottom() {
            for x in frame.left()..frame.right() {
                paint(buf, x, y, self.background_at(frame, x, y));
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_fg(self.ctx.colors.text_primary.into());
                }
            }
        }

        let style = &self.theme.style;
        let pattern_area = if self.has_border() {
            frame.inner(Margin::new(1, 1))
        } else {
            frame
        };
        BackgroundPattern::new(
            style.background_pattern,
            colors.accent,
            colors.background,
            style.pattern_opacity,
        )
        .render(pattern_area, buf);

        if self.has_border() {
            self.border_block().render(frame, buf);
        }

        if let Some(bar) = layout.accent_bar {
            buf.set_style(bar, Style::default().bg(colors.accent.into()));
        }

        if let Some(image) = self.image {
            self.render_image_caption(image, &layout, buf);
        }

        layout.inner
    }

    fn border_block(&self) -> Block<'static> {
        let style = &self.theme.style;
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.colors.border_dark.into()));
        match style.border_style {
            BorderStyle::Dashed => block.border_set(DASHED),
            BorderStyle::Dotted => block.border_set(DOTTED),
            _ if style.border_width >= Px(3.0) => block.border_type(BorderType::Thick),
            _ if !style.border_radius.is_zero() => block.border_type(BorderType::Rounded),
            _ => block.border_type(BorderType::Plain),
        }
    }

    /// The image itself cannot be shown; its description and credit go on
    /// the last row above the padding.
    fn render_image_caption(&self, image: &SlideImage, layout: &ContainerLayout, buf: &mut Buffer) {
        let row = Rect::new(
            layout.inner.x,
            (layout.inner.bottom() + self.theme.spacing.slide_padding.rows())
                .min(layout.frame.bottom().saturating_sub(2)),
            layout.inner.width,
            1,
        );
        let mut caption = format!("▣ {}", image.alt.as_deref().unwrap_or("image"));
        if let Some(credit) = &image.credit {
            caption.push_str(&format!("  Photo: {credit}"));
        }
        Line::from(caption)
            .style(Style::default().fg(self.ctx.colors.text_secondary.into()))
            .alignment(Alignment::Right)
            .render(row.intersection(layout.frame), buf);
    }
}

fn offset_cells(px: Px, to_cells: fn(Px) -> u16) -> u16 {
    if px.is_zero() {
        0
    } else {
        to_cells(px).max(1)
    }
}

fn unit(offset: u16, len: u16) -> f32 {
    if len <= 1 {
        0.0
    } else {
        offset as f32 / (len - 1) as f32
    }
}

fn paint(buf: &mut Buffer, x: u16, y: u16, color: Rgb) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_symbol(" ").set_bg(color.into());
    }
}
