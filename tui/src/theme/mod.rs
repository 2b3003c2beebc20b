//! Theme definitions and the registry that maps theme names to renderers.
//!
//! A theme is a bag of design tokens. The tokens are written the way the
//! web client writes them (`"#ff90e8"`, `"16px"`, `"-0.02em"`, `"6xl"`) and
//! parsed into typed values when the table is loaded, so a bad token is a
//! load-time error and renderers never see strings they cannot interpret.

mod registry;
mod token;

pub use registry::*;
pub use token::*;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThemeDefinition {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub colors: ThemeColors,
    pub typography: Typography,
    pub style: ThemeStyle,
    pub spacing: Spacing,
    pub decorations: Decorations,
    pub layout: ThemeLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ThemeColors {
    pub background: Rgb,
    pub surface: Rgb,
    pub text_primary: Rgb,
    pub text_secondary: Rgb,
    pub accent: Rgb,
    pub accent_hover: Rgb,
    pub accent_light: Rgb,
    pub border: Rgb,
    pub border_dark: Rgb,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Typography {
    pub heading_font: String,
    pub body_font: String,
    pub title_size: TextSize,
    pub title_weight: u16,
    pub title_letter_spacing: Em,
    pub title_transform: TextTransform,
    pub title_line_height: f32,
    pub heading_size: TextSize,
    pub heading_weight: u16,
    pub heading_letter_spacing: Em,
    pub body_size: TextSize,
    pub body_weight: u16,
    pub body_line_height: f32,
    pub quote_size: TextSize,
    pub quote_style: FontStyle,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThemeStyle {
    pub border_width: Px,
    pub border_style: BorderStyle,
    pub border_radius: Px,
    #[serde(default)]
    pub shadow: Option<String>,
    pub accent_bar_position: AccentBarPosition,
    pub accent_bar_width: Px,
    pub background_pattern: BackgroundPatternKind,
    pub pattern_opacity: f32,
    #[serde(default)]
    pub background_gradient: Option<Gradient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Spacing {
    pub slide_padding: Px,
    pub element_gap: Px,
    pub bullet_gap: Px,
    pub content_max_width: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Decorations {
    pub bullet_style: BulletStyle,
    pub bullet_size: Px,
    pub quote_style: QuoteDecoration,
    pub section_divider: SectionDivider,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ThemeLayout {
    pub title_alignment: TextAlign,
    pub content_alignment: TextAlign,
    pub vertical_position: VerticalPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    None,
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccentBarPosition {
    None,
    Top,
    Bottom,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundPatternKind {
    None,
    Dots,
    Grid,
    Scanlines,
    Noise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletStyle {
    Disc,
    Square,
    Dash,
    Arrow,
    Number,
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteDecoration {
    None,
    LargeMark,
    AccentBar,
    Icon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionDivider {
    None,
    Line,
    AccentBlock,
    Gradient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalPosition {
    Top,
    Center,
    Bottom,
}

impl From<TextAlign> for ratatui::layout::Alignment {
    fn from(align: TextAlign) -> Self {
        match align {
            TextAlign::Left => ratatui::layout::Alignment::Left,
            TextAlign::Center => ratatui::layout::Alignment::Center,
            TextAlign::Right => ratatui::layout::Alignment::Right,
        }
    }
}
