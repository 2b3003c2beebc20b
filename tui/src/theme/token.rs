use std::fmt;

use ratatui::style::Color;
use serde::Deserialize;
use thiserror::Error;

/// Horizontal pixels covered by one terminal column.
pub const PX_PER_COL: f32 = 16.0;
/// Vertical pixels covered by one terminal row.
pub const PX_PER_ROW: f32 = 40.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} token {value:?}")]
pub struct TokenError {
    pub kind: &'static str,
    pub value: String,
}

impl TokenError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A `#rrggbb` (or `#rgb`) color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub fn parse(value: &str) -> Result<Self, TokenError> {
        let err = || TokenError::new("color", value);
        let hex = value.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| err());
        match hex.len() {
            6 => Ok(Rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Rgb(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(err()),
        }
    }

    /// Linear mix: `t = 0` is `self`, `t = 1` is `other`.
    pub fn mix(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb(
            lerp(self.0, other.0),
            lerp(self.1, other.1),
            lerp(self.2, other.2),
        )
    }

    /// Relative luminance in `0.0..=1.0`, good enough to pick a contrasting
    /// text color.
    pub fn luminance(self) -> f32 {
        (0.2126 * self.0 as f32 + 0.7152 * self.1 as f32 + 0.0722 * self.2 as f32) / 255.0
    }
}

impl TryFrom<String> for Rgb {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::parse(&value)
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb(rgb.0, rgb.1, rgb.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// A CSS pixel length (`"16px"`, or a bare `"0"`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize)]
#[serde(try_from = "String")]
pub struct Px(pub f32);

impl Px {
    pub fn parse(value: &str) -> Result<Self, TokenError> {
        let trimmed = value.trim();
        let number = trimmed.strip_suffix("px").unwrap_or(trimmed);
        if number != trimmed || number == "0" {
            if let Ok(px) = number.parse::<f32>() {
                if px.is_finite() && px >= 0.0 {
                    return Ok(Px(px));
                }
            }
        }
        Err(TokenError::new("size", value))
    }

    pub fn cols(self) -> u16 {
        (self.0 / PX_PER_COL).round() as u16
    }

    pub fn rows(self) -> u16 {
        (self.0 / PX_PER_ROW).round() as u16
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl TryFrom<String> for Px {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Px::parse(&value)
    }
}

/// Letter spacing in `em` (`"-0.02em"`, `"0"`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize)]
#[serde(try_from = "String")]
pub struct Em(pub f32);

impl Em {
    /// Spacing from which a terminal rendering inserts a blank cell between
    /// letters.
    pub const SPACED: Em = Em(0.05);

    pub fn parse(value: &str) -> Result<Self, TokenError> {
        let trimmed = value.trim();
        let number = trimmed.strip_suffix("em").unwrap_or(trimmed);
        match number.parse::<f32>() {
            Ok(em) if em.is_finite() && (number != trimmed || em == 0.0) => Ok(Em(em)),
            _ => Err(TokenError::new("letter spacing", value)),
        }
    }

    pub fn is_spaced(self) -> bool {
        self >= Self::SPACED
    }
}

impl TryFrom<String> for Em {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Em::parse(&value)
    }
}

/// A percentage in `(0, 100]`, stored as a fraction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize)]
#[serde(try_from = "String")]
pub struct Percent(pub f32);

impl Percent {
    pub fn parse(value: &str) -> Result<Self, TokenError> {
        match value.trim().strip_suffix('%').map(str::parse::<f32>) {
            Some(Ok(pct)) if pct > 0.0 && pct <= 100.0 => Ok(Percent(pct / 100.0)),
            _ => Err(TokenError::new("percentage", value)),
        }
    }

    pub fn of(self, width: u16) -> u16 {
        ((width as f32) * self.0).round() as u16
    }
}

impl TryFrom<String> for Percent {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Percent::parse(&value)
    }
}

/// A Tailwind-style text size step: `sm`, `base`, `lg`, `xl`, `2xl` … `9xl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct TextSize(u8);

impl TextSize {
    pub const XL: TextSize = TextSize(3);
    pub const XL5: TextSize = TextSize(7);

    pub fn parse(value: &str) -> Result<Self, TokenError> {
        let step = match value {
            "sm" => 0,
            "base" => 1,
            "lg" => 2,
            "xl" => 3,
            other => match other.strip_suffix("xl").map(str::parse::<u8>) {
                Some(Ok(n)) if (2..=9).contains(&n) => n + 2,
                _ => return Err(TokenError::new("text size", value)),
            },
        };
        Ok(TextSize(step))
    }

    /// Display sizes get a blank row of breathing room under them.
    pub fn is_display(self) -> bool {
        self >= Self::XL5
    }
}

impl TryFrom<String> for TextSize {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TextSize::parse(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientShape {
    /// CSS angle in degrees: 0 points up, 90 points right.
    Linear { angle: f32 },
    /// Center of the gradient in unit coordinates.
    Radial { cx: f32, cy: f32 },
}

/// A parsed `linear-gradient(...)` or `radial-gradient(...)` background.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Gradient {
    pub shape: GradientShape,
    /// Color stops with positions in `0.0..=1.0`, sorted.
    pub stops: Vec<(Rgb, f32)>,
    source: String,
}

impl Gradient {
    pub fn parse(value: &str) -> Result<Self, TokenError> {
        let err = || TokenError::new("gradient", value);
        let trimmed = value.trim();
        let (radial, args) = if let Some(rest) = trimmed.strip_prefix("linear-gradient(") {
            (false, rest)
        } else if let Some(rest) = trimmed.strip_prefix("radial-gradient(") {
            (true, rest)
        } else {
            return Err(err());
        };
        let args = args.strip_suffix(')').ok_or_else(err)?;

        let mut parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let mut shape = if radial {
            GradientShape::Radial { cx: 0.5, cy: 0.5 }
        } else {
            GradientShape::Linear { angle: 180.0 }
        };
        if parts.first().is_some_and(|p| !p.starts_with('#')) {
            let head = parts.remove(0);
            shape = if radial {
                radial_center(head)
            } else {
                let angle = head
                    .strip_suffix("deg")
                    .and_then(|deg| deg.trim().parse::<f32>().ok())
                    .ok_or_else(err)?;
                GradientShape::Linear { angle }
            };
        }
        if parts.len() < 2 {
            return Err(err());
        }

        let count = parts.len();
        let mut stops = Vec::with_capacity(count);
        for (i, part) in parts.iter().enumerate() {
            let mut words = part.split_whitespace();
            let color = Rgb::parse(words.next().ok_or_else(err)?)?;
            let position = match words.next() {
                Some(pos) => match pos.strip_suffix('%').map(str::parse::<f32>) {
                    Some(Ok(pct)) if (0.0..=100.0).contains(&pct) => pct / 100.0,
                    _ => return Err(err()),
                },
                None => i as f32 / (count - 1) as f32,
            };
            stops.push((color, position));
        }
        stops.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(Self {
            shape,
            stops,
            source: value.to_string(),
        })
    }

    /// Color at position `t` along the gradient line.
    pub fn color_at(&self, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mut prev = self.stops[0];
        if t <= prev.1 {
            return prev.0;
        }
        for &stop in &self.stops[1..] {
            if t <= stop.1 {
                let span = stop.1 - prev.1;
                let local = if span <= f32::EPSILON {
                    1.0
                } else {
                    (t - prev.1) / span
                };
                return prev.0.mix(stop.0, local);
            }
            prev = stop;
        }
        prev.0
    }

    /// Color at unit coordinates `(x, y)` of the painted box, `(0, 0)` being
    /// the top-left corner.
    pub fn sample(&self, x: f32, y: f32) -> Rgb {
        match self.shape {
            GradientShape::Linear { angle } => {
                let rad = angle.to_radians();
                let (dx, dy) = (rad.sin(), -rad.cos());
                // half-length of the gradient line through a unit box
                let half = (dx.abs() + dy.abs()) / 2.0;
                let projected = (x - 0.5) * dx + (y - 0.5) * dy;
                let t = if half <= f32::EPSILON {
                    0.0
                } else {
                    projected / half / 2.0 + 0.5
                };
                self.color_at(t)
            }
            GradientShape::Radial { cx, cy } => {
                let far_x = cx.max(1.0 - cx);
                let far_y = cy.max(1.0 - cy);
                let reach = (far_x * far_x + far_y * far_y).sqrt();
                let dist = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
                self.color_at(dist / reach)
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn radial_center(head: &str) -> GradientShape {
    let (mut cx, mut cy) = (0.5, 0.5);
    if let Some((_, position)) = head.split_once(" at ") {
        for word in position.split_whitespace() {
            match word {
                "left" => cx = 0.0,
                "right" => cx = 1.0,
                "top" => cy = 0.0,
                "bottom" => cy = 1.0,
                _ => {}
            }
        }
    }
    GradientShape::Radial { cx, cy }
}

impl TryFrom<String> for Gradient {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Gradient::parse(&value)
    }
}

/// The `shadow` style token.
#[derive(Debug, Clone, PartialEq)]
pub enum Shadow {
    /// A hard offset shadow such as `"4px 4px 0px 0px"`.
    Offset { x: Px, y: Px, raw: String },
    /// Anything else, for instance an rgba glow. Kept verbatim.
    Glow {
        raw: String,
        color: Option<(Rgb, f32)>,
    },
}

impl Shadow {
    pub fn parse(value: &str) -> Shadow {
        let parts: Vec<&str> = value.split_whitespace().collect();
        let is_offset = parts.len() == 4
            && parts.iter().all(|p| {
                p.strip_suffix("px")
                    .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
            });
        if is_offset {
            if let (Ok(x), Ok(y)) = (Px::parse(parts[0]), Px::parse(parts[1])) {
                return Shadow::Offset {
                    x,
                    y,
                    raw: value.to_string(),
                };
            }
        }
        Shadow::Glow {
            raw: value.to_string(),
            color: parse_rgba(value),
        }
    }

    /// The shadow as the web client would emit it: offset shadows take the
    /// theme's dark border color, anything else passes through unchanged.
    pub fn css(&self, border_dark: Rgb) -> String {
        match self {
            Shadow::Offset { raw, .. } => format!("{raw} {border_dark}"),
            Shadow::Glow { raw, .. } => raw.clone(),
        }
    }
}

fn parse_rgba(value: &str) -> Option<(Rgb, f32)> {
    let start = value.find("rgba(")? + "rgba(".len();
    let end = start + value[start..].find(')')?;
    let channels: Vec<&str> = value[start..end].split(',').map(str::trim).collect();
    if channels.len() != 4 {
        return None;
    }
    let byte = |s: &str| s.parse::<u8>().ok();
    Some((
        Rgb(byte(channels[0])?, byte(channels[1])?, byte(channels[2])?),
        channels[3].parse::<f32>().ok()?.clamp(0.0, 1.0),
    ))
}
