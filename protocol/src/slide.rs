use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::patch::{PatchError, PatchReport, SlidePatch};

/// Fields every slide accepts regardless of its variant.
pub const COMMON_FIELDS: &[&str] = &["layout", "image_url", "image_alt", "image_credit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideLayout {
    Left,
    #[default]
    Center,
    Right,
    Split,
}

impl FromStr for SlideLayout {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            "split" => Ok(Self::Split),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideKind {
    Title,
    Content,
    Bullets,
    Quote,
    Section,
    Chart,
    BigNumber,
    Comparison,
    Stats,
    Timeline,
    TwoColumn,
}

impl SlideKind {
    pub const ALL: [SlideKind; 11] = [
        SlideKind::Title,
        SlideKind::Content,
        SlideKind::Bullets,
        SlideKind::Quote,
        SlideKind::Section,
        SlideKind::Chart,
        SlideKind::BigNumber,
        SlideKind::Comparison,
        SlideKind::Stats,
        SlideKind::Timeline,
        SlideKind::TwoColumn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SlideKind::Title => "title",
            SlideKind::Content => "content",
            SlideKind::Bullets => "bullets",
            SlideKind::Quote => "quote",
            SlideKind::Section => "section",
            SlideKind::Chart => "chart",
            SlideKind::BigNumber => "big_number",
            SlideKind::Comparison => "comparison",
            SlideKind::Stats => "stats",
            SlideKind::Timeline => "timeline",
            SlideKind::TwoColumn => "two_column",
        }
    }

    /// Variant-specific wire fields. Anything outside this list and
    /// [`COMMON_FIELDS`] is rejected by [`Slide::apply_patch`].
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            SlideKind::Title => &["title", "subtitle"],
            SlideKind::Content => &["title", "body"],
            SlideKind::Bullets => &["title", "bullets"],
            SlideKind::Quote => &["quote", "attribution"],
            SlideKind::Section => &["title"],
            SlideKind::Chart => &["title", "chart_type", "chart_data", "chart_config"],
            SlideKind::BigNumber => &[
                "title",
                "big_number_value",
                "big_number_label",
                "big_number_context",
            ],
            SlideKind::Comparison => &["title", "comparison_columns"],
            SlideKind::Stats => &["title", "stats"],
            SlideKind::Timeline => &["title", "timeline_items"],
            SlideKind::TwoColumn => &[
                "title",
                "left_title",
                "left_body",
                "right_title",
                "right_body",
            ],
        }
    }
}

impl fmt::Display for SlideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSlideKind(pub String);

impl fmt::Display for UnknownSlideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown slide type `{}`", self.0)
    }
}

impl std::error::Error for UnknownSlideKind {}

impl FromStr for SlideKind {
    type Err = UnknownSlideKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlideKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownSlideKind(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    HorizontalBar,
    Line,
    Area,
    Pie,
    Donut,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub show_legend: bool,
    pub show_values: bool,
    pub x_axis_label: Option<String>,
    pub y_axis_label: Option<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            show_values: true,
            x_axis_label: None,
            y_axis_label: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonColumn {
    pub title: String,
    pub items: Vec<String>,
    pub highlight: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatItem {
    #[serde(deserialize_with = "text_or_number")]
    pub value: String,
    pub label: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineItem {
    pub title: String,
    pub date: Option<String>,
    pub description: Option<String>,
}

/// Variant payload of a slide. The serde tag is only used for the known
/// variants; `Unrecognized` is produced and written by [`Slide`] itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlideContent {
    Title {
        title: Option<String>,
        subtitle: Option<String>,
    },
    Content {
        title: Option<String>,
        body: Option<String>,
    },
    Bullets {
        title: Option<String>,
        #[serde(default)]
        bullets: Vec<String>,
    },
    Quote {
        quote: Option<String>,
        attribution: Option<String>,
    },
    Section {
        title: Option<String>,
    },
    Chart {
        title: Option<String>,
        chart_type: Option<ChartType>,
        #[serde(default)]
        chart_data: Vec<ChartPoint>,
        chart_config: Option<ChartConfig>,
    },
    BigNumber {
        title: Option<String>,
        #[serde(default, deserialize_with = "opt_text_or_number")]
        big_number_value: Option<String>,
        big_number_label: Option<String>,
        big_number_context: Option<String>,
    },
    Comparison {
        title: Option<String>,
        #[serde(default)]
        comparison_columns: Vec<ComparisonColumn>,
    },
    Stats {
        title: Option<String>,
        #[serde(default)]
        stats: Vec<StatItem>,
    },
    Timeline {
        title: Option<String>,
        #[serde(default)]
        timeline_items: Vec<TimelineItem>,
    },
    TwoColumn {
        title: Option<String>,
        left_title: Option<String>,
        left_body: Option<String>,
        right_title: Option<String>,
        right_body: Option<String>,
    },
    #[serde(skip)]
    Unrecognized {
        kind: String,
        title: Option<String>,
        body: Option<String>,
    },
}

impl SlideContent {
    /// `None` for a slide whose `type` this client does not know.
    pub fn kind(&self) -> Option<SlideKind> {
        Some(match self {
            SlideContent::Title { .. } => SlideKind::Title,
            SlideContent::Content { .. } => SlideKind::Content,
            SlideContent::Bullets { .. } => SlideKind::Bullets,
            SlideContent::Quote { .. } => SlideKind::Quote,
            SlideContent::Section { .. } => SlideKind::Section,
            SlideContent::Chart { .. } => SlideKind::Chart,
            SlideContent::BigNumber { .. } => SlideKind::BigNumber,
            SlideContent::Comparison { .. } => SlideKind::Comparison,
            SlideContent::Stats { .. } => SlideKind::Stats,
            SlideContent::Timeline { .. } => SlideKind::Timeline,
            SlideContent::TwoColumn { .. } => SlideKind::TwoColumn,
            SlideContent::Unrecognized { .. } => return None,
        })
    }

    pub fn type_name(&self) -> &str {
        match self {
            SlideContent::Unrecognized { kind, .. } => kind,
            other => other.kind().map(SlideKind::as_str).unwrap_or("content"),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            SlideContent::Title { title, .. }
            | SlideContent::Content { title, .. }
            | SlideContent::Bullets { title, .. }
            | SlideContent::Section { title }
            | SlideContent::Chart { title, .. }
            | SlideContent::BigNumber { title, .. }
            | SlideContent::Comparison { title, .. }
            | SlideContent::Stats { title, .. }
            | SlideContent::Timeline { title, .. }
            | SlideContent::TwoColumn { title, .. }
            | SlideContent::Unrecognized { title, .. } => title.as_deref(),
            SlideContent::Quote { .. } => None,
        }
    }

    fn allows(&self, field: &str) -> bool {
        match self.kind() {
            Some(kind) => kind.fields().contains(&field),
            None => matches!(field, "title" | "body"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideImage {
    pub url: Option<String>,
    pub alt: Option<String>,
    pub credit: Option<String>,
}

/// One slide of a deck: the common fields plus exactly one content variant.
///
/// Serialization is written by hand because the wire form is a flat object
/// where `type` may be missing (meaning `content`) or unknown, and any field
/// may be `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub id: Option<i64>,
    pub order: u32,
    pub layout: SlideLayout,
    pub image: SlideImage,
    pub content: SlideContent,
}

impl Slide {
    pub fn new(order: u32, content: SlideContent) -> Self {
        Self {
            id: None,
            order,
            layout: SlideLayout::default(),
            image: SlideImage::default(),
            content,
        }
    }

    pub fn kind(&self) -> Option<SlideKind> {
        self.content.kind()
    }

    pub fn type_name(&self) -> &str {
        self.content.type_name()
    }

    pub fn title(&self) -> Option<&str> {
        self.content.title()
    }

    pub fn from_map(mut map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        map.retain(|_, value| !value.is_null());

        let id = map.get("id").and_then(Value::as_i64);
        let order = map
            .get("order")
            .and_then(Value::as_u64)
            .and_then(|order| u32::try_from(order).ok())
            .unwrap_or(0);
        let layout = map
            .get("layout")
            .and_then(Value::as_str)
            .and_then(|layout| layout.parse().ok())
            .unwrap_or_default();
        let image = SlideImage {
            url: string_field(&map, "image_url"),
            alt: string_field(&map, "image_alt"),
            credit: string_field(&map, "image_credit"),
        };

        let kind = map
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(SlideKind::Content.as_str())
            .to_string();
        let content = if kind.parse::<SlideKind>().is_ok() {
            map.insert("type".to_string(), Value::String(kind));
            serde_json::from_value(Value::Object(map))?
        } else {
            SlideContent::Unrecognized {
                title: string_field(&map, "title"),
                body: string_field(&map, "body"),
                kind,
            }
        };

        Ok(Self {
            id,
            order,
            layout,
            image,
            content,
        })
    }

    /// The flat wire object, without `null` entries.
    pub fn to_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let mut map = match &self.content {
            SlideContent::Unrecognized { kind, title, body } => {
                let mut map = Map::new();
                map.insert("type".to_string(), Value::String(kind.clone()));
                if let Some(title) = title {
                    map.insert("title".to_string(), Value::String(title.clone()));
                }
                if let Some(body) = body {
                    map.insert("body".to_string(), Value::String(body.clone()));
                }
                map
            }
            known => match serde_json::to_value(known)? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        };
        map.retain(|_, value| !value.is_null());

        if let Some(id) = self.id {
            map.insert("id".to_string(), Value::from(id));
        }
        map.insert("order".to_string(), Value::from(self.order));
        map.insert("layout".to_string(), serde_json::to_value(self.layout)?);
        for (field, value) in [
            ("image_url", &self.image.url),
            ("image_alt", &self.image.alt),
            ("image_credit", &self.image.credit),
        ] {
            if let Some(value) = value {
                map.insert(field.to_string(), Value::String(value.clone()));
            }
        }
        Ok(map)
    }

    pub fn accepts_field(&self, field: &str) -> bool {
        COMMON_FIELDS.contains(&field) || self.content.allows(field)
    }

    /// Shallow-merges `patch` into this slide.
    ///
    /// Fields that do not belong to the slide's variant are dropped and
    /// listed in the report. If an accepted field has the wrong shape the
    /// slide is left untouched and an error is returned. A `null` value
    /// clears the field.
    pub fn apply_patch(&mut self, patch: &SlidePatch) -> Result<PatchReport, PatchError> {
        let (accepted, ignored) = patch.partition(|field| self.accepts_field(field));
        if accepted.is_empty() {
            return Ok(PatchReport { accepted, ignored });
        }

        if let Some(layout) = accepted.get("layout").filter(|value| !value.is_null()) {
            serde_json::from_value::<SlideLayout>(layout.clone())?;
        }
        for field in ["image_url", "image_alt", "image_credit"] {
            if let Some(value) = accepted.get(field) {
                serde_json::from_value::<Option<String>>(value.clone())?;
            }
        }

        let mut map = self.to_map()?;
        for (field, value) in accepted.iter() {
            map.insert(field.clone(), value.clone());
        }
        *self = Slide::from_map(map)?;

        Ok(PatchReport { accepted, ignored })
    }
}

impl Serialize for Slide {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Slide {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Slide::from_map(map).map_err(D::Error::custom)
    }
}

fn string_field(map: &Map<String, Value>, field: &str) -> Option<String> {
    map.get(field).and_then(Value::as_str).map(str::to_string)
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a string or a number, found {other}"
        ))),
    }
}

fn opt_text_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(D::Error::custom(format!(
            "expected a string or a number, found {other}"
        ))),
    }
}
