use serde_json::Value;
use slide_protocol::Slide;
use slide_protocol::SlideContent;
use slide_protocol::SlidePatch;

/// A text field of a slide that can be edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    Title,
    Subtitle,
    Body,
    Bullet(usize),
    Quote,
    Attribution,
    LeftTitle,
    LeftBody,
    RightTitle,
    RightBody,
}

impl FieldId {
    /// Wire name of the slide field this edits.
    pub fn key(self) -> &'static str {
        match self {
            FieldId::Title => "title",
            FieldId::Subtitle => "subtitle",
            FieldId::Body => "body",
            FieldId::Bullet(_) => "bullets",
            FieldId::Quote => "quote",
            FieldId::Attribution => "attribution",
            FieldId::LeftTitle => "left_title",
            FieldId::LeftBody => "left_body",
            FieldId::RightTitle => "right_title",
            FieldId::RightBody => "right_body",
        }
    }

    pub fn label(self) -> String {
        match self {
            FieldId::Bullet(index) => format!("bullet {}", index + 1),
            other => other.key().replace('_', " "),
        }
    }

    /// Current text of the field on `slide`.
    pub fn value(self, slide: &Slide) -> Option<&str> {
        use SlideContent as C;
        match (self, &slide.content) {
            (FieldId::Title, _) => slide.title(),
            (FieldId::Subtitle, C::Title { subtitle, .. }) => subtitle.as_deref(),
            (FieldId::Body, C::Content { body, .. } | C::Unrecognized { body, .. }) => {
                body.as_deref()
            }
            (FieldId::Bullet(index), C::Bullets { bullets, .. }) => {
                bullets.get(index).map(String::as_str)
            }
            (FieldId::Quote, C::Quote { quote, .. }) => quote.as_deref(),
            (FieldId::Attribution, C::Quote { attribution, .. }) => attribution.as_deref(),
            (FieldId::LeftTitle, C::TwoColumn { left_title, .. }) => left_title.as_deref(),
            (FieldId::LeftBody, C::TwoColumn { left_body, .. }) => left_body.as_deref(),
            (FieldId::RightTitle, C::TwoColumn { right_title, .. }) => right_title.as_deref(),
            (FieldId::RightBody, C::TwoColumn { right_body, .. }) => right_body.as_deref(),
            _ => None,
        }
    }

    /// The edit that sets this field to `value`. Bullets are sent as the
    /// whole list with one entry replaced.
    pub fn patch(self, slide: &Slide, value: String) -> SlidePatch {
        match (self, &slide.content) {
            (FieldId::Bullet(index), SlideContent::Bullets { bullets, .. }) => {
                let mut bullets = bullets.clone();
                match bullets.get_mut(index) {
                    Some(bullet) => *bullet = value,
                    None => bullets.push(value),
                }
                SlidePatch::new().with(self.key(), Value::from(bullets))
            }
            _ => SlidePatch::new().with(self.key(), value),
        }
    }
}

/// Fields of `slide` in the order the user tabs through them.
pub fn editable_fields(slide: &Slide) -> Vec<FieldId> {
    match &slide.content {
        SlideContent::Title { .. } => vec![FieldId::Title, FieldId::Subtitle],
        SlideContent::Content { .. } | SlideContent::Unrecognized { .. } => {
            vec![FieldId::Title, FieldId::Body]
        }
        SlideContent::Bullets { bullets, .. } => std::iter::once(FieldId::Title)
            .chain((0..bullets.len()).map(FieldId::Bullet))
            .collect(),
        SlideContent::Quote { .. } => vec![FieldId::Quote, FieldId::Attribution],
        SlideContent::TwoColumn { .. } => vec![
            FieldId::Title,
            FieldId::LeftTitle,
            FieldId::LeftBody,
            FieldId::RightTitle,
            FieldId::RightBody,
        ],
        SlideContent::Section { .. }
        | SlideContent::Chart { .. }
        | SlideContent::BigNumber { .. }
        | SlideContent::Comparison { .. }
        | SlideContent::Stats { .. }
        | SlideContent::Timeline { .. } => vec![FieldId::Title],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slide(value: serde_json::Value) -> Slide {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn bullet_edit_replaces_one_entry() {
        let bullets = slide(json!({"type": "bullets", "bullets": ["a", "b", "c"]}));
        assert_eq!(FieldId::Bullet(1).value(&bullets), Some("b"));
        assert_eq!(
            FieldId::Bullet(1).patch(&bullets, "B".into()),
            SlidePatch::new().with("bullets", json!(["a", "B", "c"]))
        );
    }

    #[test]
    fn every_editable_field_is_accepted_by_its_slide() {
        let slides = [
            slide(json!({"type": "title"})),
            slide(json!({"type": "content"})),
            slide(json!({"type": "bullets", "bullets": ["x"]})),
            slide(json!({"type": "quote"})),
            slide(json!({"type": "two_column"})),
            slide(json!({"type": "stats"})),
            slide(json!({"type": "mystery"})),
        ];
        for slide in &slides {
            for field in editable_fields(slide) {
                assert!(
                    slide.accepts_field(field.key()),
                    "{} should accept {}",
                    slide.type_name(),
                    field.key()
                );
            }
        }
    }

    #[test]
    fn quote_has_no_title_field() {
        let quote = slide(json!({"type": "quote", "quote": "q", "attribution": "a"}));
        assert_eq!(
            editable_fields(&quote),
            vec![FieldId::Quote, FieldId::Attribution]
        );
        assert_eq!(FieldId::Attribution.value(&quote), Some("a"));
        assert_eq!(FieldId::Title.value(&quote), None);
    }
}
