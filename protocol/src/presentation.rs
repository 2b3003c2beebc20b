use serde::{Deserialize, Deserializer, Serialize};

use crate::slide::Slide;

/// A finished deck. Timestamps are kept in the server's own format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub theme: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slides: Vec<Slide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Row of `GET /api/v1/presentations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationSummary {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub theme: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slide_count: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `POST /api/v1/slides/generate/stream`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

/// Body of `PUT /api/v1/presentations/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub url: String,
    pub share_code: String,
}

/// `null` reads as the field's default, like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presentation_tolerates_missing_fields() {
        let p: Presentation = serde_json::from_value(json!({
            "id": 4,
            "title": "Deck",
            "slides": [{"type": "title", "title": "Hello", "order": 1}]
        }))
        .unwrap();
        assert_eq!(p.id, Some(4));
        assert_eq!(p.theme, "");
        assert_eq!(p.slides.len(), 1);
        assert_eq!(p.slides[0].title(), Some("Hello"));
        assert!(p.created_at.is_none());
    }

    #[test]
    fn presentation_reads_null_strings_as_empty() {
        let p: Presentation = serde_json::from_value(json!({
            "id": 1,
            "title": null,
            "input_text": null,
            "theme": "minimal",
            "slides": null
        }))
        .unwrap();
        assert_eq!(p.title, "");
        assert_eq!(p.input_text, "");
        assert!(p.slides.is_empty());

        let row: PresentationSummary =
            serde_json::from_value(json!({"id": 2, "title": null, "slide_count": null})).unwrap();
        assert_eq!(row.slide_count, 0);
    }

    #[test]
    fn generate_request_skips_unset_options() {
        let req = GenerateRequest {
            text: "body".into(),
            slide_count: Some(6),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"text": "body", "slide_count": 6})
        );
    }
}
