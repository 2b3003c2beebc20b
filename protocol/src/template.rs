use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::slide::SlideLayout;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSlide {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub order: u32,
    pub slide_type: String,
    #[serde(default)]
    pub layout: SlideLayout,
    #[serde(default)]
    pub placeholder_title: Option<String>,
    #[serde(default)]
    pub placeholder_body: Option<String>,
    #[serde(default)]
    pub placeholder_bullets: Option<Vec<String>>,
    #[serde(default)]
    pub ai_instructions: Option<String>,
    #[serde(default = "default_required")]
    pub is_required: bool,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub slides: Vec<TemplateSlide>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub usage_count: u32,
}

/// Row of `GET /api/v1/templates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub slide_count: u32,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub theme: String,
    pub slides: Vec<TemplateSlide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Body of `POST /api/v1/templates/{id}/generate/stream`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateGenerateRequest {
    pub user_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, String>>,
    /// Slide `order` values to leave out. Required slides ignore this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_slides: Option<Vec<u32>>,
}

/// Generation inputs derived from a template before the run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSeed {
    pub theme: String,
    pub slide_count: u32,
    pub outline: Vec<OutlineEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub order: u32,
    pub slide_type: String,
    pub title: Option<String>,
}

impl Template {
    /// Slides that survive `excluded`, in template order.
    pub fn included_slides<'a>(
        &'a self,
        excluded: &'a [u32],
    ) -> impl Iterator<Item = &'a TemplateSlide> + 'a {
        self.slides
            .iter()
            .filter(move |slide| slide.is_required || !excluded.contains(&slide.order))
    }

    pub fn seed(&self, request: &TemplateGenerateRequest) -> TemplateSeed {
        let excluded = request.excluded_slides.as_deref().unwrap_or_default();
        let empty = BTreeMap::new();
        let variables = request.variables.as_ref().unwrap_or(&empty);

        let mut outline: Vec<OutlineEntry> = self
            .included_slides(excluded)
            .map(|slide| OutlineEntry {
                order: slide.order,
                slide_type: slide.slide_type.clone(),
                title: slide
                    .placeholder_title
                    .as_deref()
                    .map(|title| apply_variables(title, variables)),
            })
            .collect();
        outline.sort_by_key(|entry| entry.order);

        TemplateSeed {
            theme: request
                .theme
                .clone()
                .filter(|theme| !theme.is_empty())
                .unwrap_or_else(|| self.theme.clone()),
            slide_count: u32::try_from(outline.len()).unwrap_or(u32::MAX),
            outline,
        }
    }
}

/// Replaces every `{{key}}` with its value. Unknown keys are left as-is.
pub fn apply_variables(text: &str, variables: &BTreeMap<String, String>) -> String {
    variables
        .iter()
        .fold(text.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{{{key}}}}}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> Template {
        serde_json::from_value(json!({
            "id": 7,
            "name": "Pitch",
            "category": "business",
            "theme": "corporate",
            "slides": [
                {"order": 2, "slide_type": "bullets", "placeholder_title": "Why {{product}}", "is_required": false},
                {"order": 1, "slide_type": "title", "placeholder_title": "{{company}} pitch"},
                {"order": 3, "slide_type": "quote", "is_required": true}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn seed_skips_only_optional_excluded_slides() {
        let request = TemplateGenerateRequest {
            user_content: "content".into(),
            excluded_slides: Some(vec![2, 3]),
            ..Default::default()
        };
        let seed = template().seed(&request);
        assert_eq!(seed.theme, "corporate");
        assert_eq!(seed.slide_count, 2);
        let orders: Vec<u32> = seed.outline.iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![1, 3]);
    }

    #[test]
    fn seed_substitutes_variables_and_theme_override() {
        let mut variables = BTreeMap::new();
        variables.insert("company".to_string(), "Acme".to_string());
        let request = TemplateGenerateRequest {
            user_content: "content".into(),
            theme: Some("dark".into()),
            variables: Some(variables),
            excluded_slides: None,
        };
        let seed = template().seed(&request);
        assert_eq!(seed.theme, "dark");
        assert_eq!(seed.slide_count, 3);
        assert_eq!(seed.outline[0].title.as_deref(), Some("Acme pitch"));
        assert_eq!(seed.outline[1].title.as_deref(), Some("Why {{product}}"));
    }
}
