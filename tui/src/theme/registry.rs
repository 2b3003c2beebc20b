use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use slide_common::DEFAULT_THEME;
use slide_protocol::Slide;
use slide_protocol::SlideKind;
use thiserror::Error;
use tracing::debug;

use super::ThemeDefinition;
use crate::render::SlideRenderer;
use crate::slides;

const BUILTIN_THEMES: &str = include_str!("builtin.toml");

/// Theme that registers its own renderer set instead of the standard one.
pub const TERMINAL_THEME: &str = "terminal";

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("failed to read theme file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid theme table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("theme {theme:?}: {reason}")]
    Invalid { theme: String, reason: String },

    #[error("default theme {0:?} is not registered")]
    MissingDefault(String),
}

#[derive(Deserialize)]
struct ThemeTable {
    #[serde(default)]
    themes: Vec<ThemeDefinition>,
}

/// The renderers a theme uses, one per slide kind, with a mandatory
/// fallback for kinds it does not register.
#[derive(Clone)]
pub struct RendererSet {
    fallback: Arc<dyn SlideRenderer>,
    by_kind: HashMap<SlideKind, Arc<dyn SlideRenderer>>,
}

impl RendererSet {
    pub fn new(fallback: Arc<dyn SlideRenderer>) -> Self {
        Self {
            fallback,
            by_kind: HashMap::new(),
        }
    }

    pub fn with(mut self, kind: SlideKind, renderer: Arc<dyn SlideRenderer>) -> Self {
        self.by_kind.insert(kind, renderer);
        self
    }

    pub fn get(&self, kind: SlideKind) -> &dyn SlideRenderer {
        self.by_kind
            .get(&kind)
            .map(|renderer| renderer.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    pub fn fallback(&self) -> &dyn SlideRenderer {
        self.fallback.as_ref()
    }
}

impl std::fmt::Debug for RendererSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self
            .by_kind
            .iter()
            .map(|(kind, renderer)| (kind.as_str(), renderer.name()))
            .collect();
        kinds.sort();
        f.debug_struct("RendererSet")
            .field("fallback", &self.fallback.name())
            .field("by_kind", &kinds)
            .finish()
    }
}

/// A theme's tokens paired with the renderers that draw it.
#[derive(Debug, Clone)]
pub struct ThemeRegistration {
    pub theme: Arc<ThemeDefinition>,
    pub components: Arc<RendererSet>,
}

/// Every known theme, in table order.
///
/// Lookups never fail: an unknown theme name resolves to the default theme
/// and an unknown slide type resolves to the theme's fallback renderer.
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    entries: Vec<ThemeRegistration>,
    default_index: usize,
    standard: Arc<RendererSet>,
    terminal: Arc<RendererSet>,
}

impl ThemeRegistry {
    /// The themes compiled into the binary.
    pub fn builtin() -> Result<Self, ThemeError> {
        Self::from_toml_str(BUILTIN_THEMES)
    }

    /// Built-in themes, extended or overridden by `themes_file` if given.
    pub fn load(themes_file: Option<&Path>) -> Result<Self, ThemeError> {
        let registry = Self::builtin()?;
        match themes_file {
            Some(path) => registry.with_themes_file(path),
            None => Ok(registry),
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ThemeError> {
        let mut registry = Self {
            entries: Vec::new(),
            default_index: 0,
            standard: Arc::new(slides::standard_renderers()),
            terminal: Arc::new(slides::terminal_renderers()),
        };
        registry.merge_toml_str(source)?;
        Ok(registry)
    }

    pub fn with_themes_file(mut self, path: &Path) -> Result<Self, ThemeError> {
        let source = std::fs::read_to_string(path).map_err(|source| ThemeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_toml_str(&source)?;
        debug!("loaded themes from {}", path.display());
        Ok(self)
    }

    /// Adds the themes in `source`. A theme whose name is already registered
    /// replaces it in place; new themes are appended.
    pub fn merge_toml_str(&mut self, source: &str) -> Result<(), ThemeError> {
        let table: ThemeTable = toml::from_str(source)?;
        let mut seen = Vec::with_capacity(table.themes.len());
        for theme in &table.themes {
            validate(theme)?;
            if seen.contains(&theme.name.as_str()) {
                return Err(ThemeError::Invalid {
                    theme: theme.name.clone(),
                    reason: "defined twice".to_string(),
                });
            }
            seen.push(theme.name.as_str());
        }

        let mut entries = self.entries.clone();
        for theme in table.themes {
            let registration = ThemeRegistration {
                components: self.components_for(&theme.name),
                theme: Arc::new(theme),
            };
            match entries
                .iter()
                .position(|entry| entry.theme.name == registration.theme.name)
            {
                Some(index) => entries[index] = registration,
                None => entries.push(registration),
            }
        }

        let default_index = entries
            .iter()
            .position(|entry| entry.theme.name == DEFAULT_THEME)
            .ok_or_else(|| ThemeError::MissingDefault(DEFAULT_THEME.to_string()))?;
        self.entries = entries;
        self.default_index = default_index;
        Ok(())
    }

    fn components_for(&self, name: &str) -> Arc<RendererSet> {
        if name == TERMINAL_THEME {
            Arc::clone(&self.terminal)
        } else {
            Arc::clone(&self.standard)
        }
    }

    fn find(&self, name: &str) -> Option<&ThemeRegistration> {
        self.entries.iter().find(|entry| entry.theme.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn registration(&self, name: &str) -> &ThemeRegistration {
        self.find(name).unwrap_or_else(|| {
            debug!("unknown theme {name:?}, using {DEFAULT_THEME}");
            &self.entries[self.default_index]
        })
    }

    pub fn resolve_theme(&self, name: &str) -> &ThemeDefinition {
        &self.registration(name).theme
    }

    pub fn resolve_components(&self, name: &str) -> &RendererSet {
        &self.registration(name).components
    }

    /// Renderer for a slide type given by its wire name. Unknown types get
    /// the theme's fallback renderer.
    pub fn resolve_slide_renderer(&self, theme: &str, slide_type: &str) -> &dyn SlideRenderer {
        let components = self.resolve_components(theme);
        match slide_type.parse::<SlideKind>() {
            Ok(kind) => components.get(kind),
            Err(_) => components.fallback(),
        }
    }

    pub fn renderer_for(&self, theme: &str, slide: &Slide) -> &dyn SlideRenderer {
        let components = self.resolve_components(theme);
        match slide.kind() {
            Some(kind) => components.get(kind),
            None => components.fallback(),
        }
    }

    pub fn list(&self) -> &[ThemeRegistration] {
        &self.entries
    }

    /// Theme name after `current` in table order, wrapping around.
    pub fn next_theme_name(&self, current: &str) -> &str {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.theme.name == current)
            .map(|i| (i + 1) % self.entries.len())
            .unwrap_or(self.default_index);
        &self.entries[index].theme.name
    }
}

fn validate(theme: &ThemeDefinition) -> Result<(), ThemeError> {
    let invalid = |reason: String| ThemeError::Invalid {
        theme: theme.name.clone(),
        reason,
    };
    if theme.name.trim().is_empty() {
        return Err(invalid("name must not be empty".to_string()));
    }
    let opacity = theme.style.pattern_opacity;
    if !(0.0..=1.0).contains(&opacity) {
        return Err(invalid(format!(
            "pattern_opacity must be within 0..=1, got {opacity}"
        )));
    }
    let typography = &theme.typography;
    for (token, weight) in [
        ("title_weight", typography.title_weight),
        ("heading_weight", typography.heading_weight),
        ("body_weight", typography.body_weight),
    ] {
        if !(100..=900).contains(&weight) {
            return Err(invalid(format!("{token} must be within 100..=900, got {weight}")));
        }
    }
    for (token, height) in [
        ("title_line_height", typography.title_line_height),
        ("body_line_height", typography.body_line_height),
    ] {
        if !(height.is_finite() && height > 0.0) {
            return Err(invalid(format!("{token} must be positive, got {height}")));
        }
    }
    Ok(())
}
