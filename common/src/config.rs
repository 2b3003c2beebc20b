use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:18000";
pub const DEFAULT_THEME: &str = "neobrutalism";
pub const DEFAULT_SLIDE_COUNT: u32 = 8;

pub const ENV_API_URL: &str = "SLIDESTREAM_API_URL";
pub const ENV_THEME: &str = "SLIDESTREAM_THEME";
pub const ENV_LOG: &str = "SLIDESTREAM_LOG";

/// Project-local locations, checked in order before the user config dir.
const LOCAL_CONFIG_PATHS: [&str; 4] = [
    ".slide/config.toml",
    ".slide/config.json",
    "slide.config.toml",
    "slide.config.json",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },
    #[error("Failed to read config file: {source}")]
    IoError { source: std::io::Error },
    #[error("Failed to parse config file: {source}")]
    ParseError { source: serde_json::Error },
    #[error("Failed to parse TOML config: {source}")]
    TomlParseError { source: toml::de::Error },
    #[error("Failed to write TOML config: {source}")]
    TomlWriteError { source: toml::ser::Error },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL, without a trailing slash.
    pub api_base_url: String,
    /// Theme used when none is requested.
    pub default_theme: String,
    pub default_slide_count: u32,
    /// Where tracing output goes. The terminal belongs to the UI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Extra `[[themes]]` table merged over the built-in themes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub themes_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            default_theme: DEFAULT_THEME.to_string(),
            default_slide_count: DEFAULT_SLIDE_COUNT,
            log_file: None,
            themes_file: None,
        }
    }
}

impl Config {
    /// Load configuration from file; TOML or JSON by extension.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError { source: e })?;

        if is_toml(path) {
            toml::from_str(&contents).map_err(|e| ConfigError::TomlParseError { source: e })
        } else {
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError { source: e })
        }
    }

    /// Candidate files, highest priority first.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = LOCAL_CONFIG_PATHS.iter().map(PathBuf::from).collect();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("slidestream").join("config.toml"));
        }
        paths
    }

    /// Load the first readable candidate, else defaults.
    pub fn load_with_fallback() -> Self {
        Self::load_first(&Self::candidate_paths())
    }

    pub fn load_first(paths: &[PathBuf]) -> Self {
        for path in paths {
            if path.exists() {
                match Self::load_from_file(path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {e}", path.display());
                    }
                }
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Explicit path if given (errors are fatal), otherwise the fallback
    /// chain; environment overrides are applied last.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_with_fallback(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies `SLIDESTREAM_*` overrides. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = get(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(theme) = get(ENV_THEME) {
            self.default_theme = theme;
        }
        if let Some(log) = get(ENV_LOG) {
            self.log_file = Some(PathBuf::from(log));
        }
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
    }

    /// Log file path, defaulting to the system temp dir.
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("slidestream.log"))
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| ConfigError::TomlWriteError { source: e })?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::ParseError { source: e })?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError { source: e })?;
        }
        std::fs::write(path, contents).map_err(|e| ConfigError::IoError { source: e })
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn loads_toml_and_json_by_extension() {
        let dir = tempdir().unwrap();
        let toml_path = dir.path().join("config.toml");
        std::fs::write(
            &toml_path,
            "api_base_url = \"http://slides.internal\"\ndefault_slide_count = 12\n",
        )
        .unwrap();
        let config = Config::load_from_file(&toml_path).unwrap();
        assert_eq!(config.api_base_url, "http://slides.internal");
        assert_eq!(config.default_slide_count, 12);
        assert_eq!(config.default_theme, DEFAULT_THEME);

        let json_path = dir.path().join("config.json");
        std::fs::write(&json_path, r#"{"default_theme": "ocean"}"#).unwrap();
        let config = Config::load_from_file(&json_path).unwrap();
        assert_eq!(config.default_theme, "ocean");
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let err = Config::load_from_file(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn fallback_skips_broken_candidates() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "api_base_url = [").unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"default_slide_count": 5}"#).unwrap();
        let absent = dir.path().join("absent.toml");

        let config = Config::load_first(&[absent, broken, good]);
        assert_eq!(config.default_slide_count, 5);
    }

    #[test]
    fn env_overrides_and_trailing_slash() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://remote:9000/"),
            (ENV_THEME, "  "),
            (ENV_LOG, "/var/log/slides.log"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_base_url, "http://remote:9000");
        assert_eq!(config.default_theme, DEFAULT_THEME);
        assert_eq!(config.log_path(), PathBuf::from("/var/log/slides.log"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            themes_file: Some(PathBuf::from("themes.toml")),
            ..Config::default()
        };
        config.save_to_file(&path).unwrap();
        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }
}
