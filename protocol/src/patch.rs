use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("invalid value for slide field: {source}")]
    InvalidValue {
        #[from]
        source: serde_json::Error,
    },
}

/// Partial slide fields, keyed by wire field name.
///
/// This is both the payload of an in-memory edit and the body of the
/// `PUT .../slides/{index}` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlidePatch(Map<String, Value>);

impl SlidePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SlidePatch::set`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Splits the patch into the entries whose field passes `keep` and the
    /// names of the fields that did not.
    pub fn partition<F>(&self, mut keep: F) -> (SlidePatch, Vec<String>)
    where
        F: FnMut(&str) -> bool,
    {
        let mut accepted = SlidePatch::new();
        let mut rejected = Vec::new();
        for (field, value) in &self.0 {
            if keep(field) {
                accepted.set(field.clone(), value.clone());
            } else {
                rejected.push(field.clone());
            }
        }
        (accepted, rejected)
    }
}

impl From<Map<String, Value>> for SlidePatch {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for SlidePatch {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What an edit actually changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchReport {
    /// Fields that were merged into the slide.
    pub accepted: SlidePatch,
    /// Fields that do not belong to the slide's variant and were dropped.
    pub ignored: Vec<String>,
}

impl PatchReport {
    pub fn is_noop(&self) -> bool {
        self.accepted.is_empty()
    }
}
