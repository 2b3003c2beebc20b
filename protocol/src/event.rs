use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::presentation::Presentation;
use crate::slide::Slide;

pub const DEFAULT_ERROR_MESSAGE: &str = "Generation failed";

/// One event of a generation run, as pushed by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    Thinking {
        message: String,
        iteration: Option<u32>,
    },
    ToolCall(ToolCall),
    ToolResult(ToolResult),
    Complete(Completion),
    Error {
        message: Option<String>,
    },
    /// A `type` this client does not understand, kept verbatim.
    Opaque {
        kind: String,
        payload: Value,
    },
}

impl GenerationEvent {
    pub fn kind(&self) -> &str {
        match self {
            GenerationEvent::Thinking { .. } => "thinking",
            GenerationEvent::ToolCall(_) => "tool_call",
            GenerationEvent::ToolResult(_) => "tool_result",
            GenerationEvent::Complete(_) => "complete",
            GenerationEvent::Error { .. } => "error",
            GenerationEvent::Opaque { kind, .. } => kind,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationEvent::Complete(_) | GenerationEvent::Error { .. }
        )
    }

    /// The `add_slide` call carried by this event, if any.
    pub fn as_add_slide(&self) -> Option<&ToolCall> {
        match self {
            GenerationEvent::ToolCall(call) if call.tool == ToolName::AddSlide => Some(call),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            GenerationEvent::Error { message } => {
                Some(message.as_deref().unwrap_or(DEFAULT_ERROR_MESSAGE))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ToolName {
    AddSlide,
    FinishPresentation,
    Other(String),
}

impl From<String> for ToolName {
    fn from(name: String) -> Self {
        match name.as_str() {
            "add_slide" => ToolName::AddSlide,
            "finish_presentation" => ToolName::FinishPresentation,
            _ => ToolName::Other(name),
        }
    }
}

impl From<ToolName> for String {
    fn from(name: ToolName) -> Self {
        match name {
            ToolName::AddSlide => "add_slide".to_string(),
            ToolName::FinishPresentation => "finish_presentation".to_string(),
            ToolName::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: ToolName,
    #[serde(default)]
    pub slide_number: Option<u32>,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default)]
    pub slide: Option<Slide>,
    #[serde(default)]
    pub iteration: Option<u32>,
}

impl ToolCall {
    pub fn add_slide(slide_number: u32, slide: Slide) -> Self {
        let args = slide.to_map().unwrap_or_default();
        Self {
            tool: ToolName::AddSlide,
            slide_number: Some(slide_number),
            args,
            slide: Some(slide),
            iteration: None,
        }
    }

    /// Title of the embedded slide, falling back to the raw `args`.
    pub fn title(&self) -> Option<&str> {
        self.slide
            .as_ref()
            .and_then(Slide::title)
            .or_else(|| self.args.get("title").and_then(Value::as_str))
    }

    pub fn slide_type(&self) -> Option<&str> {
        self.slide
            .as_ref()
            .map(Slide::type_name)
            .or_else(|| self.args.get("type").and_then(Value::as_str))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    #[serde(default)]
    pub presentation: Option<Presentation>,
    #[serde(default)]
    pub presentation_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slide_count: Option<u32>,
}
