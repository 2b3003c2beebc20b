use futures_util::Stream;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use slide_protocol::Completion;
use slide_protocol::GenerationEvent;
use slide_protocol::ToolCall;
use slide_protocol::ToolName;
use slide_protocol::ToolResult;

use crate::sse::payloads;

/// Classifies one stream payload.
///
/// Malformed JSON yields `None`: a garbled line is line noise, not a failure.
pub fn interpret(payload: &str) -> Option<GenerationEvent> {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => Some(classify(value)),
        Err(err) => {
            tracing::trace!("ignoring undecodable payload ({err}): {payload}");
            None
        }
    }
}

/// Reads the `type` discriminator and decodes the matching variant. Only
/// unknown kinds come back as [`GenerationEvent::Opaque`]; fields of a known
/// kind are read one by one and an off-shape field reads as absent.
pub fn classify(value: Value) -> GenerationEvent {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match kind.as_str() {
        "thinking" => GenerationEvent::Thinking {
            message: field(&value, "message").unwrap_or_default(),
            iteration: field(&value, "iteration"),
        },
        "tool_call" => GenerationEvent::ToolCall(tool_call(&value)),
        "tool_result" => GenerationEvent::ToolResult(ToolResult {
            result: value.get("result").filter(|v| !v.is_null()).cloned(),
            success: field(&value, "success").unwrap_or_default(),
        }),
        "complete" => GenerationEvent::Complete(Completion {
            presentation: field(&value, "presentation"),
            presentation_id: field(&value, "presentation_id"),
            title: field(&value, "title"),
            slide_count: field(&value, "slide_count"),
        }),
        "error" => GenerationEvent::Error {
            message: field(&value, "message"),
        },
        _ => {
            tracing::debug!("unrecognized event type `{kind}`");
            GenerationEvent::Opaque {
                kind,
                payload: value,
            }
        }
    }
}

fn tool_call(value: &Value) -> ToolCall {
    let tool = match value.get("tool") {
        Some(Value::String(name)) => ToolName::from(name.clone()),
        Some(Value::Null) | None => ToolName::Other(String::new()),
        Some(other) => ToolName::Other(other.to_string()),
    };
    ToolCall {
        tool,
        slide_number: field(value, "slide_number"),
        args: field(value, "args").unwrap_or_default(),
        slide: field(value, "slide"),
        iteration: field(value, "iteration"),
    }
}

/// `value[key]` decoded as `T`; missing, `null` or off-shape reads as `None`.
fn field<T: DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
    let raw = value.get(key).filter(|v| !v.is_null())?;
    match T::deserialize(raw) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::debug!("ignoring off-shape `{key}` field: {err}");
            None
        }
    }
}

/// Decoder and interpreter composed: response body in, events out.
pub fn events<S, B, E>(body: S) -> impl Stream<Item = Result<GenerationEvent, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    payloads(body).filter_map(|item| async move {
        match item {
            Ok(payload) => interpret(&payload).map(Ok),
            Err(err) => Some(Err(err)),
        }
    })
}
