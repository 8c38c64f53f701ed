//! Core types for Counselor — conversation turns and the chat-completions wire
//! format spoken by the inference providers.
//!
//! A [`Turn`] is what the context store keeps. Providers translate turns into
//! OpenAI-compatible [`WireMessage`]s only at the edge of an HTTP call.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Turns
// ─────────────────────────────────────────────

/// Who produced a turn.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single text segment of a turn.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    pub text: String,
}

/// One message in a conversation.
///
/// Serialized as `{"role": "user", "parts": [{"text": "..."}]}`. Turns are
/// never mutated once built; compaction replaces them wholesale.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    parts: Vec<Part>,
}

impl Turn {
    /// Create a turn with a single text segment.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Turn {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create a model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// All segments joined into one string.
    pub fn text(&self) -> String {
        match self.parts.as_slice() {
            [single] => single.text.clone(),
            parts => parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// A turn with no segments, or only empty segments, cannot be committed.
    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(|p| p.text.is_empty())
    }
}

// ─────────────────────────────────────────────
// Chat completion wire format (OpenAI-compatible)
// ─────────────────────────────────────────────

/// A message in an OpenAI-compatible chat completion request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

impl WireMessage {
    pub fn system(content: impl Into<String>) -> Self {
        WireMessage {
            role: "system".into(),
            content: content.into(),
        }
    }
}

impl From<&Turn> for WireMessage {
    fn from(turn: &Turn) -> Self {
        let role = match turn.role() {
            Role::User => "user",
            Role::Model => "assistant",
        };
        WireMessage {
            role: role.into(),
            content: turn.text(),
        }
    }
}

/// `response_format` field of a chat completion request.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        ResponseFormat {
            format_type: "json_object".into(),
        }
    }
}

/// Request body for an OpenAI-compatible chat completion API.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Raw chat completion response. Used internally for deserialization.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: Option<String>,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<UsageInfo>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if any.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
    }
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

/// The assistant message within a chat completion choice.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

/// Token usage statistics from the LLM.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_serialization_shape() {
        let turn = Turn::user("I failed my mock test.");
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(
            value,
            json!({"role": "user", "parts": [{"text": "I failed my mock test."}]})
        );
    }

    #[test]
    fn test_model_role_serializes_lowercase() {
        let value = serde_json::to_value(Turn::model("ok")).unwrap();
        assert_eq!(value["role"], "model");
    }

    #[test]
    fn test_turn_deserialize() {
        let turn: Turn =
            serde_json::from_value(json!({"role": "model", "parts": [{"text": "hi"}]})).unwrap();
        assert_eq!(turn.role(), Role::Model);
        assert_eq!(turn.text(), "hi");
    }

    #[test]
    fn test_turn_is_empty() {
        assert!(Turn::user("").is_empty());
        assert!(!Turn::user(" ").is_empty());
        let no_parts: Turn = serde_json::from_value(json!({"role": "user", "parts": []})).unwrap();
        assert!(no_parts.is_empty());
    }

    #[test]
    fn test_multi_part_text_joined() {
        let turn: Turn = serde_json::from_value(
            json!({"role": "user", "parts": [{"text": "a"}, {"text": "b"}]}),
        )
        .unwrap();
        assert_eq!(turn.text(), "a\nb");
    }

    #[test]
    fn test_wire_message_role_mapping() {
        assert_eq!(WireMessage::from(&Turn::user("q")).role, "user");
        assert_eq!(WireMessage::from(&Turn::model("a")).role, "assistant");
        assert_eq!(WireMessage::system("persona").role, "system");
    }

    #[test]
    fn test_request_serialization_skips_none() {
        let req = ChatCompletionRequest {
            model: "gemini-2.5-flash".into(),
            messages: vec![WireMessage::from(&Turn::user("hello"))],
            response_format: None,
            max_tokens: None,
            temperature: Some(0.7),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("response_format").is_none());
        assert!(value.get("max_tokens").is_none());
        assert_eq!(value["temperature"], 0.7);
    }

    #[test]
    fn test_request_json_response_format() {
        let req = ChatCompletionRequest {
            model: "m".into(),
            messages: vec![],
            response_format: Some(ResponseFormat::json_object()),
            max_tokens: Some(10),
            temperature: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_response_into_text() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"message": {"content": "{\"safety_alert\": false}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7}
        }))
        .unwrap();
        assert_eq!(resp.usage.as_ref().unwrap().total_tokens, 7);
        assert_eq!(resp.into_text().as_deref(), Some("{\"safety_alert\": false}"));
    }

    #[test]
    fn test_response_without_choices() {
        let resp: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [], "usage": null})).unwrap();
        assert!(resp.into_text().is_none());
    }
}
