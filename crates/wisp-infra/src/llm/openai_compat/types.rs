//! OpenAI chat completions wire types.
//!
//! These are request/response structures used for HTTP communication
//! with OpenAI-compatible endpoints. They are NOT the generic LLM types
//! from wisp-types -- those are provider-agnostic.
//!
//! Response types are lenient: every field a proxy might omit has a
//! default, so a chunk only fails to parse when it is not JSON at all.

use serde::{Deserialize, Serialize};

use wisp_types::llm::{Message, StreamEvent, Usage};

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
}

/// One `data:` payload of a streaming response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
    /// Some proxies report mid-stream failures as `{"error": ...}`.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl From<WireUsage> for Usage {
    fn from(u: WireUsage) -> Self {
        Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }
    }
}

/// Non-streaming response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Error message carried by the chunk, if any.
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        if error.is_null() {
            return None;
        }
        if let Some(message) = error.get("message").and_then(|v| v.as_str()) {
            return Some(message.to_string());
        }
        if let Some(message) = error.as_str() {
            return Some(message.to_string());
        }
        Some("An error occurred during streaming".to_string())
    }

    /// Provider-agnostic events for this chunk, in order: text, finish, usage.
    pub fn into_events(self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for choice in self.choices {
            if let Some(text) = choice.delta.and_then(|d| d.content) {
                if !text.is_empty() {
                    events.push(StreamEvent::TextDelta { text });
                }
            }
            if let Some(reason) = choice.finish_reason {
                events.push(StreamEvent::Finish { reason });
            }
        }
        if let Some(usage) = self.usage {
            events.push(StreamEvent::Usage(usage.into()));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_types::llm::MessageRole;

    #[test]
    fn request_serializes_openai_shape() {
        let messages = vec![Message {
            role: MessageRole::User,
            content: "Hello".to_string(),
        }];
        let body = ChatCompletionRequest {
            model: "deepseek/deepseek-r1",
            messages: &messages,
            stream: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "deepseek/deepseek-r1",
                "messages": [{"role": "user", "content": "Hello"}],
                "stream": true
            })
        );
    }

    #[test]
    fn chunk_with_content_and_finish() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"x","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"Hi"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(
            chunk.into_events(),
            vec![
                StreamEvent::TextDelta { text: "Hi".to_string() },
                StreamEvent::Finish { reason: "stop".to_string() },
            ]
        );
    }

    #[test]
    fn role_only_delta_yields_nothing() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"role":"assistant","content":""}}]}"#)
                .unwrap();
        assert!(chunk.into_events().is_empty());
    }

    #[test]
    fn usage_only_chunk() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[],"usage":{"prompt_tokens":12,"completion_tokens":34,"total_tokens":46}}"#,
        )
        .unwrap();
        assert_eq!(
            chunk.into_events(),
            vec![StreamEvent::Usage(Usage {
                input_tokens: 12,
                output_tokens: 34
            })]
        );
    }

    #[test]
    fn error_message_shapes() {
        let object: ChatCompletionChunk =
            serde_json::from_str(r#"{"error":{"message":"upstream overloaded","code":502}}"#).unwrap();
        assert_eq!(object.error_message().as_deref(), Some("upstream overloaded"));

        let text: ChatCompletionChunk = serde_json::from_str(r#"{"error":"quota"}"#).unwrap();
        assert_eq!(text.error_message().as_deref(), Some("quota"));

        let bare: ChatCompletionChunk = serde_json::from_str(r#"{"error":{"code":500}}"#).unwrap();
        assert!(bare.error_message().is_some());

        let none: ChatCompletionChunk = serde_json::from_str(r#"{"error":null,"choices":[]}"#).unwrap();
        assert!(none.error_message().is_none());
    }

    #[test]
    fn completion_reads_first_choice() {
        let resp: ChatCompletion = serde_json::from_str(
            r#"{"model":"gemini","choices":[{"message":{"role":"assistant","content":"Hello!"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("Hello!"));
        assert!(resp.usage.is_none());
    }
}
