//! OpenAI-compatible LLM provider implementation.
//!
//! A single [`OpenAiCompatibleProvider`] serves every backend that speaks
//! the OpenAI chat completions protocol; backends differ only by base URL
//! and credentials.
//!
//! Streaming responses are parsed as server-sent events by
//! [`streaming::map_sse_stream`].

pub mod config;
pub mod streaming;
pub mod types;

use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use wisp_core::llm::provider::{EventStream, LlmProvider};
use wisp_types::llm::{CompletionRequest, CompletionResponse, LlmError, StreamEvent};

use self::config::{chat_completions_url, OpenAiCompatConfig};
use self::streaming::map_sse_stream;
use self::types::{ChatCompletion, ChatCompletionRequest};

/// Unified provider for any OpenAI-compatible API.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// building the `Authorization` header. The provider does not implement
/// `Debug`.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    provider_name: String,
    endpoint: String,
    api_key: Option<SecretString>,
    request_timeout: Duration,
    stream_idle_timeout: Duration,
}

impl OpenAiCompatibleProvider {
    /// Create a new OpenAI-compatible provider from a configuration.
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, LlmError> {
        // No client-wide deadline: it would also cover reading a stream body.
        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            provider_name: config.provider_name,
            endpoint: chat_completions_url(&config.base_url),
            api_key: config.api_key,
            request_timeout: config.request_timeout,
            stream_idle_timeout: config.stream_idle_timeout,
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the POST request for a completion.
    fn post(&self, request: &CompletionRequest, stream: bool) -> reqwest::RequestBuilder {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            stream,
        };

        let builder = self.client.post(&self.endpoint).json(&body);
        match self.api_key {
            Some(ref key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .post(request, false)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;
        let response = check_status(response).await?;

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        let first = completion.choices.into_iter().next();
        let finish_reason = first.as_ref().and_then(|c| c.finish_reason.clone());
        let content = first.and_then(|c| c.message.content).unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: completion.model.unwrap_or_else(|| request.model.clone()),
            finish_reason,
            usage: completion.usage.map(Into::into).unwrap_or_default(),
        })
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let builder = self.post(&request, true);
        let idle_timeout = self.stream_idle_timeout;

        Box::pin(async_stream::try_stream! {
            let response = builder.send().await.map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;
            let response = check_status(response).await?;
            yield StreamEvent::Connected;

            let mut events = map_sse_stream(response.bytes_stream(), idle_timeout);
            while let Some(event) = events.next().await {
                yield event?;
            }
        })
    }
}

/// Pass successful responses through; map the rest to [`LlmError`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &error_body))
}

fn status_error(status: u16, body: &str) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited,
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_types::llm::{Message, MessageRole};

    fn make_provider(base_url: &str, api_key: Option<&str>) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(OpenAiCompatConfig {
            provider_name: "deepseek".to_string(),
            base_url: base_url.to_string(),
            api_key: api_key.map(|k| SecretString::from(k.to_string())),
            request_timeout: Duration::from_secs(5),
            stream_idle_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "deepseek/deepseek-chat".to_string(),
            messages: vec![Message {
                role: MessageRole::User,
                content: "Hello".to_string(),
            }],
            stream: true,
        }
    }

    #[test]
    fn test_provider_name_and_endpoint() {
        let provider = make_provider("https://deepseek.erikpsw.works/", None);
        assert_eq!(provider.name(), "deepseek");
        assert_eq!(
            provider.endpoint(),
            "https://deepseek.erikpsw.works/chat/completions"
        );
        assert!(!provider.has_api_key());
    }

    #[test]
    fn test_post_sets_bearer_auth() {
        let provider = make_provider("http://localhost:8080/v1", Some("sk-test"));
        let built = provider.post(&request(), true).build().unwrap();
        assert_eq!(built.method(), reqwest::Method::POST);
        assert_eq!(built.url().as_str(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(
            built.headers().get("authorization").unwrap(),
            "Bearer sk-test"
        );

        let body: serde_json::Value =
            serde_json::from_slice(built.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_post_without_key_has_no_auth_header() {
        let provider = make_provider("http://localhost:8080", None);
        let built = provider.post(&request(), false).build().unwrap();
        assert!(built.headers().get("authorization").is_none());
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(status_error(401, ""), LlmError::AuthenticationFailed));
        assert!(matches!(status_error(403, ""), LlmError::AuthenticationFailed));
        assert!(matches!(status_error(429, ""), LlmError::RateLimited));
        match status_error(502, "bad gateway") {
            LlmError::Provider { message } => {
                assert!(message.contains("502"));
                assert!(message.contains("bad gateway"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Serve one SSE response that drips `frames` with `gap` between them.
    async fn slow_sse_server(frames: Vec<&'static str>, gap: Duration) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n",
                )
                .await
                .unwrap();
            for frame in frames {
                tokio::time::sleep(gap).await;
                if socket.write_all(frame.as_bytes()).await.is_err() {
                    return;
                }
            }
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_stream_outlives_request_timeout() {
        let delta = "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n";
        let base = slow_sse_server(
            vec![delta, delta, delta, delta, delta, "data: [DONE]\n\n"],
            Duration::from_millis(300),
        )
        .await;

        let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig {
            provider_name: "slow".to_string(),
            base_url: base,
            api_key: None,
            request_timeout: Duration::from_secs(1),
            stream_idle_timeout: Duration::from_secs(2),
        })
        .unwrap();

        let events: Vec<_> = provider.stream(request()).collect().await;
        let deltas = events
            .iter()
            .filter(|e| matches!(e, Ok(StreamEvent::TextDelta { .. })))
            .count();
        assert_eq!(deltas, 5);
        assert!(matches!(events.last(), Some(Ok(StreamEvent::Done))), "{events:?}");
    }

    #[tokio::test]
    async fn test_stream_idle_timeout_still_applies() {
        let delta = "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n";
        let base = slow_sse_server(vec![delta, "data: [DONE]\n\n"], Duration::from_millis(800)).await;

        let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig {
            provider_name: "stalled".to_string(),
            base_url: base,
            api_key: None,
            request_timeout: Duration::from_secs(5),
            stream_idle_timeout: Duration::from_millis(300),
        })
        .unwrap();

        let events: Vec<_> = provider.stream(request()).collect().await;
        match events.last() {
            Some(Err(LlmError::Stream(message))) => assert!(message.contains("no stream event")),
            other => panic!("expected idle timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stream_connection_refused_is_an_error() {
        // Port 9 (discard) is closed on test hosts; the connect fails fast.
        let provider = make_provider("http://127.0.0.1:9", None);
        let mut stream = provider.stream(request());
        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(LlmError::Provider { .. })));
        assert!(stream.next().await.is_none());
    }
}
