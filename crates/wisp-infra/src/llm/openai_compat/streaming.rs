//! OpenAI SSE body to [`StreamEvent`] adapter.
//!
//! Parses a raw response body as server-sent events and maps each `data:`
//! payload to provider-agnostic events:
//! 1. `data: [DONE]` -- emits `Done` and ends the stream
//! 2. JSON chunk -- `TextDelta` per non-empty content delta, then `Finish`
//!    and `Usage` when present
//! 3. JSON chunk with an `error` member -- stream error, stream ends
//! 4. Non-JSON payload -- logged and skipped
//!
//! A body that ends before `[DONE]`, a transport error, or silence longer
//! than the idle timeout all end the stream with `LlmError::Stream`.

use std::fmt::Display;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use tracing::{trace, warn};

use wisp_core::llm::provider::EventStream;
use wisp_types::llm::{LlmError, StreamEvent};

use super::types::ChatCompletionChunk;

/// Terminal sentinel sent as the last `data:` payload.
const DONE_SENTINEL: &str = "[DONE]";

/// Map a response body byte stream to a stream of [`StreamEvent`]s.
pub fn map_sse_stream<S, B, E>(body: S, idle_timeout: Duration) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut events = Box::pin(body.eventsource());

        loop {
            let sse = match tokio::time::timeout(idle_timeout, events.next()).await {
                Ok(Some(Ok(sse))) => sse,
                Ok(Some(Err(e))) => {
                    yield Err(LlmError::Stream(format!("SSE transport error: {e}")));
                    return;
                }
                Ok(None) => {
                    yield Err(LlmError::Stream("stream closed before [DONE]".to_string()));
                    return;
                }
                Err(_) => {
                    yield Err(LlmError::Stream(format!(
                        "no stream event within {}s",
                        idle_timeout.as_secs()
                    )));
                    return;
                }
            };

            let data = sse.data.trim();
            trace!(data, "SSE event");
            if data.is_empty() {
                continue;
            }
            if data == DONE_SENTINEL {
                yield Ok(StreamEvent::Done);
                return;
            }

            let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(error = %e, data, "skipping malformed stream chunk");
                    continue;
                }
            };

            if let Some(message) = chunk.error_message() {
                yield Err(LlmError::Stream(message));
                return;
            }

            for event in chunk.into_events() {
                yield Ok(event);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(
        frames: Vec<&'static str>,
    ) -> impl Stream<Item = Result<&'static str, std::io::Error>> + Send + 'static {
        futures_util::stream::iter(frames.into_iter().map(Ok))
    }

    async fn collect(stream: EventStream) -> Vec<Result<StreamEvent, LlmError>> {
        stream.collect().await
    }

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::TextDelta {
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn deltas_then_done() {
        let events = collect(map_sse_stream(
            body(vec![
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n",
                "data: [DONE]\n\n",
            ]),
            Duration::from_secs(5),
        ))
        .await;

        let events: Vec<StreamEvent> = events.into_iter().map(Result::unwrap).collect();
        assert_eq!(events, vec![delta("Hi"), delta(" there"), StreamEvent::Done]);
    }

    #[tokio::test]
    async fn event_split_across_body_chunks() {
        let events = collect(map_sse_stream(
            body(vec![
                "data: {\"choices\":[{\"del",
                "ta\":{\"content\":\"<think>\"}}]}\n",
                "\ndata: [DO",
                "NE]\n\n",
            ]),
            Duration::from_secs(5),
        ))
        .await;

        let events: Vec<StreamEvent> = events.into_iter().map(Result::unwrap).collect();
        assert_eq!(events, vec![delta("<think>"), StreamEvent::Done]);
    }

    #[tokio::test]
    async fn malformed_chunk_is_skipped() {
        let events = collect(map_sse_stream(
            body(vec![
                "data: {not json\n\n",
                ": keepalive comment\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
                "data: [DONE]\n\n",
            ]),
            Duration::from_secs(5),
        ))
        .await;

        let events: Vec<StreamEvent> = events.into_iter().map(Result::unwrap).collect();
        assert_eq!(events, vec![delta("ok"), StreamEvent::Done]);
    }

    #[tokio::test]
    async fn error_chunk_ends_stream() {
        let events = collect(map_sse_stream(
            body(vec![
                "data: {\"choices\":[{\"delta\":{\"content\":\"par\"}}]}\n\n",
                "data: {\"error\":{\"message\":\"upstream failed\"}}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n\n",
            ]),
            Duration::from_secs(5),
        ))
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap(), &delta("par"));
        assert!(matches!(&events[1], Err(LlmError::Stream(m)) if m == "upstream failed"));
    }

    #[tokio::test]
    async fn close_without_done_is_an_error() {
        let events = collect(map_sse_stream(
            body(vec!["data: {\"choices\":[{\"delta\":{\"content\":\"cut\"}}]}\n\n"]),
            Duration::from_secs(5),
        ))
        .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], Err(LlmError::Stream(m)) if m.contains("[DONE]")));
    }

    #[tokio::test]
    async fn transport_error_is_a_stream_error() {
        let frames: Vec<Result<&'static str, std::io::Error>> = vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n"),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let events = collect(map_sse_stream(
            futures_util::stream::iter(frames),
            Duration::from_secs(5),
        ))
        .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], Err(LlmError::Stream(m)) if m.contains("reset")));
    }

    #[tokio::test]
    async fn idle_body_times_out() {
        let silent = futures_util::stream::pending::<Result<&'static str, std::io::Error>>();
        let events = collect(map_sse_stream(silent, Duration::from_millis(20))).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Err(LlmError::Stream(m)) if m.contains("no stream event")));
    }

    #[tokio::test]
    async fn finish_and_usage_are_forwarded() {
        let events = collect(map_sse_stream(
            body(vec![
                "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
                "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":3,\"completion_tokens\":7}}\n\n",
                "data: [DONE]\n\n",
            ]),
            Duration::from_secs(5),
        ))
        .await;

        let events: Vec<StreamEvent> = events.into_iter().map(Result::unwrap).collect();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            StreamEvent::Finish {
                reason: "stop".to_string()
            }
        );
        assert!(matches!(events[1], StreamEvent::Usage(ref u) if u.output_tokens == 7));
        assert_eq!(events[2], StreamEvent::Done);
    }
}
