//! Streaming chat session.
//!
//! `ChatSession` owns the conversation log and turns a submitted string
//! into a live-updated assistant entry. One submission runs at a time;
//! the busy flag is released by a drop guard, so abandoning a submission
//! future (e.g. the hosting view going away) leaves the session idle.
//!
//! Every log mutation is published on the session's [`EventBus`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use wisp_types::chat::{ConversationEntry, SessionEvent, SessionStatus, SubmitOutcome};
use wisp_types::config::DEFAULT_ERROR_MESSAGE;
use wisp_types::error::SessionError;
use wisp_types::llm::{CompletionRequest, StreamEvent};

use crate::event::EventBus;
use crate::llm::router::BackendRouter;

use super::log::ConversationLog;
use super::reasoning::ReasoningFilter;

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 1024;

pub struct ChatSession {
    router: Arc<BackendRouter>,
    log: Mutex<ConversationLog>,
    model: Mutex<String>,
    error_message: String,
    busy: AtomicBool,
    events: EventBus,
}

/// Holds the busy flag for the duration of a submission.
///
/// On drop the placeholder is sealed and the flag released, whatever
/// path the submission took.
struct SubmissionGuard<'a> {
    session: &'a ChatSession,
}

impl<'a> SubmissionGuard<'a> {
    fn acquire(session: &'a ChatSession) -> Result<Self, SessionError> {
        session
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::Busy)?;
        Ok(Self { session })
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.session.lock_log().seal_tail();
        self.session.busy.store(false, Ordering::Release);
    }
}

impl ChatSession {
    /// Create an idle session with an empty log.
    pub fn new(router: Arc<BackendRouter>, model: impl Into<String>) -> Self {
        Self {
            router,
            log: Mutex::new(ConversationLog::new()),
            model: Mutex::new(model.into()),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            busy: AtomicBool::new(false),
            events: EventBus::new(EVENT_CAPACITY),
        }
    }

    /// Override the message substituted when a submission fails.
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn router(&self) -> &BackendRouter {
        &self.router
    }

    /// Snapshot of the conversation log.
    pub fn entries(&self) -> Vec<ConversationEntry> {
        self.lock_log().entries().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock_log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_log().is_empty()
    }

    pub fn model(&self) -> String {
        self.model.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_busy() {
            SessionStatus::Streaming
        } else {
            SessionStatus::Idle
        }
    }

    /// Change the model used by later submissions.
    pub fn select_model(&self, model: impl Into<String>) -> Result<(), SessionError> {
        let _guard = SubmissionGuard::acquire(self)?;
        let model = model.into();
        if self.router.route(&model).is_none() {
            warn!(model = %model, "selected model has no route; the fallback backend will serve it");
        }
        info!(model = %model, "model selected");
        *self.model.lock().unwrap_or_else(PoisonError::into_inner) = model;
        Ok(())
    }

    /// Reset the log to empty.
    pub fn clear(&self) -> Result<(), SessionError> {
        let guard = SubmissionGuard::acquire(self)?;
        self.lock_log().clear();
        drop(guard);
        debug!("conversation cleared");
        self.events.publish(SessionEvent::Cleared);
        Ok(())
    }

    /// Submit user text and stream the assistant reply into the log.
    ///
    /// Whitespace-only input is ignored. Network and stream failures are not
    /// returned: the placeholder is replaced with the error message and the
    /// outcome is [`SubmitOutcome::Failed`]. Cancelling `cancel` drops the
    /// stream and keeps whatever content arrived.
    pub async fn submit(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<SubmitOutcome, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring empty submission");
            return Ok(SubmitOutcome::Ignored);
        }

        let guard = SubmissionGuard::acquire(self)?;
        let model = self.model();

        let (user_index, request, placeholder) = {
            let mut log = self.lock_log();
            let user_index = log.push_user(text)?;
            let request = CompletionRequest {
                model: model.clone(),
                messages: log.to_messages(),
                stream: true,
            };
            let placeholder = log.begin_assistant()?;
            (user_index, request, placeholder)
        };

        self.events.publish(SessionEvent::UserAppended {
            index: user_index,
            content: text.to_string(),
        });
        self.events.publish(SessionEvent::AssistantStarted {
            index: placeholder,
            model: model.clone(),
        });

        let span = info_span!(
            "chat",
            gen_ai.operation.name = "chat",
            gen_ai.request.model = %model,
            history = request.messages.len(),
        );
        let outcome = self
            .stream_into_log(request, placeholder, cancel)
            .instrument(span)
            .await?;

        drop(guard);
        self.events
            .publish(SessionEvent::SubmissionFinished { outcome });
        Ok(outcome)
    }

    async fn stream_into_log(
        &self,
        request: CompletionRequest,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<SubmitOutcome, SessionError> {
        let (mut events, detect) = match self.router.resolve(&request.model) {
            Ok(resolved) => {
                if !resolved.routed {
                    warn!(backend = resolved.provider.name(), "no route for model, using fallback backend");
                }
                info!(backend = resolved.provider.name(), "opening completion stream");
                (resolved.provider.stream(request), resolved.reasoning_markers)
            }
            Err(e) => {
                error!(error = %e, "cannot route submission");
                return self.fail(index);
            }
        };

        let mut filter = ReasoningFilter::new(detect);
        let mut fragments: usize = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(fragments, "submission cancelled");
                    return Ok(SubmitOutcome::Cancelled);
                }
                next = events.next() => next,
            };

            match next {
                Some(Ok(StreamEvent::TextDelta { text })) => {
                    fragments += 1;
                    if filter.push(&text) {
                        self.update_tail(filter.content())?;
                    }
                }
                Some(Ok(StreamEvent::Done)) => {
                    if filter.finish() {
                        self.update_tail(filter.content())?;
                    }
                    info!(fragments, chars = filter.content().chars().count(), "stream completed");
                    return Ok(SubmitOutcome::Completed);
                }
                Some(Ok(StreamEvent::Usage(usage))) => {
                    debug!(
                        gen_ai.usage.input_tokens = usage.input_tokens,
                        gen_ai.usage.output_tokens = usage.output_tokens,
                        "usage reported"
                    );
                }
                Some(Ok(StreamEvent::Finish { reason })) => {
                    debug!(gen_ai.response.finish_reasons = %reason, "finish reason reported");
                }
                Some(Ok(StreamEvent::Connected)) => {
                    debug!("stream connected");
                }
                Some(Err(e)) => {
                    error!(error = %e, fragments, "completion stream failed");
                    return self.fail(index);
                }
                None => {
                    error!(fragments, "completion stream ended without a terminal event");
                    return self.fail(index);
                }
            }
        }
    }

    /// Replace the live placeholder and tell listeners.
    fn update_tail(&self, content: &str) -> Result<(), SessionError> {
        let index = self.lock_log().replace_tail(content)?;
        self.events.publish(SessionEvent::AssistantUpdated {
            index,
            content: content.to_string(),
        });
        Ok(())
    }

    fn fail(&self, index: usize) -> Result<SubmitOutcome, SessionError> {
        let replaced = self.lock_log().replace_tail(self.error_message.as_str())?;
        debug_assert_eq!(replaced, index);
        self.events.publish(SessionEvent::AssistantUpdated {
            index,
            content: self.error_message.clone(),
        });
        Ok(SubmitOutcome::Failed)
    }

    fn lock_log(&self) -> MutexGuard<'_, ConversationLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
