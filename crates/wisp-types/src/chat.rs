//! Conversation and session types for Wisp.
//!
//! These types model a single chat conversation: the entries in its log,
//! the lifecycle of the session that owns it, and the events published
//! to listeners while a response streams in.

use serde::{Deserialize, Serialize};

use std::fmt;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;
use crate::llm::Message;

/// A single entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: MessageRole,
    pub content: String,
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ConversationEntry> for Message {
    fn from(entry: &ConversationEntry) -> Self {
        Message {
            role: entry.role,
            content: entry.content.clone(),
        }
    }
}

/// Lifecycle status of a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Streaming,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Streaming => write!(f, "streaming"),
        }
    }
}

/// How a call to `submit` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Input was empty after trimming; nothing happened.
    Ignored,
    /// The stream delivered its end event.
    Completed,
    /// The request or stream failed; the error message was substituted.
    Failed,
    /// The caller cancelled; the last streamed content was kept.
    Cancelled,
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitOutcome::Ignored => write!(f, "ignored"),
            SubmitOutcome::Completed => write!(f, "completed"),
            SubmitOutcome::Failed => write!(f, "failed"),
            SubmitOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Events published on every mutation of a session's log.
///
/// All variants are Clone + Send + Sync for use with tokio broadcast channels.
/// `AssistantUpdated` carries the full content snapshot rather than a delta,
/// so a lagging subscriber only misses intermediate states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A user entry was appended at `index`.
    UserAppended { index: usize, content: String },

    /// An empty assistant placeholder was appended at `index`.
    AssistantStarted { index: usize, model: String },

    /// The placeholder at `index` now holds `content`.
    AssistantUpdated { index: usize, content: String },

    /// The submission returned to idle.
    SubmissionFinished { outcome: SubmitOutcome },

    /// The log was reset to empty.
    Cleared,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_constructors() {
        let u = ConversationEntry::user("hello");
        assert_eq!(u.role, MessageRole::User);
        assert_eq!(u.content, "hello");

        let a = ConversationEntry::assistant("");
        assert_eq!(a.role, MessageRole::Assistant);
        assert!(a.content.is_empty());
    }

    #[test]
    fn test_entry_to_message() {
        let entry = ConversationEntry::user("ping");
        let msg = Message::from(&entry);
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "ping");
    }

    #[test]
    fn test_session_status_default_is_idle() {
        assert_eq!(SessionStatus::default(), SessionStatus::Idle);
        assert_eq!(SessionStatus::Streaming.to_string(), "streaming");
    }

    #[test]
    fn test_session_event_serde() {
        let ev = SessionEvent::SubmissionFinished {
            outcome: SubmitOutcome::Failed,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(json, r#"{"type":"submission_finished","outcome":"failed"}"#);
    }
}
