//! Ordered conversation log with a single live assistant placeholder.
//!
//! The log is append-only except for the tail: while a placeholder is
//! live, `replace_tail` swaps its content in place. At most one placeholder
//! is live at a time; `seal_tail` ends it.

use wisp_types::chat::ConversationEntry;
use wisp_types::error::LogError;
use wisp_types::llm::Message;

#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    entries: Vec<ConversationEntry>,
    live_tail: bool,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    /// Whether the tail is an assistant placeholder still being extended.
    pub fn has_live_tail(&self) -> bool {
        self.live_tail
    }

    /// Append a user entry. Returns its index.
    pub fn push_user(&mut self, content: impl Into<String>) -> Result<usize, LogError> {
        if self.live_tail {
            return Err(LogError::PlaceholderActive);
        }
        self.entries.push(ConversationEntry::user(content));
        Ok(self.entries.len() - 1)
    }

    /// Append an empty assistant placeholder and mark it live. Returns its index.
    pub fn begin_assistant(&mut self) -> Result<usize, LogError> {
        if self.live_tail {
            return Err(LogError::PlaceholderActive);
        }
        self.entries.push(ConversationEntry::assistant(String::new()));
        self.live_tail = true;
        Ok(self.entries.len() - 1)
    }

    /// Replace the live placeholder with a copy carrying `content`.
    pub fn replace_tail(&mut self, content: impl Into<String>) -> Result<usize, LogError> {
        if !self.live_tail {
            return Err(LogError::NoPlaceholder);
        }
        let index = self.entries.len() - 1;
        self.entries[index] = ConversationEntry::assistant(content);
        Ok(index)
    }

    /// Stop extending the placeholder. A no-op when none is live.
    pub fn seal_tail(&mut self) {
        self.live_tail = false;
    }

    /// Reset to empty.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.live_tail = false;
    }

    /// Messages for a completion request. A live placeholder is never sent.
    pub fn to_messages(&self) -> Vec<Message> {
        let sent = if self.live_tail {
            &self.entries[..self.entries.len() - 1]
        } else {
            &self.entries[..]
        };
        sent.iter().map(Message::from).collect()
    }
}
