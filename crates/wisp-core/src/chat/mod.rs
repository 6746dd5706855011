//! Conversation state and the streaming submission pipeline.

pub mod log;
pub mod reasoning;
pub mod session;

pub use log::ConversationLog;
pub use reasoning::ReasoningFilter;
pub use session::ChatSession;
