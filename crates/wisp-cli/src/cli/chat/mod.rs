//! Interactive terminal chat.
//!
//! Streams replies from a `ChatSession` with a thinking spinner, renders
//! finished replies as markdown with a dimmed reasoning block, and handles
//! slash commands. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
