//! Application layer for EduVox.
//!
//! This crate provides the session use case that coordinates the archive,
//! the AI backend, and the voice pipeline into one interactive chat session.

pub mod chat_session;

pub use chat_session::{ChatSession, SYSTEM_INSTRUCTION};
