//! Model Provider Integration
//!
//! Chat-completion client and the prompt used to request flashcards.

pub mod client;
pub mod prompt;

pub use client::{ChatClient, CompletionClient, CompletionError};
pub use prompt::FLASHCARD_SYSTEM_PROMPT;
