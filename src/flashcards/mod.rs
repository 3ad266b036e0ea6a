//! Flashcard Module
//!
//! Card and set types, model-output parsing, and the chunk-by-chunk generator.

pub mod generator;
pub mod models;
pub mod parse;

pub use generator::{FlashcardGenerator, GenerationError, GenerationReport};
pub use models::{Flashcard, FlashcardSet, NewFlashcardSet};
pub use parse::{parse_flashcards, ParseError};
