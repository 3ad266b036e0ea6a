use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One question/answer study item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

impl Flashcard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

/// Named, ordered collection of flashcards persisted for review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
    pub created_at: DateTime<Utc>,
}

/// Input for saving a new flashcard set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFlashcardSet {
    pub name: String,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

/// Shape the model is asked to return
#[derive(Debug, Deserialize)]
pub(crate) struct FlashcardsEnvelope {
    pub flashcards: Vec<Flashcard>,
}
