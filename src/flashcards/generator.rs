//! Flashcard Generation
//!
//! Free text goes to the model in one request. Documents are loaded, split
//! into overlapping chunks and sent one chunk per request, in order. A chunk
//! that fails (transport, HTTP status, unparseable reply) is logged and
//! skipped; the rest of the document still produces cards. A missing API key
//! aborts the whole document.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::models::Flashcard;
use super::parse::{parse_flashcards, ParseError};
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::documents::loader::{load_document_async, DocumentKind, LoaderError};
use crate::documents::splitter::TextSplitter;
use crate::llm::{CompletionClient, CompletionError, FLASHCARD_SYSTEM_PROMPT};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Nothing to generate from: input text is empty")]
    EmptyInput,
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),
    #[error("{0}")]
    Parse(#[from] ParseError),
}

impl Serialize for GenerationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Outcome of generating from a whole document
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub flashcards: Vec<Flashcard>,
    pub chunk_count: usize,
    /// Indices of chunks whose request or reply failed
    pub failed_chunks: Vec<u32>,
}

#[derive(Clone)]
pub struct FlashcardGenerator {
    client: Arc<dyn CompletionClient>,
    splitter: TextSplitter,
    max_document_bytes: u64,
}

impl FlashcardGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, splitter: TextSplitter) -> Self {
        Self {
            client,
            splitter,
            max_document_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_document_bytes(mut self, max_bytes: u64) -> Self {
        self.max_document_bytes = max_bytes;
        self
    }

    pub fn splitter(&self) -> &TextSplitter {
        &self.splitter
    }

    /// One request for the whole text. Failure is returned to the caller.
    pub async fn generate_from_text(&self, text: &str) -> Result<Vec<Flashcard>, GenerationError> {
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyInput);
        }
        let cards = self.request_cards(text).await?;
        info!(count = cards.len(), "Generated flashcards from text");
        Ok(cards)
    }

    /// Load, split and generate chunk by chunk
    pub async fn generate_from_document(
        &self,
        path: &Path,
        kind: DocumentKind,
    ) -> Result<GenerationReport, GenerationError> {
        let pages = load_document_async(path, kind, self.max_document_bytes).await?;
        self.generate_from_pages(&pages).await
    }

    /// Split already-loaded pages and generate chunk by chunk
    pub async fn generate_from_pages<S: AsRef<str>>(
        &self,
        pages: &[S],
    ) -> Result<GenerationReport, GenerationError> {
        let chunks = self.splitter.split_pages(pages);
        let mut report = GenerationReport {
            chunk_count: chunks.len(),
            ..GenerationReport::default()
        };

        for chunk in &chunks {
            match self.request_cards(&chunk.content).await {
                Ok(cards) => report.flashcards.extend(cards),
                // Every remaining chunk would fail the same way
                Err(e @ GenerationError::Completion(CompletionError::MissingApiKey)) => return Err(e),
                Err(e) => {
                    warn!(chunk = chunk.index, page = chunk.page, error = %e, "Skipping chunk");
                    report.failed_chunks.push(chunk.index);
                }
            }
        }

        info!(
            chunks = report.chunk_count,
            failed = report.failed_chunks.len(),
            cards = report.flashcards.len(),
            "Generated flashcards from document"
        );
        Ok(report)
    }

    async fn request_cards(&self, content: &str) -> Result<Vec<Flashcard>, GenerationError> {
        let reply = self.client.complete_json(FLASHCARD_SYSTEM_PROMPT, content).await?;
        Ok(parse_flashcards(&reply)?)
    }
}
