//! Document Ingestion
//!
//! Loading uploaded files into page text, splitting them into overlapping
//! chunks, and sizing chunks in tokens.

pub mod loader;
pub mod splitter;
pub mod tokens;

pub use loader::{load_document, load_document_async, DocumentKind, LoaderError};
pub use splitter::{Chunk, SplitterError, TextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use tokens::{count_tokens, estimate_tokens_quick};
