// Memorix Library
// Exports core modules for use by both the HTTP server and the CLI binary

pub mod billing;
pub mod config;
pub mod documents;
pub mod flashcards;
pub mod llm;
pub mod server;
pub mod storage;
pub mod uploads;

// Re-export commonly used types for CLI
pub use billing::{plans, CheckoutClient, CheckoutError, Plan};
pub use config::{Config, ConfigError, LlmConfig};
pub use documents::{
    count_tokens, estimate_tokens_quick, load_document, Chunk, DocumentKind, LoaderError,
    SplitterError, TextSplitter,
};
pub use flashcards::{
    Flashcard, FlashcardGenerator, FlashcardSet, GenerationError, GenerationReport,
    NewFlashcardSet,
};
pub use llm::{ChatClient, CompletionClient, CompletionError};
pub use server::{router, start_server, AppState, StartupError};
pub use storage::{ContactStore, SetStore, StoreError, WaitlistStore};
pub use uploads::{UploadError, UploadStore};
