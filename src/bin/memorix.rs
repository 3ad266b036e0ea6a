//! Memorix CLI
//!
//! Command-line client for chunking documents, generating flashcards and
//! managing saved sets. Every command prints a single JSON document.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use memorix_lib::flashcards::parse_flashcards;
use memorix_lib::{
    count_tokens, load_document, plans, ChatClient, Chunk, Config, DocumentKind, Flashcard,
    FlashcardGenerator, NewFlashcardSet, SetStore, TextSplitter,
};

#[derive(Parser)]
#[command(name = "memorix-cli")]
#[command(about = "Memorix CLI - flashcards from text and documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a document into chunks as the generator would
    Chunk {
        /// Path to a PDF, DOCX or text file
        file: PathBuf,
        /// Document type (pdf, docx, txt); defaults to the file extension
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },
    /// Generate flashcards from text or a document
    Generate {
        /// Text to generate from (or - to read from stdin)
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// Document to generate from
        #[arg(long)]
        file: Option<PathBuf>,
        /// Document type (pdf, docx, txt); defaults to the file extension
        #[arg(short = 't', long = "type", requires = "file")]
        kind: Option<String>,
    },
    /// Saved flashcard sets
    Sets {
        #[command(subcommand)]
        action: SetsAction,
    },
    /// Token counting commands
    Tokens {
        #[command(subcommand)]
        action: TokensAction,
    },
    /// List subscription plans
    Plans,
}

#[derive(Subcommand)]
enum SetsAction {
    /// List all sets, newest first
    List,
    /// Show one set
    Show { id: String },
    /// Save cards from a JSON file as a new set
    Save {
        name: String,
        /// JSON array of cards, or an object with a `flashcards` array
        cards: PathBuf,
    },
    /// Delete a set
    Delete { id: String },
}

#[derive(Subcommand)]
enum TokensAction {
    /// Count tokens in text
    Count {
        /// Text to count (or - to read from stdin)
        text: String,
    },
}

// ============ Output Types ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChunkOutput {
    file: String,
    chunk_size: usize,
    chunk_overlap: usize,
    page_count: usize,
    chunk_count: usize,
    total_tokens: u32,
    chunks: Vec<Chunk>,
}

#[derive(Serialize)]
struct SetSummary {
    id: String,
    name: String,
    cards: usize,
    created: String,
}

#[derive(Serialize)]
struct TokenCountOutput {
    tokens: u32,
}

#[derive(Serialize)]
struct ErrorOutput {
    error: String,
}

// ============ Main ============

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Chunk { file, kind } => handle_chunk(&file, kind.as_deref()),
        Commands::Generate { text, file, kind } => handle_generate(text, file, kind.as_deref()),
        Commands::Sets { action } => handle_sets(action),
        Commands::Tokens { action } => handle_tokens(action),
        Commands::Plans => handle_plans(),
    };

    match result {
        Ok(json) => println!("{}", json),
        Err(e) => {
            let error = ErrorOutput { error: format!("{e:#}") };
            println!("{}", serde_json::to_string(&error).unwrap_or_default());
            std::process::exit(1);
        }
    }
}

// ============ Handlers ============

fn handle_chunk(file: &Path, kind: Option<&str>) -> Result<String> {
    let config = Config::load()?;
    let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;

    let pages = load_document(file, document_kind(file, kind), config.max_upload_bytes)?;
    let chunks = splitter.split_pages(&pages);

    let output = ChunkOutput {
        file: file.display().to_string(),
        chunk_size: splitter.chunk_size(),
        chunk_overlap: splitter.chunk_overlap(),
        page_count: pages.len(),
        chunk_count: chunks.len(),
        total_tokens: chunks.iter().map(|c| c.token_count).sum(),
        chunks,
    };
    Ok(serde_json::to_string(&output)?)
}

fn handle_generate(text: Option<String>, file: Option<PathBuf>, kind: Option<&str>) -> Result<String> {
    let config = Config::load()?;
    let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;
    let generator = FlashcardGenerator::new(Arc::new(ChatClient::new(&config.llm)), splitter)
        .with_max_document_bytes(config.max_upload_bytes);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    match (text, file) {
        (Some(text), _) => {
            let input = read_arg_or_stdin(text)?;
            let cards: Vec<Flashcard> = runtime.block_on(generator.generate_from_text(&input))?;
            Ok(serde_json::to_string(&cards)?)
        }
        (None, Some(file)) => {
            let kind = document_kind(&file, kind);
            let report = runtime.block_on(generator.generate_from_document(&file, kind))?;
            Ok(serde_json::to_string(&report)?)
        }
        (None, None) => bail!("either --text or --file is required"),
    }
}

fn handle_sets(action: SetsAction) -> Result<String> {
    let config = Config::load()?;
    let store = SetStore::open(config.sets_dir())?;

    match action {
        SetsAction::List => {
            let items: Vec<SetSummary> = store
                .list()?
                .into_iter()
                .map(|s| SetSummary {
                    id: s.id,
                    name: s.name,
                    cards: s.flashcards.len(),
                    created: s.created_at.to_rfc3339(),
                })
                .collect();
            Ok(serde_json::to_string(&items)?)
        }

        SetsAction::Show { id } => Ok(serde_json::to_string(&store.get(&id)?)?),

        SetsAction::Save { name, cards } => {
            let raw = std::fs::read_to_string(&cards)
                .with_context(|| format!("failed to read {}", cards.display()))?;
            let flashcards = read_cards(&raw)?;
            let set = store.create(NewFlashcardSet { name, flashcards })?;
            Ok(serde_json::to_string(&set)?)
        }

        SetsAction::Delete { id } => {
            store.delete(&id)?;
            Ok(serde_json::json!({ "status": "deleted", "id": id }).to_string())
        }
    }
}

fn handle_tokens(action: TokensAction) -> Result<String> {
    match action {
        TokensAction::Count { text } => {
            let input = read_arg_or_stdin(text)?;
            let output = TokenCountOutput {
                tokens: count_tokens(&input),
            };
            Ok(serde_json::to_string(&output)?)
        }
    }
}

fn handle_plans() -> Result<String> {
    Ok(serde_json::to_string(&plans())?)
}

// ============ Helpers ============

fn document_kind(file: &Path, kind: Option<&str>) -> DocumentKind {
    DocumentKind::detect(kind.unwrap_or_default(), file)
}

fn read_arg_or_stdin(value: String) -> Result<String> {
    if value != "-" {
        return Ok(value);
    }
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Accepts a bare card array or anything with a `flashcards` array,
/// including the output of `generate`
fn read_cards(raw: &str) -> Result<Vec<Flashcard>> {
    if let Ok(cards) = serde_json::from_str::<Vec<Flashcard>>(raw) {
        return Ok(cards);
    }
    parse_flashcards(raw).context("cards file is neither a card array nor a flashcards object")
}
