//! Document Loading
//!
//! Turns an uploaded file into page texts ready for splitting. PDF text is
//! extracted with pdf-extract, DOCX text is read straight out of the
//! `word/document.xml` part, anything else must be UTF-8 text.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("Parse error ({format}): {cause}")]
    Parse { format: &'static str, cause: String },
    #[error("File too large: {0} bytes (max {1} bytes)")]
    FileTooLarge(u64, u64),
}

impl Serialize for LoaderError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// How a document's bytes are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    /// Plain text of any other extension
    Text,
}

impl DocumentKind {
    /// Map a request `type` value or file extension to a kind
    pub fn from_type(value: &str) -> Self {
        match value.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => DocumentKind::Pdf,
            "docx" => DocumentKind::Docx,
            _ => DocumentKind::Text,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .map(|e| Self::from_type(&e.to_string_lossy()))
            .unwrap_or(DocumentKind::Text)
    }

    /// Kind of an uploaded file. An explicit `pdf` or `docx` type wins; any
    /// other type (`document`, `other`, empty) defers to the file extension.
    pub fn detect(type_hint: &str, path: &Path) -> Self {
        match Self::from_type(type_hint) {
            DocumentKind::Text => Self::from_path(path),
            kind => kind,
        }
    }
}

/// Load a document as a list of page texts.
///
/// Blocking; run it on a blocking thread from async code.
pub fn load_document(path: &Path, kind: DocumentKind, max_bytes: u64) -> Result<Vec<String>, LoaderError> {
    if !path.is_file() {
        return Err(LoaderError::NotFound(path.display().to_string()));
    }
    let file_size = fs::metadata(path)?.len();
    if file_size > max_bytes {
        return Err(LoaderError::FileTooLarge(file_size, max_bytes));
    }

    let bytes = fs::read(path)?;
    debug!(path = %path.display(), kind = ?kind, bytes = bytes.len(), "Loading document");

    match kind {
        DocumentKind::Pdf => load_pdf(&bytes),
        DocumentKind::Docx => load_docx(&bytes),
        DocumentKind::Text => load_text(bytes, path),
    }
}

/// Async wrapper around [`load_document`] that keeps parsing off the runtime
pub async fn load_document_async(
    path: &Path,
    kind: DocumentKind,
    max_bytes: u64,
) -> Result<Vec<String>, LoaderError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || load_document(&path, kind, max_bytes))
        .await
        .map_err(|e| LoaderError::Io(std::io::Error::other(e.to_string())))?
}

/// Load with the default size cap
pub fn load_document_default(path: &Path, kind: DocumentKind) -> Result<Vec<String>, LoaderError> {
    load_document(path, kind, DEFAULT_MAX_UPLOAD_BYTES)
}

fn load_pdf(bytes: &[u8]) -> Result<Vec<String>, LoaderError> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| LoaderError::Parse {
        format: "PDF",
        cause: e.to_string(),
    })?;

    // pdf-extract separates pages with form feeds
    Ok(text
        .split('\u{c}')
        .map(clean_page)
        .filter(|page| !page.is_empty())
        .collect())
}

fn clean_page(page: &str) -> String {
    page.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn load_docx(bytes: &[u8]) -> Result<Vec<String>, LoaderError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| LoaderError::Parse {
        format: "DOCX",
        cause: format!("not a ZIP container: {e}"),
    })?;

    let mut document_xml = archive.by_name("word/document.xml").map_err(|e| LoaderError::Parse {
        format: "DOCX",
        cause: format!("missing word/document.xml: {e}"),
    })?;

    let mut xml = String::new();
    document_xml.read_to_string(&mut xml)?;

    let text = docx_xml_to_text(&xml)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![text])
}

/// Collect the text runs of a WordprocessingML body, one paragraph per line
fn docx_xml_to_text(xml: &str) -> Result<String, LoaderError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text = true;
                }
            }
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().map_err(|err| LoaderError::Parse {
                    format: "DOCX",
                    cause: err.to_string(),
                })?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let paragraph = current.trim().to_string();
                    if !paragraph.is_empty() {
                        paragraphs.push(paragraph);
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(LoaderError::Parse {
                    format: "DOCX",
                    cause: format!("XML error at {}: {e}", reader.buffer_position()),
                })
            }
            _ => {}
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        paragraphs.push(tail.to_string());
    }

    Ok(paragraphs.join("\n"))
}

fn load_text(bytes: Vec<u8>, path: &Path) -> Result<Vec<String>, LoaderError> {
    let text = String::from_utf8(bytes).map_err(|_| {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        LoaderError::UnsupportedType(ext)
    })?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![text])
}
