//! Document Splitting
//!
//! Splits loaded page text into bounded, overlapping chunks. Each chunk is
//! sized to fit a single model request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tokens::count_tokens;

/// Maximum chunk length in characters
pub const DEFAULT_CHUNK_SIZE: usize = 2_000;

/// Characters carried over from the end of one chunk into the next
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Separators tried in order, coarsest first. The empty separator splits
/// between characters and guarantees every piece eventually fits.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

#[derive(Error, Debug)]
pub enum SplitterError {
    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("Chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

impl Serialize for SplitterError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// A chunk of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Chunk index across the whole document
    pub index: u32,
    /// Page the chunk was cut from
    pub page: u32,
    pub content: String,
    pub char_count: usize,
    pub token_count: u32,
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, SplitterError> {
        if chunk_size == 0 {
            return Err(SplitterError::ZeroChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(SplitterError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        })
    }

    /// Replace the separator list. Dropping `""` allows chunks longer than
    /// `chunk_size` when no coarser separator applies.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split a single text into trimmed, non-empty chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split every page independently and number the chunks in order
    pub fn split_pages<S: AsRef<str>>(&self, pages: &[S]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for (page, text) in pages.iter().enumerate() {
            for content in self.split_text(text.as_ref()) {
                chunks.push(Chunk {
                    index: chunks.len() as u32,
                    page: page as u32,
                    char_count: char_len(&content),
                    token_count: count_tokens(&content),
                    content,
                });
            }
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // First separator present in the text wins; "" always matches
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: Option<&[String]> = None;
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = Some(&separators[i + 1..]);
                break;
            }
        }

        let mut good_splits: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }
            match remaining {
                Some(rest) if !rest.is_empty() => {
                    final_chunks.extend(self.split_recursive(piece, rest));
                }
                _ => {
                    let trimmed = piece.trim();
                    if !trimmed.is_empty() {
                        final_chunks.push(trimmed.to_string());
                    }
                }
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Greedily pack pieces into windows of at most `chunk_size`, carrying up
    /// to `chunk_overlap` characters of trailing pieces into the next window.
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut total = 0usize;

        for &piece in splits {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(doc) = join_window(&window) {
                    docs.push(doc);
                }
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    let (_, dropped) = window.remove(0);
                    total -= dropped;
                }
            }

            window.push((piece, len));
            total += len;
        }

        if let Some(doc) = join_window(&window) {
            docs.push(doc);
        }
        docs
    }
}

fn join_window(window: &[(&str, usize)]) -> Option<String> {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` before every occurrence of `separator`, keeping the separator
/// at the head of the following piece. An empty separator splits into single
/// characters. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0usize;
    for (i, _) in text.char_indices() {
        if i > start && text[i..].starts_with(separator) {
            pieces.push(&text[start..i]);
            start = i;
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(word: &str, words: usize) -> String {
        vec![word; words].join(" ")
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split_text("Cells divide by mitosis.\n\nMeiosis makes gametes.");
        assert_eq!(chunks, vec!["Cells divide by mitosis.\n\nMeiosis makes gametes."]);
    }

    #[test]
    fn test_empty_and_blank_text() {
        let splitter = TextSplitter::default();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   \n\n  \n").is_empty());
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(split_keeping_separator("a b c", " "), vec!["a", " b", " c"]);
        assert_eq!(split_keeping_separator("a\n\n\nb", "\n\n"), vec!["a", "\n", "\n\nb"]);
        assert_eq!(split_keeping_separator("héé", ""), vec!["h", "é", "é"]);
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = TextSplitter::new(100, 20).unwrap();
        let text = (0..10)
            .map(|i| paragraph(&format!("w{i}"), 30))
            .collect::<Vec<_>>()
            .join("\n\n");

        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 100, "chunk too long: {}", char_len(chunk));
            assert_eq!(chunk, chunk.trim());
        }
    }

    #[test]
    fn test_overlap_carries_tail_words() {
        let splitter = TextSplitter::new(30, 10).unwrap();
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = splitter.split_text(text);

        assert_eq!(
            chunks,
            vec![
                "alpha beta gamma delta epsilon",
                "epsilon zeta eta theta iota",
                "iota kappa",
            ]
        );
    }

    #[test]
    fn test_unbroken_text_split_by_characters() {
        let splitter = TextSplitter::new(10, 0).unwrap();
        let text = "abcdefghijklmnopqrstuvwxy";
        let chunks = splitter.split_text(text);
        assert_eq!(chunks, vec!["abcdefghij", "klmnopqrst", "uvwxy"]);
    }

    #[test]
    fn test_without_empty_separator_long_piece_survives() {
        let splitter = TextSplitter::new(10, 0).unwrap().with_separators(["\n\n", " "]);
        let chunks = splitter.split_text("short averyveryverylongword");
        assert_eq!(chunks, vec!["short", "averyveryverylongword"]);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(TextSplitter::new(0, 0), Err(SplitterError::ZeroChunkSize)));
        assert!(matches!(
            TextSplitter::new(100, 100),
            Err(SplitterError::OverlapTooLarge { size: 100, overlap: 100 })
        ));
    }

    #[test]
    fn test_split_pages_numbers_chunks_in_order() {
        let splitter = TextSplitter::new(30, 0).unwrap();
        let pages = vec![
            "first page words here".to_string(),
            String::new(),
            "second page has rather more words in it".to_string(),
        ];

        let chunks = splitter.split_pages(&pages);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].page, 0);
        assert_eq!(chunks[1].page, 2);
        assert_eq!(chunks[2].page, 2);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i as u32);
            assert_eq!(chunk.char_count, chunk.content.chars().count());
            assert!(chunk.token_count > 0);
        }
    }
}
