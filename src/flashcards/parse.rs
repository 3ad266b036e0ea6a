//! Parsing model output into flashcards.

use thiserror::Error;

use super::models::{Flashcard, FlashcardsEnvelope};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Model output is not valid flashcard JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Parse a `{"flashcards": [...]}` reply.
///
/// Falls back to the outermost `{...}` span when the model wrapped the JSON in
/// prose or a code fence. Cards with a blank side are dropped.
pub fn parse_flashcards(content: &str) -> Result<Vec<Flashcard>, ParseError> {
    let envelope: FlashcardsEnvelope = match serde_json::from_str(content.trim()) {
        Ok(envelope) => envelope,
        Err(first) => match outermost_object(content) {
            Some(span) => serde_json::from_str(span)?,
            None => return Err(first.into()),
        },
    };

    Ok(envelope
        .flashcards
        .into_iter()
        .map(|card| Flashcard::new(card.front.trim(), card.back.trim()))
        .filter(|card| !card.front.is_empty() && !card.back.is_empty())
        .collect())
}

fn outermost_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let cards = parse_flashcards(
            r#"{"flashcards":[{"front":"What is ATP?","back":"The cell's energy currency."}]}"#,
        )
        .unwrap();
        assert_eq!(cards, vec![Flashcard::new("What is ATP?", "The cell's energy currency.")]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let content = "Here you go:\n```json\n{\"flashcards\":[{\"front\":\"Q1\",\"back\":\"A1\"},{\"front\":\"Q2\",\"back\":\"A2\"}]}\n```";
        let cards = parse_flashcards(content).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].front, "Q2");
    }

    #[test]
    fn test_blank_cards_dropped() {
        let cards = parse_flashcards(
            r#"{"flashcards":[{"front":"  ","back":"A"},{"front":" Q ","back":" A "},{"front":"Q","back":""}]}"#,
        )
        .unwrap();
        assert_eq!(cards, vec![Flashcard::new("Q", "A")]);
    }

    #[test]
    fn test_missing_key_is_error() {
        assert!(parse_flashcards(r#"{"cards":[]}"#).is_err());
        assert!(parse_flashcards("no json here").is_err());
        assert!(parse_flashcards("").is_err());
    }
}
