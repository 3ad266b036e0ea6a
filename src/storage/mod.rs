//! Document Storage
//!
//! JSON-file persistence for flashcard sets and contact messages. One file per
//! record, written atomically, keyed by ULID.

pub mod contacts;
pub mod sets;
pub mod waitlist;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use contacts::{ContactMessage, ContactStore, NewContactMessage};
pub use sets::SetStore;
pub use waitlist::{NewWaitlistEntry, WaitlistEntry, WaitlistStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid ID")]
    InvalidId,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Serialize for StoreError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// IDs are ULIDs; anything outside `[A-Za-z0-9]` is rejected so an ID can never
/// name a path outside the store.
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(StoreError::InvalidId)
    }
}

/// Write to a .tmp sibling then rename into place
pub(crate) fn atomic_write(path: &Path, contents: &str) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// One `@` with something on both sides and no whitespace
pub(crate) fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub(crate) fn record_path(dir: &Path, id: &str) -> Result<PathBuf, StoreError> {
    validate_id(id)?;
    Ok(dir.join(format!("{id}.json")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("01HZX3W8M9V6QK2T4R5P7N8B0C").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("../etc/passwd").is_err());
        assert!(validate_id("abc/def").is_err());
        assert!(validate_id("abc.json").is_err());
    }

    #[test]
    fn test_is_plausible_email() {
        assert!(is_plausible_email("ada@example.com"));
        assert!(!is_plausible_email("ada.example.com"));
        assert!(!is_plausible_email("a@b@c"));
        assert!(!is_plausible_email("a @b.co"));
    }

    #[test]
    fn test_atomic_write_replaces() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rec.json");
        atomic_write(&path, "1").unwrap();
        atomic_write(&path, "2").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "2");
        assert!(!dir.path().join("rec.json.tmp").exists());
    }
}
