use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use ulid::Ulid;

use super::{atomic_write, record_path, StoreError};
use crate::flashcards::{FlashcardSet, NewFlashcardSet};

/// Saved flashcard sets, one `<id>.json` per set
#[derive(Debug, Clone)]
pub struct SetStore {
    dir: PathBuf,
}

impl SetStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn create(&self, input: NewFlashcardSet) -> Result<FlashcardSet, StoreError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("set name is required".to_string()));
        }

        let set = FlashcardSet {
            id: Ulid::new().to_string(),
            name: name.to_string(),
            flashcards: input.flashcards,
            created_at: Utc::now(),
        };

        let path = record_path(&self.dir, &set.id)?;
        atomic_write(&path, &serde_json::to_string_pretty(&set)?)?;
        tracing::info!(id = %set.id, cards = set.flashcards.len(), "Saved flashcard set");

        Ok(set)
    }

    pub fn get(&self, id: &str) -> Result<FlashcardSet, StoreError> {
        let path = record_path(&self.dir, id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// All sets, newest first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<FlashcardSet>, StoreError> {
        let mut sets = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str::<FlashcardSet>(&content) {
                    Ok(set) => sets.push(set),
                    Err(e) => {
                        tracing::warn!(path = ?path, error = %e, "Failed to parse flashcard set");
                    }
                },
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Failed to read flashcard set");
                }
            }
        }

        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(sets)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = record_path(&self.dir, id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        fs::remove_file(&path)?;
        tracing::info!(id = %id, "Deleted flashcard set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::Flashcard;
    use tempfile::TempDir;

    fn new_set(name: &str, cards: usize) -> NewFlashcardSet {
        NewFlashcardSet {
            name: name.to_string(),
            flashcards: (0..cards)
                .map(|i| Flashcard::new(format!("Q{i}"), format!("A{i}")))
                .collect(),
        }
    }

    #[test]
    fn test_create_and_get() {
        let dir = TempDir::new().unwrap();
        let store = SetStore::open(dir.path().join("sets")).unwrap();

        let created = store.create(new_set("  Cell Biology ", 3)).unwrap();
        assert_eq!(created.name, "Cell Biology");

        let loaded = store.get(&created.id).unwrap();
        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.flashcards.len(), 3);
        assert_eq!(loaded.flashcards[2], Flashcard::new("Q2", "A2"));
    }

    #[test]
    fn test_blank_name_rejected() {
        let dir = TempDir::new().unwrap();
        let store = SetStore::open(dir.path()).unwrap();
        assert!(matches!(store.create(new_set("   ", 1)), Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn test_list_newest_first_and_skips_garbage() {
        let dir = TempDir::new().unwrap();
        let store = SetStore::open(dir.path()).unwrap();

        let first = store.create(new_set("first", 1)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store.create(new_set("second", 0)).unwrap();
        fs::write(dir.path().join("corrupt.json"), "{ nope").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sets = store.list().unwrap();
        let ids: Vec<_> = sets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let store = SetStore::open(dir.path()).unwrap();
        let set = store.create(new_set("temp", 1)).unwrap();

        store.delete(&set.id).unwrap();
        assert!(matches!(store.get(&set.id), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(&set.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_traversal_ids_rejected() {
        let dir = TempDir::new().unwrap();
        let store = SetStore::open(dir.path()).unwrap();
        assert!(matches!(store.get("../../secrets"), Err(StoreError::InvalidId)));
        assert!(matches!(store.delete("a/b"), Err(StoreError::InvalidId)));
    }
}
