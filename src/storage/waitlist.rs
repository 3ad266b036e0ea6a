use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use ulid::Ulid;

use super::{atomic_write, is_plausible_email, record_path, StoreError};

/// Landing-page signup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWaitlistEntry {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct WaitlistStore {
    dir: PathBuf,
}

impl WaitlistStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn join(&self, input: NewWaitlistEntry) -> Result<WaitlistEntry, StoreError> {
        let name = input.name.trim();
        let email = input.email.trim();

        if name.is_empty() {
            return Err(StoreError::InvalidInput("name is required".to_string()));
        }
        if !is_plausible_email(email) {
            return Err(StoreError::InvalidInput("a valid email is required".to_string()));
        }

        let entry = WaitlistEntry {
            id: Ulid::new().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            timestamp: Utc::now(),
        };
        let path = record_path(&self.dir, &entry.id)?;
        atomic_write(&path, &serde_json::to_string_pretty(&entry)?)?;
        tracing::info!(id = %entry.id, "Added waitlist signup");

        Ok(entry)
    }
}
