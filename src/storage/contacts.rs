use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use ulid::Ulid;

use super::{atomic_write, is_plausible_email, record_path, StoreError};

/// Stored contact-form message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContactMessage {
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ContactStore {
    dir: PathBuf,
}

impl ContactStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn submit(&self, input: NewContactMessage) -> Result<ContactMessage, StoreError> {
        let email = input.email.trim();
        let subject = input.subject.trim();
        let message = input.message.trim();

        if !is_plausible_email(email) {
            return Err(StoreError::InvalidInput("a valid email is required".to_string()));
        }
        if subject.is_empty() {
            return Err(StoreError::InvalidInput("subject is required".to_string()));
        }
        if message.is_empty() {
            return Err(StoreError::InvalidInput("message is required".to_string()));
        }

        let contact = ContactMessage {
            id: Ulid::new().to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        };
        let path = record_path(&self.dir, &contact.id)?;
        atomic_write(&path, &serde_json::to_string_pretty(&contact)?)?;
        tracing::info!(id = %contact.id, "Stored contact message");

        Ok(contact)
    }
}
