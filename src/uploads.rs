//! Uploaded document storage.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use ulid::Ulid;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid file name: {0:?}")]
    InvalidName(String),
    #[error("Upload not found: {0}")]
    NotFound(String),
    #[error("File too large: {0} bytes (max {1} bytes)")]
    TooLarge(u64, u64),
}

impl Serialize for UploadError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Flat directory of uploaded files, addressed by file name
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    pub fn open(dir: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, UploadError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, max_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Store `bytes` under the sanitized client file name, replacing any
    /// existing upload of the same name. Returns the stored name.
    pub fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let name = sanitize_file_name(file_name)?;
        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(UploadError::TooLarge(size, self.max_bytes));
        }

        let path = self.dir.join(&name);
        if path.exists() {
            tracing::debug!(name = %name, "Overwriting existing upload");
        }
        let tmp = self.dir.join(format!(".{name}.{}.part", Ulid::new()));
        if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::info!(name = %name, bytes = size, "Stored upload");
        Ok(name)
    }

    /// Path of a previously stored upload
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf, UploadError> {
        let name = file_name.trim();
        if sanitize_file_name(name)? != name {
            return Err(UploadError::InvalidName(file_name.to_string()));
        }
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(UploadError::NotFound(name.to_string()));
        }
        Ok(path)
    }
}

/// Keep only the final path component of a client-supplied name. Empty,
/// dot-only and hidden names are rejected.
pub fn sanitize_file_name(file_name: &str) -> Result<String, UploadError> {
    let base = file_name
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    let invalid = base.is_empty()
        || base.starts_with('.')
        || base.chars().any(|c| c.is_control() || c == ':');
    if invalid {
        return Err(UploadError::InvalidName(file_name.to_string()));
    }
    Ok(base.to_string())
}
