//! Runtime configuration
//!
//! Everything is read from the process environment. Missing values fall back
//! to defaults; malformed values stop start-up.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::documents::splitter::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

/// Application directory name under the platform data dir
const APP_DIR_NAME: &str = "memorix";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_STRIPE_BASE_URL: &str = "https://api.stripe.com";

/// Upload and load cap (50 MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {cause}")]
    InvalidValue { key: String, cause: String },
    #[error("Chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
    #[error("No data directory available; set MEMORIX_DATA_DIR")]
    NoDataDir,
}

/// Model provider settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_upload_bytes: u64,
    pub llm: LlmConfig,
    pub stripe_secret_key: Option<String>,
    pub stripe_base_url: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let data_dir = match env::var("MEMORIX_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };
        let upload_dir = match env::var("MEMORIX_UPLOAD_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => data_dir.join("uploads"),
        };

        let chunk_size = try_load("MEMORIX_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = try_load("MEMORIX_CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?;
        if chunk_overlap >= chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }

        let config = Self {
            host: try_load("MEMORIX_HOST", "0.0.0.0".to_string())?,
            port: try_load("MEMORIX_PORT", DEFAULT_PORT)?,
            data_dir,
            upload_dir,
            chunk_size,
            chunk_overlap,
            max_upload_bytes: try_load("MEMORIX_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            llm: LlmConfig {
                api_key: secret("GROQ_API_KEY"),
                model: try_load("MEMORIX_MODEL", DEFAULT_MODEL.to_string())?,
                base_url: try_load("MEMORIX_LLM_BASE_URL", DEFAULT_LLM_BASE_URL.to_string())?,
                timeout: Duration::from_secs(try_load("MEMORIX_LLM_TIMEOUT_SECS", 60u64)?),
            },
            stripe_secret_key: secret("STRIPE_SECRET_KEY"),
            stripe_base_url: try_load("MEMORIX_STRIPE_BASE_URL", DEFAULT_STRIPE_BASE_URL.to_string())?,
        };

        Ok(config)
    }

    /// Defaults rooted at `data_dir`, ignoring the environment
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            upload_dir: data_dir.join("uploads"),
            data_dir,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            llm: LlmConfig {
                api_key: None,
                model: DEFAULT_MODEL.to_string(),
                base_url: DEFAULT_LLM_BASE_URL.to_string(),
                timeout: Duration::from_secs(60),
            },
            stripe_secret_key: None,
            stripe_base_url: DEFAULT_STRIPE_BASE_URL.to_string(),
        }
    }

    /// Directory holding saved flashcard sets
    pub fn sets_dir(&self) -> PathBuf {
        self.data_dir.join("sets")
    }

    /// Directory holding contact-form submissions
    pub fn contacts_dir(&self) -> PathBuf {
        self.data_dir.join("contacts")
    }

    pub fn waitlist_dir(&self) -> PathBuf {
        self.data_dir.join("waitlist")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Platform data directory for the service (`~/.local/share/memorix` on Linux)
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    Ok(base.join(APP_DIR_NAME))
}

fn try_load<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| {
            warn!(key = %key, value = %raw, "Invalid environment value");
            ConfigError::InvalidValue {
                key: key.to_string(),
                cause: e.to_string(),
            }
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn secret(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => {
            warn!("{key} not set; dependent endpoints will fail");
            None
        }
    }
}
