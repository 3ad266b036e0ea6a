//! Chat Completion Client
//!
//! Minimal reqwest client for OpenAI-compatible `/chat/completions`
//! endpoints (Groq by default). Requests JSON-object output.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::LlmConfig;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Model API key not configured")]
    MissingApiKey,
    #[error("Model request failed: {0}")]
    Transport(String),
    #[error("Model API returned {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("Model returned no content")]
    EmptyResponse,
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

impl Serialize for CompletionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        CompletionError::Transport(e.to_string())
    }
}

/// Anything that can answer a system + user prompt with JSON text
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return the raw message content of the first choice
    async fn complete_json(&self, system: &str, user: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible chat-completions API
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Self {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for ChatClient {
    async fn complete_json(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::MissingApiKey)?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "response_format": { "type": "json_object" },
        });

        debug!(model = %self.model, prompt_chars = user.len(), "Requesting completion");
        let resp = self.http.post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            error!(status = %status, body = %text, "Model HTTP error");
            return Err(CompletionError::Http { status, body: text });
        }

        extract_content(&text)
    }
}

/// Pull the first choice's message content out of a completion body
fn extract_content(body: &str) -> Result<String, CompletionError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::Deserialize(format!("{}: {}", e, body)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(CompletionError::EmptyResponse)
}
