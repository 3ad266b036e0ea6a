use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::billing::CheckoutError;
use crate::documents::loader::LoaderError;
use crate::flashcards::GenerationError;
use crate::llm::CompletionError;
use crate::storage::StoreError;
use crate::uploads::UploadError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<LoaderError> for ApiError {
    fn from(e: LoaderError) -> Self {
        match e {
            LoaderError::NotFound(_) => ApiError::NotFound(e.to_string()),
            LoaderError::FileTooLarge(..) => ApiError::PayloadTooLarge(e.to_string()),
            LoaderError::UnsupportedType(_) | LoaderError::Parse { .. } => ApiError::BadRequest(e.to_string()),
            LoaderError::Io(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<CompletionError> for ApiError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::MissingApiKey => ApiError::Internal(e.to_string()),
            _ => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::EmptyInput => ApiError::BadRequest(e.to_string()),
            GenerationError::Loader(inner) => inner.into(),
            GenerationError::Completion(inner) => inner.into(),
            GenerationError::Parse(_) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => ApiError::NotFound(e.to_string()),
            StoreError::InvalidId | StoreError::InvalidInput(_) => ApiError::BadRequest(e.to_string()),
            StoreError::Io(_) | StoreError::Json(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::InvalidName(_) => ApiError::BadRequest(e.to_string()),
            UploadError::NotFound(_) => ApiError::NotFound(e.to_string()),
            UploadError::TooLarge(..) => ApiError::PayloadTooLarge(e.to_string()),
            UploadError::Io(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::MissingPlan => ApiError::BadRequest(e.to_string()),
            CheckoutError::MissingApiKey => ApiError::Internal(e.to_string()),
            _ => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
