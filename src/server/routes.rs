use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header::ORIGIN, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::{error::ApiError, state::AppState};
use crate::billing::{plans, Plan};
use crate::documents::loader::DocumentKind;
use crate::flashcards::{Flashcard, FlashcardSet, NewFlashcardSet};
use crate::storage::{NewContactMessage, NewWaitlistEntry};

/// `type=prompt` means the body is the text itself; anything else means the
/// body names an upload. `pdf`/`docx` force the loader, other values
/// (`document` included) use the upload's extension.
const PROMPT_TYPE: &str = "prompt";

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    plan: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    session_id: String,
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GenerateParams>,
    body: String,
) -> Result<Json<Vec<Flashcard>>, ApiError> {
    let kind = params.kind.unwrap_or_default();
    debug!(kind = %kind, body_len = body.len(), "Generate request");

    if kind == PROMPT_TYPE {
        let cards = state.generator.generate_from_text(&body).await?;
        return Ok(Json(cards));
    }

    let path = state.uploads.resolve(&body)?;
    let kind = DocumentKind::detect(&kind, &path);

    let report = state.generator.generate_from_document(&path, kind).await?;
    Ok(Json(report.flashcards))
}

pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("file field has no file name".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let uploads = state.uploads.clone();
        let stored = tokio::task::spawn_blocking(move || uploads.save(&file_name, &bytes)).await??;
        return Ok(Json(UploadResponse { file_name: stored }));
    }

    Err(ApiError::BadRequest("multipart field \"file\" is required".to_string()))
}

pub async fn list_sets_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<FlashcardSet>>, ApiError> {
    let sets = state.sets.clone();
    let all = tokio::task::spawn_blocking(move || sets.list()).await??;
    Ok(Json(all))
}

pub async fn create_set_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewFlashcardSet>,
) -> Result<impl IntoResponse, ApiError> {
    let sets = state.sets.clone();
    let set = tokio::task::spawn_blocking(move || sets.create(input)).await??;
    Ok((StatusCode::CREATED, Json(set)))
}

pub async fn get_set_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FlashcardSet>, ApiError> {
    let sets = state.sets.clone();
    let set = tokio::task::spawn_blocking(move || sets.get(&id)).await??;
    Ok(Json(set))
}

pub async fn delete_set_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let sets = state.sets.clone();
    tokio::task::spawn_blocking(move || sets.delete(&id)).await??;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewContactMessage>,
) -> Result<impl IntoResponse, ApiError> {
    let contacts = state.contacts.clone();
    let saved = tokio::task::spawn_blocking(move || contacts.submit(input)).await??;
    Ok((StatusCode::CREATED, Json(json!({ "id": saved.id }))))
}

pub async fn waitlist_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewWaitlistEntry>,
) -> Result<impl IntoResponse, ApiError> {
    let waitlist = state.waitlist.clone();
    let entry = tokio::task::spawn_blocking(move || waitlist.join(input)).await??;
    Ok((StatusCode::CREATED, Json(json!({ "id": entry.id }))))
}

pub async fn plans_handler() -> Json<Vec<Plan>> {
    Json(plans())
}

pub async fn checkout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());
    let plan = request.plan.unwrap_or_default();

    let session_id = state.checkout.create_session(&plan, origin).await?;
    info!(session = %session_id, "Checkout session ready");
    Ok(Json(CheckoutResponse { session_id }))
}
