//! HTTP API
//!
//! axum router over the generator and stores. Runs until Ctrl+C or SIGTERM.

pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{Config, ConfigError};
use crate::documents::splitter::SplitterError;
use crate::storage::StoreError;
use crate::uploads::UploadError;

pub use error::ApiError;
pub use state::AppState;

use routes::{
    checkout_handler, contact_handler, create_set_handler, delete_set_handler, generate_handler,
    get_set_handler, health_handler, list_sets_handler, plans_handler, upload_handler,
    waitlist_handler,
};

/// Headroom for multipart framing on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Splitter error: {0}")]
    Splitter(#[from] SplitterError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Upload store error: {0}")]
    Upload(#[from] UploadError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let body_limit = usize::try_from(state.config.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/uploads", post(upload_handler))
        .route("/api/sets", get(list_sets_handler).post(create_set_handler))
        .route("/api/sets/{id}", get(get_set_handler).delete(delete_set_handler))
        .route("/api/contact", post(contact_handler))
        .route("/api/waitlist", post(waitlist_handler))
        .route("/api/plans", get(plans_handler))
        .route("/api/checkout-sessions", post(checkout_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: Config) -> Result<(), StartupError> {
    info!("Initializing state...");
    let address = config.bind_address();
    let state = AppState::new(config)?;

    info!(
        data_dir = %state.config.data_dir.display(),
        model = %state.config.llm.model,
        "Starting server..."
    );
    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::{Flashcard, FlashcardSet};
    use crate::llm::testing::ScriptedClient;
    use crate::llm::CompletionError;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(dir: &TempDir, client: ScriptedClient) -> (Router, Arc<AppState>) {
        let mut config = Config::with_data_dir(dir.path());
        config.chunk_size = 40;
        config.chunk_overlap = 0;
        let state = AppState::with_client(config, Arc::new(client)).unwrap();
        (router(state.clone()), state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn text_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const CARD_REPLY: &str = r#"{"flashcards":[{"front":"What is a cell?","back":"The basic unit of life."}]}"#;

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedClient::default());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_generate_from_prompt() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedClient::always(CARD_REPLY, 1));

        let (status, body) = send(&app, text_request("/api/generate?type=prompt", "Cells")).await;
        assert_eq!(status, StatusCode::OK);
        let cards: Vec<Flashcard> = serde_json::from_value(body).unwrap();
        assert_eq!(cards, vec![Flashcard::new("What is a cell?", "The basic unit of life.")]);
    }

    #[tokio::test]
    async fn test_generate_prompt_failure_is_bad_gateway() {
        let dir = TempDir::new().unwrap();
        let client = ScriptedClient::new(vec![Err(CompletionError::Transport("timeout".into()))]);
        let (app, _) = app(&dir, client);

        let (status, body) = send(&app, text_request("/api/generate?type=prompt", "Cells")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn test_generate_empty_prompt_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedClient::default());

        let (status, _) = send(&app, text_request("/api/generate?type=prompt", "   ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_from_uploaded_document_tolerates_failures() {
        let dir = TempDir::new().unwrap();
        let client = ScriptedClient::new(vec![
            Ok(CARD_REPLY.to_string()),
            Ok("garbage".to_string()),
        ]);
        let (app, state) = app(&dir, client);
        state
            .uploads
            .save(
                "chapter.txt",
                b"Cells are the basic unit of life.\n\nMitochondria produce ATP for cells.",
            )
            .unwrap();

        let (status, body) = send(&app, text_request("/api/generate?type=txt", "chapter.txt")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_unknown_upload_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedClient::default());

        let (status, _) = send(&app, text_request("/api/generate?type=pdf", "missing.pdf")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, text_request("/api/generate?type=pdf", "../secret.pdf")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_multipart() {
        let dir = TempDir::new().unwrap();
        let (app, state) = app(&dir, ScriptedClient::default());

        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nSome notes\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/uploads")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fileName"], "notes.txt");
        let stored = std::fs::read_to_string(state.uploads.resolve("notes.txt").unwrap()).unwrap();
        assert_eq!(stored, "Some notes");
    }

    #[tokio::test]
    async fn test_sets_lifecycle() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedClient::default());

        let (status, created) = send(
            &app,
            json_request(
                "POST",
                "/api/sets",
                json!({ "name": "Biology", "flashcards": [{ "front": "Q", "back": "A" }] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: FlashcardSet = serde_json::from_value(created).unwrap();

        let list = Request::builder().uri("/api/sets").body(Body::empty()).unwrap();
        let (status, listed) = send(&app, list).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["id"], created.id.as_str());
        assert_eq!(listed[0]["flashcards"].as_array().unwrap().len(), 1);

        let uri = format!("/api/sets/{}", created.id);
        let get = Request::builder().uri(&uri).body(Body::empty()).unwrap();
        let (status, fetched) = send(&app, get).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Biology");

        let delete = Request::builder().method("DELETE").uri(&uri).body(Body::empty()).unwrap();
        let (status, _) = send(&app, delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let get = Request::builder().uri(&uri).body(Body::empty()).unwrap();
        let (status, _) = send(&app, get).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_set_requires_name() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedClient::default());

        let (status, body) = send(&app, json_request("POST", "/api/sets", json!({ "name": " " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn test_contact() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedClient::default());

        let ok = json!({ "email": "a@b.co", "subject": "Hi", "message": "Great app" });
        let (status, body) = send(&app, json_request("POST", "/api/contact", ok)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].is_string());

        let bad = json!({ "email": "nope", "subject": "Hi", "message": "Great app" });
        let (status, _) = send(&app, json_request("POST", "/api/contact", bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plans_and_checkout_validation() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedClient::default());

        let request = Request::builder().uri("/api/plans").body(Body::empty()).unwrap();
        let (status, plans) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(plans.as_array().unwrap().len(), 3);

        let (status, body) = send(&app, json_request("POST", "/api/checkout-sessions", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Plan ID is required");
    }

    fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        use std::io::Write;

        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );

        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_generate_document_type_reads_docx_by_extension() {
        let dir = TempDir::new().unwrap();
        let client = ScriptedClient::always(CARD_REPLY, 1);
        let (app, state) = app(&dir, client);
        state
            .uploads
            .save("lecture.docx", &docx_bytes(&["Cells are the unit of life."]))
            .unwrap();

        let (status, body) = send(&app, text_request("/api/generate?type=document", "lecture.docx")).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body[0]["front"], "What is a cell?");
    }

    #[tokio::test]
    async fn test_generate_document_type_sends_pdf_to_pdf_loader() {
        let dir = TempDir::new().unwrap();
        let (app, state) = app(&dir, ScriptedClient::always(CARD_REPLY, 4));
        // Valid UTF-8, so only the PDF loader rejects it
        state.uploads.save("slides.pdf", b"not a pdf at all").unwrap();

        let (status, body) = send(&app, text_request("/api/generate?type=document", "slides.pdf")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("PDF"), "{body}");
    }

    #[tokio::test]
    async fn test_generate_document_without_api_key_fails() {
        let dir = TempDir::new().unwrap();
        let client = ScriptedClient::new(vec![
            Err(CompletionError::MissingApiKey),
            Err(CompletionError::MissingApiKey),
        ]);
        let (app, state) = app(&dir, client);
        state
            .uploads
            .save("chapter.txt", b"Cells are the basic unit of life.\n\nMitochondria produce ATP for cells.")
            .unwrap();

        let (status, body) = send(&app, text_request("/api/generate?type=document", "chapter.txt")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("API key"), "{body}");
    }

    #[tokio::test]
    async fn test_waitlist_signup() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedClient::default());

        let ok = json!({ "name": "Ada", "email": "ada@example.com" });
        let (status, body) = send(&app, json_request("POST", "/api/waitlist", ok)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_str().unwrap();
        assert!(dir.path().join("waitlist").join(format!("{id}.json")).is_file());

        let blank_name = json!({ "name": "", "email": "ada@example.com" });
        let (status, _) = send(&app, json_request("POST", "/api/waitlist", blank_name)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
