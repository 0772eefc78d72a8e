//! HTTP Server for the contactload API.
//!
//! # API Endpoints
//!
//! | Method | Path                       | Description                       |
//! |--------|----------------------------|-----------------------------------|
//! | GET    | `/health`                  | Health check                      |
//! | GET    | `/api/logs`                | SSE stream for real-time logs     |
//! | GET    | `/api/v1/contacts`         | List contacts (`q`, `skip`, `limit`) |
//! | POST   | `/api/v1/contacts`         | Create one contact                |
//! | POST   | `/api/v1/contacts/import`  | Import a CSV upload (`file` part) |
//! | GET    | `/api/v1/contacts/export`  | Download contacts as CSV          |
//!
//! Store calls are blocking and run on the blocking thread pool.

use axum::{
    extract::{rejection::QueryRejection, DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{
    owner_from_headers, HealthResponse, OWNER_EMAIL_HEADER, OWNER_ID_HEADER, OWNER_NAME_HEADER,
    OWNER_SUPERUSER_HEADER,
};
use crate::config::ServerConfig;
use crate::contacts::{self, ContactInput, ListParams};
use crate::error::{ServerError, ServerResult, UploadError};
use crate::export::EXPORT_FILE_NAME;
use crate::import::{import_upload, ImportOptions, Upload, UploadPolicy};
use crate::models::{Contact, ImportSummary};
use crate::storage::{ContactPage, ContactStore, JsonFileStore};

/// Room for multipart framing on top of the upload ceiling, so oversized
/// files still reach the gating check and get a readable error.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
    pub options: Arc<ImportOptions>,
}

impl AppState {
    pub fn new(store: Arc<dyn ContactStore>, options: ImportOptions) -> Self {
        Self {
            store,
            options: Arc::new(options),
        }
    }
}

/// Build the router over `state`.
pub fn router(state: AppState) -> Router {
    // Permissive CORS; identity headers must pass preflight
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(OWNER_ID_HEADER),
            HeaderName::from_static(OWNER_EMAIL_HEADER),
            HeaderName::from_static(OWNER_NAME_HEADER),
            HeaderName::from_static(OWNER_SUPERUSER_HEADER),
        ])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let body_limit = state.options.policy.max_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/logs", get(sse_logs))
        .route("/api/v1/contacts", get(list_contacts).post(create_contact))
        .route("/api/v1/contacts/import", post(import_contacts))
        .route("/api/v1/contacts/export", get(export_contacts))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn ContactStore> = Arc::new(JsonFileStore::new(&config.data_dir));
    let options = ImportOptions {
        policy: UploadPolicy::with_max_bytes(config.max_upload_bytes),
        ..ImportOptions::default()
    };
    let app = router(AppState::new(store, options));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    log_info(format!("🚀 contactload server running on http://localhost:{}", config.port));
    log_info(format!("   Data directory: {}", config.data_dir.display()));
    log_info("   POST /api/v1/contacts/import - Import CSV file");
    log_info("   GET  /api/v1/contacts/export - Export CSV file");
    log_info("   GET  /api/logs               - SSE log stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Import CSV endpoint
async fn import_contacts(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ServerResult<(StatusCode, Json<ImportSummary>)> {
    let owner = owner_from_headers(&headers)?;

    let mut upload: Option<Upload> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            upload = Some(Upload::new(file_name, bytes.to_vec()));
        }
    }

    let upload = upload.ok_or(UploadError::NoFile)?;

    let summary = tokio::task::spawn_blocking(move || {
        import_upload(&upload, &state.options, &owner, state.store.as_ref())
    })
    .await??;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// List contacts endpoint
async fn list_contacts(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ServerResult<Json<ContactPage>> {
    let owner = owner_from_headers(&headers)?;
    let Query(params) = params.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let page = tokio::task::spawn_blocking(move || {
        contacts::list_contacts(&params, &owner, state.store.as_ref())
    })
    .await??;

    Ok(Json(page))
}

/// Create contact endpoint
async fn create_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ContactInput>,
) -> ServerResult<(StatusCode, Json<Contact>)> {
    let owner = owner_from_headers(&headers)?;

    let contact = tokio::task::spawn_blocking(move || {
        contacts::create_contact(input, &owner, state.store.as_ref())
    })
    .await??;

    Ok((StatusCode::CREATED, Json(contact)))
}

/// Export CSV endpoint
async fn export_contacts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<impl IntoResponse> {
    let owner = owner_from_headers(&headers)?;

    let csv = tokio::task::spawn_blocking(move || contacts::export_for(&owner, state.store.as_ref()))
        .await??;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        csv,
    ))
}
