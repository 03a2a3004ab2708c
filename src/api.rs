//! HTTP surface for Docstream.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /upload` – Accept a multipart document upload, stage it, and run the full
//!   ingestion pipeline (extract, chunk, embed, upsert). Returns the upload identifier
//!   and chunk counters.
//! - `GET /metrics` – Observe ingestion counters.
//! - `GET /health` – Liveness plus vector-store reachability probe.
//!
//! Client-caused failures (unsupported file type, malformed multipart) map to `400`
//! with a descriptive message; everything after staging maps to `500` with a generic
//! message while the cause goes to the logs.

use crate::ingest::{HealthSnapshot, IngestApi, IngestError};
use crate::metrics::MetricsSnapshot;
use axum::{
    Json, Router,
    extract::{
        State,
        multipart::{Multipart, MultipartError},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

/// Build the HTTP router exposing the ingestion API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: IngestApi + 'static,
{
    Router::new()
        .route("/upload", post(upload_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/health", get(get_health::<S>))
        .with_state(service)
}

/// Success response for the `POST /upload` endpoint.
#[derive(Serialize)]
struct UploadResponse {
    /// Identifier generated for the staged upload.
    file_id: String,
    /// Original filename supplied by the client.
    filename: String,
    /// Resolved document type.
    file_type: String,
    /// Number of chunks created for the document.
    chunks_created: usize,
    /// Terminal status, always `success` on this path.
    status: &'static str,
    /// Human-readable summary.
    message: String,
}

/// Upload and ingest a document (PDF, MD, TXT, JSON).
///
/// The first multipart field carrying a filename is treated as the document; the
/// filename is reduced to its final path component before it reaches the pipeline.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: IngestApi,
{
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(sanitize_file_name) else {
            continue;
        };
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or(AppError::MissingFile)?;
    let outcome = service.ingest(bytes, &file_name).await?;

    tracing::info!(
        file_id = %outcome.file_id,
        filename = %outcome.file_name,
        chunks = outcome.chunk_count,
        "Upload request completed"
    );

    let message = format!(
        "Document processed successfully with {} chunks",
        outcome.chunk_count
    );
    Ok(Json(UploadResponse {
        file_id: outcome.file_id,
        filename: outcome.file_name,
        file_type: outcome.file_kind.as_str().to_string(),
        chunks_created: outcome.chunk_count,
        status: "success",
        message,
    }))
}

/// Return a concise metrics snapshot with ingestion counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: IngestApi,
{
    Json(service.metrics_snapshot())
}

/// Return liveness plus a vector-store reachability probe.
async fn get_health<S>(State(service): State<Arc<S>>) -> Json<HealthSnapshot>
where
    S: IngestApi,
{
    Json(service.health().await)
}

/// Reduce a client-supplied filename to its final path component.
fn sanitize_file_name(raw: &str) -> String {
    std::path::Path::new(raw)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

enum AppError {
    Ingest(IngestError),
    Multipart(MultipartError),
    MissingFile,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Ingest(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            Self::Ingest(err) => {
                tracing::error!(error = %err, "Upload failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Document ingestion failed".to_string(),
                )
                    .into_response()
            }
            Self::Multipart(err) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid multipart upload: {err}"),
            )
                .into_response(),
            Self::MissingFile => (
                StatusCode::BAD_REQUEST,
                "Multipart field with a filename is required".to_string(),
            )
                .into_response(),
        }
    }
}

impl From<IngestError> for AppError {
    fn from(inner: IngestError) -> Self {
        Self::Ingest(inner)
    }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self::Multipart(inner)
    }
}
