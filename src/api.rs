//! HTTP surface for clausetag.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /ingest` – Chunk a raw document, classify each chunk against the risk-tag
//!   vocabulary, and persist the tagged records. Returns the generated `doc_id` and the
//!   number of chunks ingested.
//! - `GET /documents/:doc_id/chunks` – Tag-filtered retrieval: return chunk texts whose tag
//!   set carries every requested tag (`?tags=a,b&limit=20`).
//! - `POST /qa` – Gate-validated, retrieval-augmented question answering over one document.
//! - `GET /metrics` – Observe ingestion counters.
//! - `GET /health` – Service liveness plus a search-backend reachability snapshot.
//!
//! Handlers are generic over [`PipelineApi`] so tests can drive the router with a stub.

use crate::processing::{PipelineApi, ProcessingError, current_timestamp_rfc3339};
use crate::qa::QaError;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_CHUNK_LIMIT: usize = 20;

/// Build the HTTP router exposing the ingestion and retrieval API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: PipelineApi + 'static,
{
    Router::new()
        .route("/ingest", post(ingest_document::<S>))
        .route("/documents/:doc_id/chunks", get(get_chunks::<S>))
        .route("/qa", post(ask_question::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/health", get(get_health::<S>))
        .with_state(service)
}

/// Request body for the `POST /ingest` endpoint.
#[derive(Deserialize)]
struct IngestRequest {
    /// Raw document text to chunk, classify, and index.
    text: String,
    /// Original file name persisted with each chunk.
    file_name: String,
    /// Source type label (`pdf` | `txt`).
    file_type: String,
    /// Optional index override (defaults to `ES_INDEX_NAME`).
    #[serde(default)]
    index: Option<String>,
}

/// Success response for the `POST /ingest` endpoint.
#[derive(Serialize)]
struct IngestResponse {
    /// Identifier shared by every record persisted for the document.
    doc_id: Uuid,
    /// Number of chunks submitted to the index.
    chunks_ingested: usize,
}

async fn ingest_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, AppError>
where
    S: PipelineApi,
{
    let IngestRequest {
        text,
        file_name,
        file_type,
        index,
    } = request;
    let outcome = service
        .ingest_document(text, file_name, file_type, index)
        .await?;
    tracing::info!(
        doc_id = %outcome.doc_id,
        chunks = outcome.chunks_ingested,
        "Ingest request completed"
    );
    Ok(Json(IngestResponse {
        doc_id: outcome.doc_id,
        chunks_ingested: outcome.chunks_ingested,
    }))
}

/// Query parameters for the `GET /documents/:doc_id/chunks` endpoint.
#[derive(Deserialize)]
struct ChunksQuery {
    /// Comma-separated risk-tag slugs; every tag must be present on a returned chunk.
    #[serde(default)]
    tags: Option<String>,
    /// Maximum number of chunks to return.
    #[serde(default)]
    limit: Option<usize>,
}

/// Response body for the `GET /documents/:doc_id/chunks` endpoint.
#[derive(Serialize)]
struct ChunksResponse {
    doc_id: Uuid,
    chunks: Vec<String>,
}

async fn get_chunks<S>(
    State(service): State<Arc<S>>,
    Path(doc_id): Path<Uuid>,
    Query(query): Query<ChunksQuery>,
) -> Result<Json<ChunksResponse>, AppError>
where
    S: PipelineApi,
{
    let tags: Vec<String> = query
        .tags
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();
    let limit = query.limit.unwrap_or(DEFAULT_CHUNK_LIMIT);

    let chunks = service.find_by_tags(doc_id, tags, limit).await?;
    Ok(Json(ChunksResponse { doc_id, chunks }))
}

/// Request body for the `POST /qa` endpoint.
#[derive(Deserialize)]
struct QaRequest {
    /// The user's question.
    question: String,
    /// Document the answer must be grounded in.
    doc_id: Uuid,
}

/// Response body for the `POST /qa` endpoint.
#[derive(Serialize)]
struct QaResponse {
    question: String,
    answer: String,
    context_chunks: Vec<String>,
}

async fn ask_question<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<QaRequest>,
) -> Result<Json<QaResponse>, AppError>
where
    S: PipelineApi,
{
    let answer = service
        .answer_question(request.question, request.doc_id)
        .await?;
    Ok(Json(QaResponse {
        question: answer.question,
        answer: answer.answer,
        context_chunks: answer.context_chunks,
    }))
}

async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: PipelineApi,
{
    Json(service.metrics_snapshot())
}

/// Response body for the `GET /health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    search_reachable: bool,
    index_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_error: Option<String>,
}

async fn get_health<S>(State(service): State<Arc<S>>) -> Json<HealthResponse>
where
    S: PipelineApi,
{
    let snapshot = service.search_health().await;
    Json(HealthResponse {
        status: "ok",
        timestamp: current_timestamp_rfc3339(),
        search_reachable: snapshot.reachable,
        index_present: snapshot.index_present,
        search_error: snapshot.error,
    })
}

enum AppError {
    Processing(ProcessingError),
    Qa(QaError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Qa(QaError::Rejected) => {
                (StatusCode::FORBIDDEN, QaError::Rejected.to_string()).into_response()
            }
            Self::Qa(error) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
            }
            Self::Processing(error) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
            }
        }
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self::Processing(inner)
    }
}

impl From<QaError> for AppError {
    fn from(inner: QaError) -> Self {
        Self::Qa(inner)
    }
}
