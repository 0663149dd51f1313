//! Shared types used by the Elasticsearch client and helpers.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned while interacting with Elasticsearch.
#[derive(Debug, Error)]
pub enum EsError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Elasticsearch URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Record payload could not be encoded for transport.
    #[error("Failed to encode bulk payload: {0}")]
    Encode(#[from] serde_json::Error),
    /// Elasticsearch responded with an unexpected status code.
    #[error("Unexpected Elasticsearch response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Elasticsearch.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Unit of persistence: one tagged chunk of one source document.
///
/// Records are created once during ingestion and never mutated; all records sharing a
/// `doc_id` form the persisted representation of one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunkRecord {
    /// Identifier shared by all chunks of one source document.
    pub doc_id: Uuid,
    /// 1-based chunk position within the document.
    pub chunk_id: usize,
    /// Raw chunk text (full-text searchable).
    pub text: String,
    /// Clause-category estimate from the classifier.
    pub section: String,
    /// Risk tags, a subset of the controlled vocabulary.
    pub risk_tags: Vec<String>,
    /// Classifier justification for the chosen tags.
    pub explanation: String,
    /// RFC3339 UTC instant the record was assembled.
    pub timestamp: String,
    /// Original file name of the source document.
    pub file_name: String,
    /// Source type label (`pdf` or `txt`).
    pub file_type: String,
}

/// One rejected record from a bulk submission.
#[derive(Debug, Clone)]
pub struct BulkFailure {
    /// Zero-based position of the record within the submitted batch.
    pub position: usize,
    /// Store-reported rejection reason, when present.
    pub reason: String,
}

/// Outcome of a bulk submission as reported by the store.
#[derive(Debug, Clone, Default)]
pub struct BulkReport {
    /// Number of records the store accepted.
    pub success_count: usize,
    /// Records rejected by the store.
    pub failures: Vec<BulkFailure>,
}

#[derive(Deserialize)]
pub(crate) struct BulkResponse {
    pub(crate) errors: bool,
    #[serde(default)]
    pub(crate) items: Vec<BulkItem>,
}

#[derive(Deserialize)]
pub(crate) struct BulkItem {
    #[serde(alias = "create")]
    pub(crate) index: BulkItemStatus,
}

#[derive(Deserialize)]
pub(crate) struct BulkItemStatus {
    #[serde(default)]
    pub(crate) status: u16,
    #[serde(default)]
    pub(crate) error: Option<Value>,
}

#[derive(Deserialize)]
pub(crate) struct SearchResponse {
    pub(crate) hits: SearchHits,
}

#[derive(Deserialize)]
pub(crate) struct SearchHits {
    #[serde(default)]
    pub(crate) hits: Vec<SearchHitEnvelope>,
}

#[derive(Deserialize)]
pub(crate) struct SearchHitEnvelope {
    #[serde(rename = "_source")]
    pub(crate) source: IndexedChunkRecord,
}
