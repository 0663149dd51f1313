//! Core data types and error definitions for the processing pipeline.

use crate::elastic::EsError;
use crate::extract::ExtractionError;
use thiserror::Error;
use uuid::Uuid;

/// Errors emitted by the document ingestion pipeline.
///
/// Classification degradation is deliberately absent: malformed or failing classifier
/// output is absorbed per chunk and never surfaces here.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Text could not be obtained from the source document.
    #[error("Failed to extract document text: {0}")]
    Extraction(#[from] ExtractionError),
    /// Target index could not be verified or created before writing.
    #[error("Failed to provision index '{index}': {source}")]
    IndexProvision {
        /// Index that could not be provisioned.
        index: String,
        /// Underlying Elasticsearch failure.
        #[source]
        source: EsError,
    },
    /// The bulk write call itself failed (connectivity, auth, bad status).
    #[error("Bulk write failed: {0}")]
    Write(#[source] EsError),
    /// The store accepted the bulk call but rejected some records.
    #[error("Bulk write rejected {failed} of {total} records; sample reasons: {}", .samples.join("; "))]
    PartialWrite {
        /// Number of records the store rejected.
        failed: usize,
        /// Number of records submitted.
        total: usize,
        /// Up to a few store-reported rejection reasons.
        samples: Vec<String>,
    },
    /// A retrieval query failed.
    #[error("Query failed: {0}")]
    Query(#[source] EsError),
}

/// Summary of a completed document ingestion.
#[derive(Debug, Clone, Copy)]
pub struct IngestOutcome {
    /// Identifier shared by every record persisted for the document.
    pub doc_id: Uuid,
    /// Number of records submitted to the index.
    pub chunks_ingested: usize,
}

/// Reachability and readiness snapshot for the search backend.
#[derive(Debug, Clone)]
pub struct SearchHealthSnapshot {
    /// Indicates whether the Elasticsearch endpoint responded successfully.
    pub reachable: bool,
    /// Whether the configured default index is currently present.
    pub index_present: bool,
    /// Optional diagnostic string captured when the backend is unreachable.
    pub error: Option<String>,
}
