//! Elasticsearch index and query integration.

/// HTTP client for index management, bulk writes, and search.
pub mod client;
/// Query builders for retrieval.
pub mod filters;
/// Shared types and wire DTOs.
pub mod types;

pub use client::EsService;
pub use filters::{build_tag_filter, build_text_query};
pub use types::{BulkFailure, BulkReport, EsError, IndexedChunkRecord};
