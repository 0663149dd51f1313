//! Document processing pipeline utilities.

/// Paragraph-aware chunking.
pub mod chunking;
/// Pipeline orchestration service.
pub mod service;
/// Shared pipeline types and errors.
pub mod types;

pub use chunking::{Chunk, chunk_text};
pub use service::{PipelineApi, PipelineService, PipelineSettings, current_timestamp_rfc3339};
pub use types::{IngestOutcome, ProcessingError, SearchHealthSnapshot};
