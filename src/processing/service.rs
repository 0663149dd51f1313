//! Processing service coordinating chunking, classification, and index writes.

use crate::{
    classify::{ChunkClassifier, ClassificationOutcome},
    elastic::{EsService, IndexedChunkRecord, build_tag_filter},
    extract::{SourceType, extract_text},
    metrics::{IngestMetrics, MetricsSnapshot},
    processing::{
        chunking::chunk_text,
        types::{IngestOutcome, ProcessingError, SearchHealthSnapshot},
    },
    qa::{QaAnswer, QaError, QaService},
};
use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

/// How many store-reported rejection reasons to carry in a partial-write error.
const FAILURE_SAMPLE_LIMIT: usize = 3;

/// Tunables applied to every ingestion run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Default index receiving tagged chunk records.
    pub index_name: String,
    /// Upper bound on chunk length in characters.
    pub chunk_max_chars: usize,
    /// Characters carried over between adjacent chunks.
    pub chunk_overlap: usize,
    /// Maximum in-flight classification calls per document.
    pub classify_concurrency: usize,
}

/// Coordinates the full pipeline: chunking, per-chunk classification, and bulk indexing.
///
/// The service owns long-lived handles to the classifier, the search transport, the QA
/// service, and the metrics registry so that the HTTP surface and the CLI reuse the same
/// components. Construct it once near process start and share it through an `Arc`.
pub struct PipelineService {
    classifier: ChunkClassifier,
    search: EsService,
    qa: QaService,
    metrics: Arc<IngestMetrics>,
    settings: PipelineSettings,
}

/// Abstraction over the pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Chunk, classify, and index raw document text.
    async fn ingest_document(
        &self,
        text: String,
        file_name: String,
        file_type: String,
        index: Option<String>,
    ) -> Result<IngestOutcome, ProcessingError>;

    /// Return the texts of chunks carrying every required tag.
    async fn find_by_tags(
        &self,
        doc_id: Uuid,
        required_tags: Vec<String>,
        limit: usize,
    ) -> Result<Vec<String>, ProcessingError>;

    /// Answer a question grounded in one document's chunks.
    async fn answer_question(&self, question: String, doc_id: Uuid) -> Result<QaAnswer, QaError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;

    /// Probe the search backend for a health snapshot.
    async fn search_health(&self) -> SearchHealthSnapshot;
}

impl PipelineService {
    /// Build a new pipeline service over injected collaborators.
    pub fn new(
        classifier: ChunkClassifier,
        search: EsService,
        qa: QaService,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            classifier,
            search,
            qa,
            metrics: Arc::new(IngestMetrics::new()),
            settings,
        }
    }

    /// Extract text from raw source bytes, then chunk, classify, and index it.
    ///
    /// Extraction failures are hard errors: there is no meaningful partial extraction at
    /// the pipeline level.
    pub async fn ingest_source(
        &self,
        bytes: &[u8],
        source_type: SourceType,
        file_name: String,
        index: Option<String>,
    ) -> Result<IngestOutcome, ProcessingError> {
        let text = extract_text(bytes, source_type)?;
        self.ingest_document(text, file_name, source_type.as_str().to_string(), index)
            .await
    }

    /// Chunk, classify, and index a document under a fresh identity.
    pub async fn ingest_document(
        &self,
        text: String,
        file_name: String,
        file_type: String,
        index: Option<String>,
    ) -> Result<IngestOutcome, ProcessingError> {
        let doc_id = Uuid::new_v4();
        let index = index.unwrap_or_else(|| self.settings.index_name.clone());
        let chunks = chunk_text(
            &text,
            self.settings.chunk_max_chars,
            self.settings.chunk_overlap,
        );
        tracing::info!(
            %doc_id,
            %file_name,
            %index,
            chunks = chunks.len(),
            "Processing document"
        );

        let chunk_texts: Vec<String> = chunks.into_iter().map(|chunk| chunk.text).collect();
        let chunks_ingested = self
            .ingest_chunks(&chunk_texts, doc_id, &file_name, &file_type, &index)
            .await?;

        Ok(IngestOutcome {
            doc_id,
            chunks_ingested,
        })
    }

    /// Classify and persist pre-chunked text segments under an existing document identity.
    ///
    /// Classification runs as a bounded fan-out: up to `classify_concurrency` calls are in
    /// flight at once, and results are collected back in input order so persisted
    /// `chunk_id` values always match the original sequence. A failing classification
    /// degrades that one chunk to neutral tags; it never blocks the rest of the document.
    pub async fn ingest_chunks(
        &self,
        chunk_texts: &[String],
        doc_id: Uuid,
        file_name: &str,
        file_type: &str,
        index: &str,
    ) -> Result<usize, ProcessingError> {
        self.search
            .ensure_index(index)
            .await
            .map_err(|source| ProcessingError::IndexProvision {
                index: index.to_string(),
                source,
            })?;

        if chunk_texts.is_empty() {
            tracing::debug!(%doc_id, "No chunks to ingest");
            return Ok(0);
        }

        let classifications: Vec<_> = chunk_texts
            .iter()
            .map(|text| self.classifier.classify(text))
            .collect();
        let outcomes: Vec<ClassificationOutcome> = stream::iter(classifications)
            .buffered(self.settings.classify_concurrency.max(1))
            .collect()
            .await;

        let fallbacks = outcomes.iter().filter(|outcome| outcome.degraded).count();
        let now = current_timestamp_rfc3339();
        let records: Vec<IndexedChunkRecord> = chunk_texts
            .iter()
            .zip(outcomes)
            .enumerate()
            .map(|(position, (text, outcome))| IndexedChunkRecord {
                doc_id,
                chunk_id: position + 1,
                text: text.clone(),
                section: outcome.classification.section_guess,
                risk_tags: outcome.classification.risk_tags,
                explanation: outcome.classification.explanation,
                timestamp: now.clone(),
                file_name: file_name.to_string(),
                file_type: file_type.to_string(),
            })
            .collect();

        let report = self
            .search
            .bulk_write(index, &records)
            .await
            .map_err(ProcessingError::Write)?;

        if !report.failures.is_empty() {
            let failed = report.failures.len();
            let samples = report
                .failures
                .iter()
                .take(FAILURE_SAMPLE_LIMIT)
                .map(|failure| failure.reason.clone())
                .collect();
            tracing::error!(
                index,
                %doc_id,
                failed,
                total = records.len(),
                "Bulk write rejected records"
            );
            return Err(ProcessingError::PartialWrite {
                failed,
                total: records.len(),
                samples,
            });
        }

        self.search
            .refresh(index)
            .await
            .map_err(ProcessingError::Write)?;

        self.metrics
            .record_document(records.len() as u64, fallbacks as u64);
        tracing::info!(
            index,
            %doc_id,
            chunks = records.len(),
            fallbacks,
            "Document indexed"
        );

        Ok(records.len())
    }

    /// Return the texts of the document's chunks whose tag set covers `required_tags`.
    pub async fn find_by_tags(
        &self,
        doc_id: Uuid,
        required_tags: Vec<String>,
        limit: usize,
    ) -> Result<Vec<String>, ProcessingError> {
        let body = json!({
            "query": build_tag_filter(doc_id, &required_tags),
            "size": limit,
            "sort": [ { "chunk_id": "asc" } ],
        });

        let records = self
            .search
            .search(&self.settings.index_name, body)
            .await
            .map_err(ProcessingError::Query)?;

        Ok(records.into_iter().map(|record| record.text).collect())
    }

    /// Answer a question grounded in one document's chunks.
    pub async fn answer_question(
        &self,
        question: &str,
        doc_id: Uuid,
    ) -> Result<QaAnswer, QaError> {
        self.qa.answer(question, doc_id).await
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Probe the search backend to surface a lightweight health snapshot.
    pub async fn search_health(&self) -> SearchHealthSnapshot {
        match self.search.index_exists(&self.settings.index_name).await {
            Ok(present) => SearchHealthSnapshot {
                reachable: true,
                index_present: present,
                error: None,
            },
            Err(error) => {
                tracing::warn!(error = %error, "Search health probe failed");
                SearchHealthSnapshot {
                    reachable: false,
                    index_present: false,
                    error: Some(error.to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl PipelineApi for PipelineService {
    async fn ingest_document(
        &self,
        text: String,
        file_name: String,
        file_type: String,
        index: Option<String>,
    ) -> Result<IngestOutcome, ProcessingError> {
        PipelineService::ingest_document(self, text, file_name, file_type, index).await
    }

    async fn find_by_tags(
        &self,
        doc_id: Uuid,
        required_tags: Vec<String>,
        limit: usize,
    ) -> Result<Vec<String>, ProcessingError> {
        PipelineService::find_by_tags(self, doc_id, required_tags, limit).await
    }

    async fn answer_question(&self, question: String, doc_id: Uuid) -> Result<QaAnswer, QaError> {
        PipelineService::answer_question(self, &question, doc_id).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        PipelineService::metrics_snapshot(self)
    }

    async fn search_health(&self) -> SearchHealthSnapshot {
        PipelineService::search_health(self).await
    }
}

/// Current timestamp formatted for record storage and health reporting.
pub fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
