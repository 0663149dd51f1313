//! Retrieval-augmented question answering over indexed documents.

use crate::{
    classify::{LlmClient, LlmError},
    elastic::{EsError, EsService, build_text_query},
    guardrail::GuardrailService,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Number of chunks retrieved as answer context.
const CONTEXT_CHUNK_LIMIT: usize = 4;

/// Errors emitted while answering a question.
#[derive(Debug, Error)]
pub enum QaError {
    /// Question was denied by the content gate.
    #[error("question rejected by the content gate")]
    Rejected,
    /// Retrieval of context chunks failed.
    #[error("Context retrieval failed: {0}")]
    Search(#[from] EsError),
    /// Answer generation failed.
    #[error("Answer generation failed: {0}")]
    Llm(#[from] LlmError),
}

/// Answer assembled for one question.
#[derive(Debug, Clone)]
pub struct QaAnswer {
    /// The validated question as asked.
    pub question: String,
    /// Model answer grounded in the retrieved context.
    pub answer: String,
    /// Chunk texts supplied to the model as context.
    pub context_chunks: Vec<String>,
}

/// Answers questions about one document using retrieved chunk context.
pub struct QaService {
    guardrail: GuardrailService,
    search: EsService,
    llm: Arc<dyn LlmClient>,
    index_name: String,
}

impl QaService {
    /// Build the QA service over injected collaborators.
    pub fn new(
        guardrail: GuardrailService,
        search: EsService,
        llm: Arc<dyn LlmClient>,
        index_name: String,
    ) -> Self {
        Self {
            guardrail,
            search,
            llm,
            index_name,
        }
    }

    /// Validate the question, retrieve context from the document, and generate an answer.
    pub async fn answer(&self, question: &str, doc_id: Uuid) -> Result<QaAnswer, QaError> {
        let question = question.trim();
        if !self.guardrail.validate_question(question).await {
            tracing::warn!(%doc_id, "Question denied by gate");
            return Err(QaError::Rejected);
        }

        let body = json!({
            "query": build_text_query(question, Some(doc_id)),
            "size": CONTEXT_CHUNK_LIMIT,
        });
        let records = self.search.search(&self.index_name, body).await?;
        let context_chunks: Vec<String> = records.into_iter().map(|record| record.text).collect();

        let context = if context_chunks.is_empty() {
            "No relevant document content found.".to_string()
        } else {
            context_chunks.join("\n\n")
        };

        let system_prompt = format!(
            "You are a helpful AI assistant. Use the following context to answer questions \
             accurately and helpfully:\n\nContext: {context}\n\nPlease provide clear, accurate, \
             and helpful responses based on this context."
        );

        let answer = self.llm.invoke(&system_prompt, question).await?;
        tracing::info!(%doc_id, answer_len = answer.len(), "Question answered");

        Ok(QaAnswer {
            question: question.to_string(),
            answer,
            context_chunks,
        })
    }
}
