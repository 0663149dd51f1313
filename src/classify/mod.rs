//! Chunk classification against the closed risk-tag vocabulary.
//!
//! The classifier builds a fixed system instruction embedding the full vocabulary, wraps
//! each chunk in a per-call instruction, and treats the model reply as untrusted input:
//! the reply is either validated into a [`ChunkClassification`] or replaced by the neutral
//! fallback. Classification failures never propagate; a bad chunk must not block the rest
//! of a document.

/// LLM client abstraction and the Ollama adapter.
pub mod llm;

pub use llm::{LlmClient, LlmError, OllamaClient};

use crate::vocab::TagVocabulary;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

const DEFAULT_SECTION: &str = "Misc";

/// Structured classification produced for a single chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkClassification {
    /// Risk tags, always a subset of the vocabulary.
    pub risk_tags: Vec<String>,
    /// Short plain-text justification from the model.
    pub explanation: String,
    /// One or two word clause-category estimate.
    pub section_guess: String,
}

impl ChunkClassification {
    /// Neutral result substituted whenever the model output cannot be trusted.
    pub fn neutral() -> Self {
        Self {
            risk_tags: Vec::new(),
            explanation: String::new(),
            section_guess: DEFAULT_SECTION.to_string(),
        }
    }
}

/// Result of classifying one chunk, flagging degraded outcomes for metrics.
#[derive(Debug, Clone)]
pub struct ClassificationOutcome {
    /// Validated classification (neutral when degraded).
    pub classification: ChunkClassification,
    /// Whether the neutral fallback was substituted.
    pub degraded: bool,
}

impl ClassificationOutcome {
    fn degraded() -> Self {
        Self {
            classification: ChunkClassification::neutral(),
            degraded: true,
        }
    }
}

/// Classifies clause chunks through an injected LLM client.
pub struct ChunkClassifier {
    llm: Arc<dyn LlmClient>,
    vocabulary: TagVocabulary,
    system_prompt: String,
}

impl ChunkClassifier {
    /// Build a classifier over the compile-time vocabulary.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        let vocabulary = TagVocabulary::new();
        let system_prompt = build_system_prompt(&vocabulary);
        Self {
            llm,
            vocabulary,
            system_prompt,
        }
    }

    /// Classify a single chunk of clause text.
    ///
    /// Never fails: transport errors, timeouts, and malformed replies all degrade to the
    /// neutral classification, logged at warn level.
    pub async fn classify(&self, chunk_text: &str) -> ClassificationOutcome {
        let user_prompt = build_clause_prompt(chunk_text);
        match self.llm.invoke(&self.system_prompt, &user_prompt).await {
            Ok(raw) => match parse_classification(&raw, &self.vocabulary) {
                Some(classification) => ClassificationOutcome {
                    classification,
                    degraded: false,
                },
                None => {
                    tracing::warn!(
                        reply_len = raw.len(),
                        "Classifier reply was not a JSON object; substituting neutral tags"
                    );
                    ClassificationOutcome::degraded()
                }
            },
            Err(error) => {
                tracing::warn!(error = %error, "Classification call failed; substituting neutral tags");
                ClassificationOutcome::degraded()
            }
        }
    }
}

/// Assemble the fixed tagging instruction embedding the full vocabulary.
fn build_system_prompt(vocabulary: &TagVocabulary) -> String {
    let mut allowed = String::new();
    for tag in vocabulary.definitions() {
        let _ = writeln!(allowed, "- \"{}\": {}", tag.slug, tag.description);
    }

    format!(
        "You are a contracts clause tagger.\n\
         \n\
         Return STRICT JSON with keys:\n\
         - \"risk_tags\": array of tag slugs chosen ONLY from this allowed list:\n\
         {allowed}\
         - \"explanation\": <=30 words of plain text describing why these tags were chosen\n\
         - \"section_guess\": one or two words naming the clause type (e.g., \"Liability\", \"Termination\", \"Payment\", \"Data\", \"IP\", \"Jurisdiction\", \"Usage\", \"Misc\")\n\
         \n\
         Rules:\n\
         - Output JSON ONLY (no extra text or markdown).\n\
         - If unsure, return \"risk_tags\": [] and a short neutral explanation.\n"
    )
}

/// Wrap one chunk of clause text in the per-call instruction.
fn build_clause_prompt(clause_text: &str) -> String {
    format!(
        "Clause:\n-----\n{clause_text}\n-----\n\n\
         Return JSON ONLY with keys: risk_tags, explanation, section_guess."
    )
}

/// Validate an untrusted model reply into a classification.
///
/// Returns `None` when the reply is not parseable as a JSON object; the caller substitutes
/// the neutral fallback. Within a parsed object, every field is defaulted or sanitized:
/// missing or non-array `risk_tags` become empty, unknown slugs are dropped silently, and
/// non-string `explanation`/`section_guess` are replaced by their defaults.
fn parse_classification(raw: &str, vocabulary: &TagVocabulary) -> Option<ChunkClassification> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;

    let risk_tags = match object.get("risk_tags") {
        Some(Value::Array(items)) => {
            let mut seen = HashSet::new();
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|slug| vocabulary.contains(slug))
                .filter(|slug| seen.insert(slug.to_string()))
                .map(str::to_string)
                .collect()
        }
        _ => Vec::new(),
    };

    let explanation = object
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let section_guess = object
        .get("section_guess")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_SECTION)
        .to_string();

    Some(ChunkClassification {
        risk_tags,
        explanation,
        section_guess,
    })
}
