//! Allow/deny gate screening user questions before retrieval.
//!
//! Two layers: a fast regex screen that rejects oversized or script-laden input without a
//! model call, then an LLM verdict constrained to `<response>True</response>` or
//! `<response>False</response>`. Any failure along the way denies the question.

use crate::classify::{LlmClient, LlmError};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use thiserror::Error;

/// Maximum accepted question length in characters.
const MAX_QUESTION_CHARS: usize = 10_000;

const GATE_SYSTEM_PROMPT: &str = "You are an expert lawyer and a filter that ensures that user \
queries are on-topic and safe to answer.";

const PROHIBITED_TOPICS: &str = "[politics, finance, unethical, illegal, religion, entertainment, \
sports, personal advice, gossip, hate speech, discrimination, violence, mature content, \
competitor analysis, comparative product reviews, market positioning, hacking, data scraping, \
weapons, speculative questions, financial trading, homework assistance]";

fn gate_user_prompt(question: &str) -> String {
    format!(
        "Your task is to identify whether the user query is based on law and legal topics only \
         and can be answered with the help of a legal document uploaded by the user.\n\
         You will be provided with a query enclosed in <query> XML tags and a predefined list of \
         prohibited topics enclosed in <topics> XML tags. Think before you answer. Respond with \
         <response>True</response> if the query is strictly related to legal topics and does not \
         touch upon any of the prohibited topics. If the query is off-topic, or relates to any of \
         the prohibited topics, respond with <response>False</response>.\n\
         Only respond with <response>True</response> or <response>False</response>.\n\
         Query and topics provided:\n\
         <query>{question}</query>\n\
         <topics>{PROHIBITED_TOPICS}</topics>"
    )
}

/// Errors raised while evaluating the question gate.
#[derive(Debug, Error)]
pub enum GuardrailError {
    /// Gate reply carried no `<response>` verdict.
    #[error("no <response> verdict found in gate reply")]
    MissingVerdict,
    /// Verdict content was neither true nor false.
    #[error("unrecognized gate verdict: {0}")]
    UnrecognizedVerdict(String),
    /// Underlying model invocation failed.
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// LLM-backed allow/deny gate for user questions.
pub struct GuardrailService {
    llm: Arc<dyn LlmClient>,
    verdict_pattern: Regex,
    screen_patterns: Vec<Regex>,
}

impl GuardrailService {
    /// Build the gate over an injected LLM client.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        let verdict_pattern = RegexBuilder::new(r"<response>(.*?)</response>")
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .expect("verdict pattern is valid");

        let screen_patterns = [
            r"<script",
            r"javascript:",
            r"data:text/html",
            r"<iframe",
            r"eval\s*\(",
        ]
        .into_iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("screen pattern is valid")
        })
        .collect();

        Self {
            llm,
            verdict_pattern,
            screen_patterns,
        }
    }

    /// Decide whether a question may proceed to retrieval.
    ///
    /// Denies on screen failure, on an unparseable verdict, and on any model error: the
    /// gate fails closed.
    pub async fn validate_question(&self, question: &str) -> bool {
        if !self.passes_basic_screen(question) {
            return false;
        }

        match self.gate_verdict(question).await {
            Ok(allowed) => allowed,
            Err(error) => {
                tracing::warn!(error = %error, "Question gate failed; denying query");
                false
            }
        }
    }

    fn passes_basic_screen(&self, question: &str) -> bool {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return false;
        }
        if trimmed.chars().count() > MAX_QUESTION_CHARS {
            tracing::warn!(
                chars = trimmed.chars().count(),
                "Question exceeds length cap"
            );
            return false;
        }
        if self
            .screen_patterns
            .iter()
            .any(|pattern| pattern.is_match(question))
        {
            tracing::warn!("Question matched an injection pattern");
            return false;
        }
        true
    }

    async fn gate_verdict(&self, question: &str) -> Result<bool, GuardrailError> {
        let reply = self
            .llm
            .invoke(GATE_SYSTEM_PROMPT, &gate_user_prompt(question))
            .await?;
        self.extract_verdict(&reply)
    }

    fn extract_verdict(&self, reply: &str) -> Result<bool, GuardrailError> {
        let captures = self
            .verdict_pattern
            .captures(reply)
            .ok_or(GuardrailError::MissingVerdict)?;
        let verdict = captures
            .get(1)
            .map(|group| group.as_str().trim())
            .unwrap_or("");

        if verdict.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if verdict.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(GuardrailError::UnrecognizedVerdict(verdict.to_string()))
        }
    }
}
