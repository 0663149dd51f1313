//! Opaque language-model invocation used by classification, the question gate, and QA.
//!
//! The provider contract is deliberately small: given a system instruction and input text,
//! return raw text. Callers own interpretation of the reply; this module only surfaces
//! transport, status, and decode failures as typed errors. The Ollama-backed client issues
//! HTTP requests directly to the runtime.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Errors surfaced while invoking the language model.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider unreachable, or the request timed out.
    #[error("LLM provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("LLM invocation failed: {0}")]
    InvocationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed LLM response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by text-generation backends.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke the model with a system instruction and user input, returning raw text.
    async fn invoke(
        &self,
        system_instruction: &str,
        user_instruction: &str,
    ) -> Result<String, LlmError>;
}

/// Ollama-backed client issuing non-streaming generate requests.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Construct a client for the given runtime URL and model, with a per-request timeout.
    pub fn new(base_url: Option<String>, model: String, timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent("clausetag/0.1")
            .timeout(timeout)
            .build()
            .expect("Failed to construct reqwest::Client for LLM calls");
        Self {
            http,
            base_url: base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn invoke(
        &self,
        system_instruction: &str,
        user_instruction: &str,
    ) -> Result<String, LlmError> {
        let payload = json!({
            "model": self.model,
            "system": system_instruction,
            "prompt": user_instruction,
            "stream": false,
            "options": {
                // Deterministic output keeps tag selection stable across retries.
                "temperature": 0.0,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    LlmError::ProviderUnavailable(format!("LLM request timed out: {error}"))
                } else {
                    LlmError::ProviderUnavailable(format!(
                        "failed to reach Ollama at {}: {error}",
                        self.base_url
                    ))
                }
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(LlmError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::InvocationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            LlmError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(LlmError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}
