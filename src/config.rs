use std::env;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the clausetag server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Elasticsearch instance that stores tagged chunks.
    pub es_url: String,
    /// Name of the index receiving tagged chunk records.
    pub es_index_name: String,
    /// Optional API key required to access Elasticsearch.
    pub es_api_key: Option<String>,
    /// Optional override for the Ollama base URL.
    pub ollama_url: Option<String>,
    /// Model identifier passed to the LLM provider.
    pub llm_model: String,
    /// Upper bound on chunk length in characters.
    pub chunk_max_chars: usize,
    /// Characters carried over between adjacent chunks.
    pub chunk_overlap: usize,
    /// Maximum in-flight classification calls per document.
    pub classify_concurrency: usize,
    /// Per-request timeout for LLM calls, in seconds.
    pub llm_timeout_secs: u64,
    /// Per-request timeout for Elasticsearch calls, in seconds.
    pub es_timeout_secs: u64,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

const DEFAULT_CHUNK_MAX_CHARS: usize = 1200;
const DEFAULT_CHUNK_OVERLAP: usize = 120;
const DEFAULT_CLASSIFY_CONCURRENCY: usize = 6;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ES_TIMEOUT_SECS: u64 = 30;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            es_url: load_env("ES_URL")?,
            es_index_name: load_env("ES_INDEX_NAME")?,
            es_api_key: load_env_optional("ES_API_KEY"),
            ollama_url: load_env_optional("OLLAMA_URL"),
            llm_model: load_env("LLM_MODEL")?,
            chunk_max_chars: load_env_parsed_or("CHUNK_MAX_CHARS", DEFAULT_CHUNK_MAX_CHARS)?,
            chunk_overlap: load_env_parsed_or("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            classify_concurrency: load_env_parsed_or(
                "CLASSIFY_CONCURRENCY",
                DEFAULT_CLASSIFY_CONCURRENCY,
            )?,
            llm_timeout_secs: load_env_parsed_or("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?,
            es_timeout_secs: load_env_parsed_or("ES_TIMEOUT_SECS", DEFAULT_ES_TIMEOUT_SECS)?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_parsed_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}
