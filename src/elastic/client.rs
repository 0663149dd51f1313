//! HTTP client wrapper for the Elasticsearch REST API.

use crate::elastic::types::{
    BulkFailure, BulkReport, BulkResponse, EsError, IndexedChunkRecord, SearchResponse,
};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;

/// Lightweight HTTP client for index management, bulk writes, and queries.
///
/// Cloning is cheap (the underlying connection pool is shared), so one instance can be
/// handed to every component that needs the store.
#[derive(Clone)]
pub struct EsService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl EsService {
    /// Construct a new client for the given base URL, with a per-request timeout.
    pub fn new(url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, EsError> {
        let client = Client::builder()
            .user_agent("clausetag/0.1")
            .timeout(timeout)
            .build()?;
        let base_url = normalize_base_url(url).map_err(EsError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = api_key.as_deref().map(|value| !value.is_empty()).unwrap_or(false),
            "Initialized Elasticsearch HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Report whether the named index exists.
    pub async fn index_exists(&self, index: &str) -> Result<bool, EsError> {
        let response = self.request(Method::HEAD, index).send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = EsError::UnexpectedStatus { status, body };
                tracing::error!(index, error = %error, "Index existence check failed");
                Err(error)
            }
        }
    }

    /// Create the index with the fixed chunk-record mapping.
    pub async fn create_index(&self, index: &str) -> Result<(), EsError> {
        let response = self
            .request(Method::PUT, index)
            .json(&index_schema())
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(index, "Index created");
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        // The existence check in ensure_index is not atomic against concurrent creators;
        // the store's already-exists rejection makes the create converge anyway.
        if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception")
        {
            tracing::debug!(index, "Index already exists");
            return Ok(());
        }

        let error = EsError::UnexpectedStatus { status, body };
        tracing::error!(index, error = %error, "Index creation failed");
        Err(error)
    }

    /// Create the index only when it is missing.
    pub async fn ensure_index(&self, index: &str) -> Result<(), EsError> {
        if self.index_exists(index).await? {
            return Ok(());
        }

        tracing::debug!(index, "Creating index");
        self.create_index(index).await
    }

    /// Submit records as a single `_bulk` request.
    ///
    /// A non-success HTTP status is a total failure. When the store accepts the call but
    /// rejects individual records, those rejections are collected into the report so the
    /// caller can distinguish partial success from full success.
    pub async fn bulk_write(
        &self,
        index: &str,
        records: &[IndexedChunkRecord],
    ) -> Result<BulkReport, EsError> {
        if records.is_empty() {
            return Ok(BulkReport::default());
        }

        let mut body = String::new();
        for record in records {
            body.push_str(&json!({ "index": { "_index": index } }).to_string());
            body.push('\n');
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }

        let response = self
            .request(Method::POST, "_bulk")
            .header("content-type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = EsError::UnexpectedStatus { status, body };
            tracing::error!(index, error = %error, "Bulk request failed");
            return Err(error);
        }

        let payload: BulkResponse = response.json().await?;
        if !payload.errors {
            tracing::debug!(index, records = records.len(), "Records indexed");
            return Ok(BulkReport {
                success_count: records.len(),
                failures: Vec::new(),
            });
        }

        let failures: Vec<BulkFailure> = payload
            .items
            .iter()
            .enumerate()
            .filter_map(|(position, item)| {
                item.index.error.as_ref().map(|error| BulkFailure {
                    position,
                    reason: describe_bulk_error(error, item.index.status),
                })
            })
            .collect();

        Ok(BulkReport {
            success_count: records.len().saturating_sub(failures.len()),
            failures,
        })
    }

    /// Make newly written records visible to subsequent searches.
    pub async fn refresh(&self, index: &str) -> Result<(), EsError> {
        let response = self
            .request(Method::POST, &format!("{index}/_refresh"))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(index, "Index refreshed");
        })
        .await
    }

    /// Run a search request against the index, returning decoded chunk records.
    pub async fn search(
        &self,
        index: &str,
        body: Value,
    ) -> Result<Vec<IndexedChunkRecord>, EsError> {
        let response = self
            .request(Method::POST, &format!("{index}/_search"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = EsError::UnexpectedStatus { status, body };
            tracing::error!(index, error = %error, "Search request failed");
            return Err(error);
        }

        let payload: SearchResponse = response.json().await?;
        Ok(payload
            .hits
            .hits
            .into_iter()
            .map(|hit| hit.source)
            .collect())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("Authorization", format!("ApiKey {api_key}"));
        }
        req
    }

    async fn ensure_success<F>(&self, response: reqwest::Response, on_success: F) -> Result<(), EsError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = EsError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Elasticsearch request failed");
            Err(error)
        }
    }
}

/// Mapping applied when creating the chunk-record index.
fn index_schema() -> Value {
    json!({
        "settings": {
            "index": { "number_of_shards": 1, "number_of_replicas": 0 }
        },
        "mappings": {
            "properties": {
                "doc_id":      { "type": "keyword" },
                "chunk_id":    { "type": "integer" },
                "text":        { "type": "text" },
                "section":     { "type": "keyword" },
                "risk_tags":   { "type": "keyword" },
                "explanation": { "type": "text" },
                "timestamp":   { "type": "date" },
                "file_name":   { "type": "keyword" },
                "file_type":   { "type": "keyword" }
            }
        }
    })
}

fn describe_bulk_error(error: &Value, status: u16) -> String {
    let reason = error
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    format!("status {status}: {reason}")
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
