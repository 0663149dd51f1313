#![deny(missing_docs)]

//! Core library for the clausetag risk-tagging service.

/// HTTP routing and REST handlers.
pub mod api;
/// Chunk classification against the closed risk-tag vocabulary.
pub mod classify;
/// Environment-driven configuration management.
pub mod config;
/// Elasticsearch index and query integration.
pub mod elastic;
/// Text extraction from uploaded document sources.
pub mod extract;
/// Allow/deny gate screening user questions.
pub mod guardrail;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Document processing pipeline utilities.
pub mod processing;
/// Retrieval-augmented question answering.
pub mod qa;
/// Controlled risk-tag vocabulary.
pub mod vocab;
