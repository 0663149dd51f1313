//! End-to-end pipeline tests driving ingestion and retrieval against mock
//! Elasticsearch and Ollama servers.

use std::sync::Arc;
use std::time::Duration;

use clausetag::{
    classify::{ChunkClassifier, LlmClient, OllamaClient},
    elastic::EsService,
    guardrail::GuardrailService,
    processing::{PipelineService, PipelineSettings, ProcessingError},
    qa::QaService,
};
use httpmock::{
    Method::{HEAD, POST, PUT},
    Mock, MockServer,
};
use serde_json::json;
use uuid::Uuid;

const INDEX: &str = "tagged_legal_docs";

fn build_service(base_url: &str) -> PipelineService {
    let llm: Arc<dyn LlmClient> = Arc::new(OllamaClient::new(
        Some(base_url.to_string()),
        "llama".into(),
        Duration::from_secs(5),
    ));
    let search = EsService::new(base_url, None, Duration::from_secs(5)).expect("es client");
    let classifier = ChunkClassifier::new(llm.clone());
    let qa = QaService::new(
        GuardrailService::new(llm.clone()),
        search.clone(),
        llm,
        INDEX.into(),
    );

    PipelineService::new(
        classifier,
        search,
        qa,
        PipelineSettings {
            index_name: INDEX.into(),
            chunk_max_chars: 40,
            chunk_overlap: 5,
            classify_concurrency: 4,
        },
    )
}

async fn mock_classifier_reply(server: &MockServer, reply: serde_json::Value) -> Mock<'_> {
    server
        .mock_async(move |when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(json!({
                "response": reply.to_string(),
                "done": true
            }));
        })
        .await
}

async fn mock_index_provisioning(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(HEAD).path(format!("/{INDEX}"));
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path(format!("/{INDEX}"));
            then.status(200).json_body(json!({ "acknowledged": true }));
        })
        .await;
}

fn bulk_success_body(count: usize) -> serde_json::Value {
    let items: Vec<serde_json::Value> = (0..count)
        .map(|_| json!({ "index": { "status": 201 } }))
        .collect();
    json!({ "took": 5, "errors": false, "items": items })
}

#[tokio::test]
async fn ingest_persists_every_chunk_with_sequential_ids() {
    let server = MockServer::start_async().await;
    mock_index_provisioning(&server).await;
    mock_classifier_reply(
        &server,
        json!({
            "risk_tags": ["late_payment_penalty"],
            "explanation": "Late fees apply.",
            "section_guess": "Payment"
        }),
    )
    .await;

    let doc_id = Uuid::new_v4();
    let bulk = server
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/_bulk")
                .body_contains(doc_id.to_string())
                .body_contains("\"chunk_id\":1")
                .body_contains("\"chunk_id\":2")
                .body_contains("\"chunk_id\":3")
                .body_contains("late_payment_penalty");
            then.status(200).json_body(bulk_success_body(3));
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/{INDEX}/_refresh"));
            then.status(200);
        })
        .await;

    let service = build_service(&server.base_url());
    let chunks = vec![
        "Rent is $1500/month.".to_string(),
        "A late fee of 5% applies after day five.".to_string(),
        "Deposits are held without interest.".to_string(),
    ];
    let count = service
        .ingest_chunks(&chunks, doc_id, "lease.txt", "txt", INDEX)
        .await
        .expect("ingestion succeeded");

    assert_eq!(count, 3);
    bulk.assert();
    refresh.assert();

    let snapshot = service.metrics_snapshot();
    assert_eq!(snapshot.documents_ingested, 1);
    assert_eq!(snapshot.chunks_ingested, 3);
    assert_eq!(snapshot.classification_fallbacks, 0);
}

#[tokio::test]
async fn failing_classification_degrades_chunks_without_blocking_ingestion() {
    let server = MockServer::start_async().await;
    mock_index_provisioning(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(500).body("model crashed");
        })
        .await;

    let bulk = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/_bulk")
                .body_contains("\"risk_tags\":[]")
                .body_contains("\"section\":\"Misc\"");
            then.status(200).json_body(bulk_success_body(2));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/{INDEX}/_refresh"));
            then.status(200);
        })
        .await;

    let service = build_service(&server.base_url());
    let chunks = vec![
        "Either party may terminate at will.".to_string(),
        "Disputes settle by binding arbitration.".to_string(),
    ];
    let count = service
        .ingest_chunks(&chunks, Uuid::new_v4(), "contract.pdf", "pdf", INDEX)
        .await
        .expect("ingestion succeeded despite classifier failures");

    assert_eq!(count, 2);
    bulk.assert();
    assert_eq!(service.metrics_snapshot().classification_fallbacks, 2);
}

#[tokio::test]
async fn partial_bulk_failure_is_surfaced_with_counts() {
    let server = MockServer::start_async().await;
    mock_index_provisioning(&server).await;
    mock_classifier_reply(&server, json!({ "risk_tags": [] })).await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/_bulk");
            then.status(200).json_body(json!({
                "took": 5,
                "errors": true,
                "items": [
                    { "index": { "status": 201 } },
                    { "index": {
                        "status": 400,
                        "error": { "type": "mapper_parsing_exception", "reason": "bad field" }
                    } }
                ]
            }));
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/{INDEX}/_refresh"));
            then.status(200);
        })
        .await;

    let service = build_service(&server.base_url());
    let chunks = vec!["First clause.".to_string(), "Second clause.".to_string()];
    let error = service
        .ingest_chunks(&chunks, Uuid::new_v4(), "lease.txt", "txt", INDEX)
        .await
        .expect_err("partial failure must not read as success");

    match error {
        ProcessingError::PartialWrite {
            failed,
            total,
            samples,
        } => {
            assert_eq!(failed, 1);
            assert_eq!(total, 2);
            assert!(samples.iter().any(|reason| reason.contains("bad field")));
        }
        other => panic!("expected PartialWrite, got {other:?}"),
    }
    assert_eq!(refresh.hits(), 0);
    assert_eq!(service.metrics_snapshot().documents_ingested, 0);
}

#[tokio::test]
async fn total_bulk_failure_is_surfaced_as_write_error() {
    let server = MockServer::start_async().await;
    mock_index_provisioning(&server).await;
    mock_classifier_reply(&server, json!({ "risk_tags": [] })).await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/_bulk");
            then.status(503).body("unavailable");
        })
        .await;

    let service = build_service(&server.base_url());
    let error = service
        .ingest_chunks(
            &["Only clause.".to_string()],
            Uuid::new_v4(),
            "lease.txt",
            "txt",
            INDEX,
        )
        .await
        .expect_err("write failure");

    assert!(matches!(error, ProcessingError::Write(_)));
}

#[tokio::test]
async fn unprovisionable_index_aborts_before_any_write() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(HEAD).path(format!("/{INDEX}"));
            then.status(500).body("cluster down");
        })
        .await;
    let bulk = server
        .mock_async(|when, then| {
            when.method(POST).path("/_bulk");
            then.status(200).json_body(bulk_success_body(1));
        })
        .await;

    let service = build_service(&server.base_url());
    let error = service
        .ingest_chunks(
            &["Only clause.".to_string()],
            Uuid::new_v4(),
            "lease.txt",
            "txt",
            INDEX,
        )
        .await
        .expect_err("index provisioning failure");

    assert!(matches!(error, ProcessingError::IndexProvision { .. }));
    assert_eq!(bulk.hits(), 0);
}

#[tokio::test]
async fn ingest_document_chunks_at_paragraph_boundaries() {
    let server = MockServer::start_async().await;
    mock_index_provisioning(&server).await;
    mock_classifier_reply(
        &server,
        json!({
            "risk_tags": ["no_subletting"],
            "explanation": "Subletting is prohibited.",
            "section_guess": "Usage"
        }),
    )
    .await;
    let bulk = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/_bulk")
                .body_contains("\"chunk_id\":3");
            then.status(200).json_body(bulk_success_body(3));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/{INDEX}/_refresh"));
            then.status(200);
        })
        .await;

    let service = build_service(&server.base_url());
    // Each paragraph fits max_chars=40 alone, but no two fit together.
    let text = "Rent is $1500/month.\n\nLease term: 12 months.\n\nNo subletting allowed.";
    let outcome = service
        .ingest_document(text.to_string(), "lease.txt".into(), "txt".into(), None)
        .await
        .expect("ingestion succeeded");

    assert_eq!(outcome.chunks_ingested, 3);
    assert!(!outcome.doc_id.is_nil());
    bulk.assert();
}

#[tokio::test]
async fn empty_document_ingests_zero_chunks() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(HEAD).path(format!("/{INDEX}"));
            then.status(200);
        })
        .await;
    let bulk = server
        .mock_async(|when, then| {
            when.method(POST).path("/_bulk");
            then.status(200).json_body(bulk_success_body(0));
        })
        .await;

    let service = build_service(&server.base_url());
    let outcome = service
        .ingest_document("   \n\n  ".to_string(), "empty.txt".into(), "txt".into(), None)
        .await
        .expect("empty ingestion succeeds");

    assert_eq!(outcome.chunks_ingested, 0);
    assert_eq!(bulk.hits(), 0);
}

#[tokio::test]
async fn find_by_tags_sends_superset_filter_and_returns_texts() {
    let server = MockServer::start_async().await;
    let doc_id = Uuid::new_v4();
    let search = server
        .mock_async(move |when, then| {
            when.method(POST)
                .path(format!("/{INDEX}/_search"))
                .body_contains(doc_id.to_string())
                .body_contains("auto_renewal")
                .body_contains("mandatory_arbitration")
                .body_contains("chunk_id");
            then.status(200).json_body(json!({
                "hits": {
                    "hits": [
                        { "_source": {
                            "doc_id": doc_id.to_string(),
                            "chunk_id": 2,
                            "text": "Term auto-renews; disputes go to arbitration.",
                            "section": "Jurisdiction",
                            "risk_tags": ["auto_renewal", "mandatory_arbitration"],
                            "explanation": "Evergreen term with binding arbitration.",
                            "timestamp": "2025-01-01T00:00:00Z",
                            "file_name": "lease.txt",
                            "file_type": "txt"
                        } }
                    ]
                }
            }));
        })
        .await;

    let service = build_service(&server.base_url());
    let texts = service
        .find_by_tags(
            doc_id,
            vec!["auto_renewal".into(), "mandatory_arbitration".into()],
            10,
        )
        .await
        .expect("retrieval succeeded");

    search.assert();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("auto-renews"));
}

#[tokio::test]
async fn find_by_tags_returns_empty_for_no_matches() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/{INDEX}/_search"));
            then.status(200).json_body(json!({ "hits": { "hits": [] } }));
        })
        .await;

    let service = build_service(&server.base_url());
    let texts = service
        .find_by_tags(Uuid::new_v4(), vec!["perpetual_term".into()], 10)
        .await
        .expect("empty result is not an error");

    assert!(texts.is_empty());
}
