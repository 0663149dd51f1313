//! Query builders for tag-filtered retrieval and full-text search.

use serde_json::{Value, json};
use uuid::Uuid;

/// Compose the bool filter requiring `doc_id` plus every requested risk tag.
///
/// Each tag contributes its own `term` clause, so a record must carry all of them:
/// superset (AND) semantics, not any-of. Empty or whitespace-only tags are skipped.
pub fn build_tag_filter(doc_id: Uuid, required_tags: &[String]) -> Value {
    let mut clauses: Vec<Value> = vec![json!({
        "term": { "doc_id": doc_id.to_string() }
    })];

    for tag in required_tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        clauses.push(json!({
            "term": { "risk_tags": trimmed }
        }));
    }

    json!({ "bool": { "filter": clauses } })
}

/// Compose a full-text query over chunk text, optionally scoped to one document.
pub fn build_text_query(question: &str, doc_id: Option<Uuid>) -> Value {
    let mut bool_query = json!({
        "must": [
            { "match": { "text": question } }
        ]
    });

    if let Some(id) = doc_id {
        bool_query["filter"] = json!([
            { "term": { "doc_id": id.to_string() } }
        ]);
    }

    json!({ "bool": bool_query })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_filter_requires_every_tag() {
        let doc_id = Uuid::new_v4();
        let filter = build_tag_filter(
            doc_id,
            &["auto_renewal".into(), "mandatory_arbitration".into()],
        );

        assert_eq!(
            filter,
            json!({
                "bool": {
                    "filter": [
                        { "term": { "doc_id": doc_id.to_string() } },
                        { "term": { "risk_tags": "auto_renewal" } },
                        { "term": { "risk_tags": "mandatory_arbitration" } }
                    ]
                }
            })
        );
    }

    #[test]
    fn tag_filter_skips_blank_tags() {
        let doc_id = Uuid::new_v4();
        let filter = build_tag_filter(doc_id, &["  ".into(), "no_subletting".into()]);
        let clauses = filter["bool"]["filter"].as_array().expect("clauses");
        assert_eq!(clauses.len(), 2);
    }

    #[test]
    fn tag_filter_with_no_tags_keeps_doc_scope() {
        let doc_id = Uuid::new_v4();
        let filter = build_tag_filter(doc_id, &[]);
        let clauses = filter["bool"]["filter"].as_array().expect("clauses");
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0]["term"]["doc_id"], doc_id.to_string());
    }

    #[test]
    fn text_query_scopes_to_document() {
        let doc_id = Uuid::new_v4();
        let query = build_text_query("what are my obligations", Some(doc_id));

        assert_eq!(
            query,
            json!({
                "bool": {
                    "must": [
                        { "match": { "text": "what are my obligations" } }
                    ],
                    "filter": [
                        { "term": { "doc_id": doc_id.to_string() } }
                    ]
                }
            })
        );
    }

    #[test]
    fn text_query_without_document_has_no_filter() {
        let query = build_text_query("termination rights", None);
        assert!(query["bool"]["filter"].is_null());
    }
}
