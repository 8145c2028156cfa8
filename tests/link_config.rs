//! Catalog configurations with inline analyzer definitions

use doclink::document::mangle::field_name;
use doclink::{
    AnalyzerResolver, DoclinkError, FieldIterator, IndexWriter, LinkConfig, PrimaryKey, ValueKind,
};
use serde_json::{json, Value};

fn catalog() -> Value {
    json!({
        "includeAllFields": true,
        "fields": {
            "body": {
                "analyzers": [
                    { "name": "body_text", "type": "text", "properties": { "stem": false, "remove_stopwords": false } }
                ],
                "boost": 2.0
            },
            "tags": {
                "analyzers": [
                    { "name": "comma", "type": "delimiter", "properties": { "delimiter": "," } },
                    "identity"
                ],
                "storeValues": "id"
            }
        }
    })
}

fn document() -> Value {
    json!({
        "title": "Hello",
        "body": "The quick brown fox",
        "tags": "red,green"
    })
}

fn flatten(doc: &Value, config: &LinkConfig) -> Vec<(String, Vec<String>)> {
    let mut it = FieldIterator::new();
    it.reset(doc, config);
    let mut fields = Vec::new();
    while it.valid() {
        let field = it.field_mut().unwrap();
        let terms = field
            .drain_tokens()
            .iter()
            .map(|t| t.text().unwrap().to_string())
            .collect();
        fields.push((field.name().to_string(), terms));
        it.advance();
    }
    fields
}

#[test]
fn test_inline_definitions_drive_tokenization() {
    let resolver = AnalyzerResolver::default();
    let config = LinkConfig::init(&catalog(), &resolver, true).unwrap();

    let fields = flatten(&document(), &config);
    assert_eq!(
        fields,
        vec![
            (
                field_name("title", ValueKind::String, "identity"),
                vec!["Hello".to_string()]
            ),
            (
                field_name("body", ValueKind::String, "body_text"),
                vec![
                    "the".to_string(),
                    "quick".to_string(),
                    "brown".to_string(),
                    "fox".to_string()
                ]
            ),
            (
                field_name("tags", ValueKind::String, "comma"),
                vec!["red".to_string(), "green".to_string()]
            ),
            (
                field_name("tags", ValueKind::String, "identity"),
                vec!["red,green".to_string()]
            ),
        ]
    );
    assert!(resolver.lookup("body_text").is_some());
    assert!(resolver.lookup("comma").is_some());
}

#[test]
fn test_definitions_rejected_unless_allowed() {
    let resolver = AnalyzerResolver::default();
    let err = LinkConfig::init(&catalog(), &resolver, false).unwrap_err();
    assert_eq!(err.path, "fields.body.analyzers[0]");
    assert!(resolver.lookup("body_text").is_none());
}

#[test]
fn test_unknown_analyzer_name() {
    let resolver = AnalyzerResolver::default();
    let raw = json!({ "fields": { "a": { "analyzers": ["missing"] } } });
    let err = LinkConfig::init(&raw, &resolver, false).unwrap_err();
    assert_eq!(err.path, "fields.a.analyzers[0]");

    let wrapped: DoclinkError = err.into();
    assert!(wrapped.to_string().contains("fields.a.analyzers[0]"));
}

#[test]
fn test_invalid_analyzer_properties() {
    let resolver = AnalyzerResolver::default();
    let raw = json!({
        "analyzers": [{ "name": "bad", "type": "delimiter", "properties": { "delimiter": "" } }]
    });
    let err = LinkConfig::init(&raw, &resolver, true).unwrap_err();
    assert_eq!(err.path, "analyzers[0].properties");
    assert!(resolver.lookup("bad").is_none());
}

#[test]
fn test_catalog_round_trip_into_fresh_resolver() {
    let resolver = AnalyzerResolver::default();
    let config = LinkConfig::init(&catalog(), &resolver, true).unwrap();
    let persisted = config.to_json_with_definitions();

    let reopened_resolver = AnalyzerResolver::default();
    let reopened = LinkConfig::init(&persisted, &reopened_resolver, true).unwrap();
    assert_eq!(reopened.to_json_with_definitions(), persisted);
    assert_eq!(flatten(&document(), &reopened), flatten(&document(), &config));

    // by-name form needs the analyzers to be known already
    let by_name = config.to_json();
    assert!(LinkConfig::init(&by_name, &AnalyzerResolver::default(), false).is_err());
    let again = LinkConfig::init(&by_name, &reopened_resolver, false).unwrap();
    assert_eq!(again.to_json(), by_name);
}

#[test]
fn test_indexed_terms_are_searchable() {
    let resolver = AnalyzerResolver::default();
    let config = LinkConfig::init(&catalog(), &resolver, true).unwrap();
    let writer = IndexWriter::default();

    writer
        .documents()
        .insert_document(PrimaryKey(7), &document(), &config);
    writer
        .documents()
        .insert_document(PrimaryKey(8), &json!({ "tags": "green" }), &config);
    writer.commit().unwrap();

    let snapshot = writer.snapshot();
    let segment = &snapshot.segments()[0];
    let comma = field_name("tags", ValueKind::String, "comma");
    assert_eq!(segment.doc_frequency(&comma, b"green"), 2);
    assert_eq!(segment.doc_frequency(&comma, b"red"), 1);

    let body = field_name("body", ValueKind::String, "body_text");
    let docs = segment.live_docs_with_term(&body, b"fox");
    assert_eq!(docs.len(), 1);
    assert_eq!(segment.primary_key(docs[0]).unwrap(), Some(7));
}

#[test]
fn test_reordered_properties_are_the_same_definition() {
    let resolver = AnalyzerResolver::default();
    let first = json!({
        "analyzers": [{ "name": "t", "type": "text", "properties": { "stem": false, "language": "german" } }]
    });
    let reordered = json!({
        "analyzers": [{ "name": "t", "type": "text", "properties": { "language": "german", "stem": false } }]
    });

    let a = LinkConfig::init(&first, &resolver, true).unwrap();
    let b = LinkConfig::init(&reordered, &resolver, true).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_json_with_definitions(), b.to_json_with_definitions());
}

#[test]
fn test_misspelled_text_property_rejected() {
    let resolver = AnalyzerResolver::default();
    let raw = json!({
        "analyzers": [{ "name": "t", "type": "text", "properties": { "languag": "german" } }]
    });
    let err = LinkConfig::init(&raw, &resolver, true).unwrap_err();
    assert_eq!(err.path, "analyzers[0].properties");
    assert!(resolver.lookup("t").is_none());
}
