//! Export → restore reproduces every value.

use crate::common::*;
use kvsnap::prelude::*;
use kvsnap_core::ScoredMember;

#[tokio::test]
async fn test_each_type_round_trips_through_json_text() {
    let source = mixed_store();
    source.insert(
        "weird",
        StoreValue::ZSet(vec![
            ScoredMember::new("neg", -2.5),
            ScoredMember::new("zero", 0.0),
            ScoredMember::new("inf", f64::INFINITY),
        ]),
    );
    source.insert("unicode", StoreValue::String("héllo ✓ \"quoted\"".into()));

    let (doc, _) = export(&source).await;
    // Through the published text form, not just the in-memory document
    let text = doc.to_json_pretty().unwrap();
    let parsed = kvsnap_core::parse_document(text.as_bytes()).unwrap();

    let target = MemoryStore::new();
    let report = restore(&target, &parsed).await;
    assert!(!report.has_failures());
    assert_eq!(target.snapshot(), source.snapshot());
}

#[tokio::test]
async fn test_list_order_and_duplicates_are_kept() {
    let source = MemoryStore::new();
    source.insert("q", StoreValue::List(strings(&["b", "a", "b", "c"])));

    let (doc, _) = export(&source).await;
    let target = MemoryStore::new();
    restore(&target, &doc).await;
    assert_eq!(
        target.get("q"),
        Some(StoreValue::List(strings(&["b", "a", "b", "c"])))
    );
}

#[tokio::test]
async fn test_json_looking_strings_stay_strings() {
    let source = MemoryStore::new();
    source.insert("cfg", StoreValue::String("{\"a\":1}".into()));
    source.insert("n", StoreValue::String("42".into()));

    let (doc, _) = export(&source).await;
    assert_eq!(doc.simple_keys["cfg"], serde_json::json!("{\"a\":1}"));

    let target = MemoryStore::new();
    restore(&target, &doc).await;
    assert_eq!(target.snapshot(), source.snapshot());
}
