//! Operator-level scenarios.

use crate::common::*;
use kvsnap::prelude::*;
use kvsnap_core::ScoredMember;
use std::io::Write;

#[tokio::test]
async fn test_empty_store_exports_empty_document() {
    let store = MemoryStore::new();
    let (doc, report) = export(&store).await;

    assert!(doc.is_empty());
    assert!(doc.simple_keys.is_empty());
    assert!(doc.hash_keys.is_empty());
    assert!(doc.set_keys.is_empty());
    assert!(doc.sorted_set_keys.is_empty());
    assert_eq!(report.keys_found, 0);

    let archive = MemoryArchive::new();
    let receipt = Publisher::new(&archive, PublishOptions::default())
        .publish(&doc, today())
        .await
        .unwrap();
    let text = archive.content(&receipt.path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["keyManifest"], serde_json::json!([]));
    assert_eq!(json["version"], "1.0");
}

#[tokio::test]
async fn test_mixed_store_round_trip() {
    let (doc, report) = export(&mixed_store()).await;
    assert_eq!(doc.key_manifest.len(), 5);
    assert_eq!(report.exported.total(), 5);

    let target = MemoryStore::new();
    let restored = restore(&target, &doc).await;
    assert_eq!(restored.restored.total(), 5);

    assert_eq!(target.get("greeting"), Some(StoreValue::String("hi".into())));
    assert_eq!(target.get("user:1"), Some(hash(&[("name", "Ann"), ("age", "30")])));
    assert_eq!(target.get("tags"), Some(StoreValue::Set(strings(&["a", "b"]))));
    assert_eq!(
        target.get("scores"),
        Some(StoreValue::ZSet(vec![
            ScoredMember::new("x", 1.0),
            ScoredMember::new("y", 2.0)
        ]))
    );
    assert_eq!(target.get("log"), Some(StoreValue::List(strings(&["e1", "e2"]))));
}

#[tokio::test]
async fn test_restore_from_local_file_with_lock() {
    let (doc, _) = export(&mixed_store()).await;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(doc.to_json_pretty().unwrap().as_bytes()).unwrap();

    let target = MemoryStore::new();
    let outcome = RestoreLoader::new(&target, RestoreOptions::default())
        .run(
            &BackupSource::LocalFile(file.path().to_path_buf()),
            &mut AutoConfirm,
        )
        .await
        .unwrap();

    match outcome {
        RestoreOutcome::Completed { plan, report } => {
            assert_eq!(plan.total, 5);
            assert_eq!(report.restored.total(), 5);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(target.get(kvsnap_store::DEFAULT_LOCK_KEY).is_none());
    assert_eq!(target.len(), 5);
}

#[tokio::test]
async fn test_legacy_document_with_json_values() {
    let legacy = serde_json::json!({
        "version": "1.0",
        "createdAt": "2025-01-01T00:00:00.000Z",
        "source": "upstash-redis",
        "simpleKeys": {
            "post:1": {"title": "Hello", "likes": 3},
            "count": 7
        },
        "hashKeys": {"user:1": {"name": "Ann", "admin": true}},
        "setKeys": {},
        "sortedSetKeys": {"rank": ["a", "1", "b", 2]},
        "keyManifest": [
            {"key": "post:1", "type": "string"},
            {"key": "count", "type": "string"},
            {"key": "user:1", "type": "hash"},
            {"key": "rank", "type": "zset"}
        ]
    });
    let doc = kvsnap_core::parse_document(legacy.to_string().as_bytes()).unwrap();

    let target = MemoryStore::new();
    let report = restore(&target, &doc).await;
    assert!(!report.has_failures());
    assert_eq!(
        target.get("post:1"),
        Some(StoreValue::String("{\"title\":\"Hello\",\"likes\":3}".into()))
    );
    assert_eq!(target.get("count"), Some(StoreValue::String("7".into())));
    assert_eq!(target.get("user:1"), Some(hash(&[("name", "Ann"), ("admin", "true")])));
    assert_eq!(
        target.get("rank"),
        Some(StoreValue::ZSet(vec![
            ScoredMember::new("a", 1.0),
            ScoredMember::new("b", 2.0)
        ]))
    );
}
