//! One bad manifest entry fails alone.

use crate::common::*;
use kvsnap::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_mismatched_entry_is_the_only_failure() {
    let (mut doc, _) = export(&mixed_store()).await;
    // Manifest says set, container holds a hash-shaped value
    doc.set_keys.insert("broken".into(), json!({"not": "a set"}));
    doc.key_manifest
        .insert(2, ManifestEntry::new("broken", TypeTag::Set));
    let n = doc.key_manifest.len();

    let target = MemoryStore::new();
    let report = restore(&target, &doc).await;

    assert_eq!(report.total, n);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures[0].key, "broken");
    assert_eq!(report.restored.total(), n - 1);
    assert_eq!(target.len(), n - 1);
}

#[tokio::test]
async fn test_store_write_failure_is_isolated() {
    let (doc, _) = export(&mixed_store()).await;
    let target = MemoryStore::new();
    target.fail_writes_for("tags");

    let report = restore(&target, &doc).await;
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures[0].key, "tags");
    assert_eq!(report.restored.total(), 4);
    assert!(target.get("log").is_some());
}

#[tokio::test]
async fn test_unknown_type_and_missing_data_each_count_once() {
    let (mut doc, _) = export(&mixed_store()).await;
    doc.key_manifest.push(ManifestEntry {
        key: "events".into(),
        kind: "stream".into(),
    });
    doc.key_manifest.push(ManifestEntry::new("ghost", TypeTag::Hash));

    let audit = doc.audit_manifest();
    assert_eq!(audit.unknown_types.len(), 1);
    assert_eq!(audit.missing_data.len(), 1);

    let report = restore(&MemoryStore::new(), &doc).await;
    assert_eq!(report.failed(), 2);
    assert_eq!(report.restored.total(), 5);
}
