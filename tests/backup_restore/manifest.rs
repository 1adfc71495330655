//! Every container key has exactly one matching manifest entry.

use crate::common::*;
use kvsnap::prelude::*;
use std::collections::BTreeMap;

fn container_index(doc: &BackupDocument) -> BTreeMap<String, String> {
    let mut index = BTreeMap::new();
    for (key, value) in &doc.simple_keys {
        let kind = if kvsnap_core::unwrap_list(value).is_some() {
            "list"
        } else {
            "string"
        };
        index.insert(key.clone(), kind.to_string());
    }
    for key in doc.hash_keys.keys() {
        index.insert(key.clone(), "hash".to_string());
    }
    for key in doc.set_keys.keys() {
        index.insert(key.clone(), "set".to_string());
    }
    for key in doc.sorted_set_keys.keys() {
        index.insert(key.clone(), "zset".to_string());
    }
    index
}

#[tokio::test]
async fn test_manifest_matches_containers_both_ways() {
    let store = mixed_store();
    for i in 0..40 {
        store.insert(format!("bulk:{i}"), StoreValue::Set(strings(&["m"])));
    }
    let (doc, _) = export(&store).await;

    let manifest: BTreeMap<String, String> = doc
        .key_manifest
        .iter()
        .map(|e| (e.key.clone(), e.kind.clone()))
        .collect();
    assert_eq!(manifest.len(), doc.key_manifest.len(), "duplicate manifest keys");
    assert_eq!(manifest, container_index(&doc));
    assert!(doc.audit_manifest().is_clean());
}

#[tokio::test]
async fn test_manifest_completeness_with_scan_fallback() {
    let store = mixed_store();
    store.disable_key_listing();
    let (doc, report) = Exporter::new(&store, ExportOptions::new().scan_count(2))
        .export(now())
        .await
        .unwrap();
    assert!(report.method.is_complete());
    assert_eq!(doc.len(), 5);
    assert!(doc.audit_manifest().is_clean());
}
