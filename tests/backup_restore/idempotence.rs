//! Restoring twice equals restoring once.

use crate::common::*;
use kvsnap::prelude::*;

#[tokio::test]
async fn test_second_restore_changes_nothing() {
    let (doc, _) = export(&mixed_store()).await;

    let once = MemoryStore::new();
    restore(&once, &doc).await;

    let twice = MemoryStore::new();
    restore(&twice, &doc).await;
    restore(&twice, &doc).await;

    assert_eq!(once.snapshot(), twice.snapshot());
}

#[tokio::test]
async fn test_restore_clears_stale_remnants() {
    let (doc, _) = export(&mixed_store()).await;

    let target = MemoryStore::new();
    target.insert("user:1", hash(&[("name", "Bob"), ("email", "bob@x")]));
    target.insert("tags", StoreValue::Set(strings(&["a", "b", "c"])));
    target.insert("log", StoreValue::List(strings(&["old"])));
    target.insert("unrelated", StoreValue::String("kept".into()));

    let report = restore(&target, &doc).await;
    assert_eq!(report.restored.total(), 5);

    assert_eq!(target.get("user:1"), Some(hash(&[("name", "Ann"), ("age", "30")])));
    assert_eq!(target.get("tags"), Some(StoreValue::Set(strings(&["a", "b"]))));
    assert_eq!(target.get("log"), Some(StoreValue::List(strings(&["e1", "e2"]))));
    // Restore overwrites, it does not flush
    assert_eq!(target.get("unrelated"), Some(StoreValue::String("kept".into())));
}
