//! Retention window boundaries.

use crate::common::*;
use chrono::Duration;
use kvsnap::prelude::*;
use kvsnap_core::naming::{backup_path, BACKUP_DIRECTORY};

#[tokio::test]
async fn test_only_entries_older_than_window_are_pruned() {
    let archive = MemoryArchive::new();
    let paths: Vec<String> = [0, 6, 7, 8]
        .iter()
        .map(|age| backup_path(BACKUP_DIRECTORY, today() - Duration::days(*age)))
        .collect();
    for path in &paths {
        archive.insert(path.clone(), "{}");
    }

    let report = Publisher::new(&archive, PublishOptions::default())
        .prune(today())
        .await
        .unwrap();

    assert_eq!(report.examined, 4);
    assert_eq!(report.deleted, vec![paths[3].clone()]);
    assert_eq!(archive.paths().len(), 3);
    assert!(archive.content(&paths[2]).is_some());
}

#[tokio::test]
async fn test_publish_then_prune_keeps_todays_entry() {
    let archive = MemoryArchive::new();
    let old = backup_path(BACKUP_DIRECTORY, today() - Duration::days(30));
    archive.insert(old.clone(), "{}");

    let (doc, _) = export(&mixed_store()).await;
    let publisher = Publisher::new(&archive, PublishOptions::default());
    let receipt = publisher.publish(&doc, today()).await.unwrap();
    let report = publisher.prune(today()).await.unwrap();

    assert_eq!(report.deleted, vec![old]);
    assert_eq!(archive.paths(), vec![receipt.path]);
}
