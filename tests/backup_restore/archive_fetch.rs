//! Restoring from the archive by date and by latest.

use crate::common::*;
use chrono::Duration;
use kvsnap::prelude::*;
use kvsnap_engine::RestoreError;

#[tokio::test]
async fn test_missing_date_is_not_found_with_zero_writes() {
    let archive = MemoryArchive::new();
    let (doc, _) = export(&mixed_store()).await;
    Publisher::new(&archive, PublishOptions::default())
        .publish(&doc, today())
        .await
        .unwrap();

    let target = MemoryStore::new();
    let missing = today() - Duration::days(3);
    let err = RestoreLoader::new(&target, RestoreOptions::default())
        .with_archive(&archive)
        .run(
            &BackupSource::Archive(ArchiveSelector::Date(missing)),
            &mut AutoConfirm,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RestoreError::NotFound { ref path } if path.ends_with("backup-2026-10-16.json")));
    assert!(kvsnap::Error::from(err).is_not_found());
    assert_eq!(target.write_count(), 0);
    assert!(target.is_empty());
}

#[tokio::test]
async fn test_latest_restores_newest_entry() {
    let archive = MemoryArchive::new();
    let publisher = Publisher::new(&archive, PublishOptions::default());

    let old_store = MemoryStore::new();
    old_store.insert("version", StoreValue::String("old".into()));
    let (old_doc, _) = export(&old_store).await;
    publisher
        .publish(&old_doc, today() - Duration::days(1))
        .await
        .unwrap();

    let new_store = MemoryStore::new();
    new_store.insert("version", StoreValue::String("new".into()));
    let (new_doc, _) = export(&new_store).await;
    publisher.publish(&new_doc, today()).await.unwrap();

    let target = MemoryStore::new();
    let outcome = RestoreLoader::new(&target, RestoreOptions::default())
        .with_archive(&archive)
        .run(&BackupSource::Archive(ArchiveSelector::Latest), &mut AutoConfirm)
        .await
        .unwrap();

    assert!(matches!(outcome, RestoreOutcome::Completed { .. }));
    assert_eq!(target.get("version"), Some(StoreValue::String("new".into())));
}

#[tokio::test]
async fn test_declined_restore_touches_nothing() {
    let archive = MemoryArchive::new();
    let (doc, _) = export(&mixed_store()).await;
    Publisher::new(&archive, PublishOptions::default())
        .publish(&doc, today())
        .await
        .unwrap();

    let target = MemoryStore::new();
    let mut asked = false;
    let mut decline = |plan: &kvsnap_engine::RestorePlan| {
        asked = plan.total == 5;
        false
    };
    let outcome = RestoreLoader::new(&target, RestoreOptions::default())
        .with_archive(&archive)
        .run(&BackupSource::Archive(ArchiveSelector::Latest), &mut decline)
        .await
        .unwrap();

    assert!(matches!(outcome, RestoreOutcome::Declined(_)));
    assert!(asked);
    assert_eq!(target.write_count(), 0);
}
