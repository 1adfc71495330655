//! Archive Publisher
//!
//! Persists a [`BackupDocument`] as the day's archive entry and enforces
//! the retention window.
//!
//! Publishing is an upsert keyed by date: the current content handle is
//! looked up first so that a second run on the same day replaces that
//! day's entry. Any archive failure while publishing is returned to the
//! caller, since an unpublished backup must not look like a success.
//!
//! Pruning is best effort. A missing directory means nothing to prune, and
//! a failed delete is logged and counted while the remaining stale entries
//! are still removed.

use chrono::NaiveDate;
use kvsnap_archive::{ArchiveError, RemoteArchive};
use kvsnap_core::naming::{backup_path, is_expired, parse_backup_date, BACKUP_DIRECTORY};
use kvsnap_core::BackupDocument;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default retention window in days
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Publisher settings
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Archive directory holding the dated entries
    pub directory: String,
    /// Entries older than this many days are pruned
    pub retention_days: u32,
}

impl Default for PublishOptions {
    fn default() -> Self {
        PublishOptions {
            directory: BACKUP_DIRECTORY.to_string(),
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl PublishOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive directory
    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Retention window in days
    pub fn retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }
}

/// Where a document was published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Archive path
    pub path: String,
    /// New content handle
    pub sha: String,
    /// Whether an entry for the same day was replaced
    pub replaced: bool,
    /// Bytes written
    pub bytes: usize,
}

/// Outcome of a prune pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Dated entries examined
    pub examined: usize,
    /// Paths deleted
    pub deleted: Vec<String>,
    /// Paths whose delete failed
    pub failed: Vec<String>,
    /// Files in the directory that are not dated entries
    pub ignored: usize,
}

impl PruneReport {
    /// Human-readable one-liner
    pub fn summary(&self) -> String {
        format!(
            "Prune complete: {} examined, {} deleted, {} failed, {} ignored",
            self.examined,
            self.deleted.len(),
            self.failed.len(),
            self.ignored
        )
    }

    /// Whether any stale entry survived
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Publisher failures
#[derive(Debug, Error)]
pub enum PublishError {
    /// The document could not be serialized
    #[error("cannot serialize backup document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The archive rejected or could not be reached
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
}

/// Result alias for publishing
pub type PublishResult<T> = std::result::Result<T, PublishError>;

/// Publisher over one archive
pub struct Publisher<'a, A: RemoteArchive + ?Sized> {
    archive: &'a A,
    options: PublishOptions,
}

impl<'a, A: RemoteArchive + ?Sized> Publisher<'a, A> {
    /// Publisher over `archive`
    pub fn new(archive: &'a A, options: PublishOptions) -> Self {
        Self { archive, options }
    }

    /// Options in effect
    pub fn options(&self) -> &PublishOptions {
        &self.options
    }

    /// Upsert `document` as the entry for `date`
    pub async fn publish(
        &self,
        document: &BackupDocument,
        date: NaiveDate,
    ) -> PublishResult<PublishReceipt> {
        let path = backup_path(&self.options.directory, date);
        let content = document.to_json_pretty()?;

        let existing = match self.archive.get_file(&path).await {
            Ok(file) => Some(file.sha),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path, existing = existing.is_some(), "publishing backup");

        let message = format!("Backup {} ({} keys)", date.format("%Y-%m-%d"), document.len());
        let sha = self
            .archive
            .create_or_update_file(&path, &content, &message, existing.as_deref())
            .await?;

        info!(path = %path, sha = %sha, keys = document.len(), "published backup");
        Ok(PublishReceipt {
            path,
            sha,
            replaced: existing.is_some(),
            bytes: content.len(),
        })
    }

    /// Delete dated entries past the retention window as of `today`
    ///
    /// Only a failure to list the directory is returned as an error.
    pub async fn prune(&self, today: NaiveDate) -> PublishResult<PruneReport> {
        let entries = match self.archive.list_directory(&self.options.directory).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => {
                debug!(directory = %self.options.directory, "archive directory absent, nothing to prune");
                return Ok(PruneReport::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut report = PruneReport::default();
        for entry in entries {
            let Some(date) = parse_backup_date(&entry.name) else {
                report.ignored += 1;
                continue;
            };
            report.examined += 1;
            if !is_expired(date, today, self.options.retention_days) {
                continue;
            }

            let message = format!("Prune backup {}", entry.name);
            match self.archive.delete_file(&entry.path, &message, &entry.sha).await {
                Ok(()) => {
                    info!(path = %entry.path, "pruned old backup");
                    report.deleted.push(entry.path);
                }
                Err(e) => {
                    warn!(path = %entry.path, error = %e, "failed to prune old backup");
                    report.failed.push(entry.path);
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kvsnap_archive::MemoryArchive;
    use kvsnap_core::TypeTag;
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn doc(keys: &[&str]) -> BackupDocument {
        let mut doc = BackupDocument::new("test", chrono::Utc::now());
        for k in keys {
            doc.insert(*k, TypeTag::String, json!("v"));
        }
        doc
    }

    #[tokio::test]
    async fn test_publish_creates_then_replaces() {
        let archive = MemoryArchive::new();
        let publisher = Publisher::new(&archive, PublishOptions::default());
        let date = day("2026-10-19");

        let first = publisher.publish(&doc(&["a"]), date).await.unwrap();
        assert_eq!(first.path, "backups/backup-2026-10-19.json");
        assert!(!first.replaced);

        let second = publisher.publish(&doc(&["a", "b"]), date).await.unwrap();
        assert!(second.replaced);
        assert_ne!(first.sha, second.sha);

        let stored = archive.content(&second.path).unwrap();
        let parsed = kvsnap_core::parse_document(stored.as_bytes()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(archive.paths().len(), 1);
    }

    #[tokio::test]
    async fn test_publish_failure_is_an_error() {
        let archive = MemoryArchive::new();
        archive.set_offline(true);
        let publisher = Publisher::new(&archive, PublishOptions::default());
        let err = publisher
            .publish(&doc(&["a"]), day("2026-10-19"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Archive(ArchiveError::Http(_))));
    }

    #[tokio::test]
    async fn test_prune_without_directory() {
        let archive = MemoryArchive::new();
        let report = Publisher::new(&archive, PublishOptions::default())
            .prune(day("2026-10-19"))
            .await
            .unwrap();
        assert_eq!(report, PruneReport::default());
    }

    #[tokio::test]
    async fn test_prune_ignores_foreign_files() {
        let archive = MemoryArchive::new();
        archive.insert("backups/README.md", "notes");
        archive.insert("backups/backup-2020-01-01.json", "{}");
        let report = Publisher::new(&archive, PublishOptions::default())
            .prune(day("2026-10-19"))
            .await
            .unwrap();
        assert_eq!(report.ignored, 1);
        assert_eq!(report.deleted, vec!["backups/backup-2020-01-01.json".to_string()]);
        assert!(archive.content("backups/README.md").is_some());
    }

    #[tokio::test]
    async fn test_prune_continues_after_delete_failure() {
        let today = day("2026-10-19");
        let archive = MemoryArchive::new();
        let old: Vec<String> = [10, 11, 12]
            .iter()
            .map(|d| backup_path(BACKUP_DIRECTORY, today - Duration::days(*d)))
            .collect();
        for path in &old {
            archive.insert(path.clone(), "{}");
        }
        archive.fail_deletes_for(old[1].clone());

        let report = Publisher::new(&archive, PublishOptions::default())
            .prune(today)
            .await
            .unwrap();
        assert_eq!(report.deleted.len(), 2);
        assert_eq!(report.failed, vec![old[1].clone()]);
        assert!(report.has_failures());
        assert_eq!(archive.paths(), vec![old[1].clone()]);
    }

    #[tokio::test]
    async fn test_custom_retention_window() {
        let today = day("2026-10-19");
        let archive = MemoryArchive::new();
        archive.insert(backup_path(BACKUP_DIRECTORY, today - Duration::days(2)), "{}");
        let report = Publisher::new(&archive, PublishOptions::new().retention_days(1))
            .prune(today)
            .await
            .unwrap();
        assert_eq!(report.deleted.len(), 1);
    }

    #[tokio::test]
    async fn test_unbounded_retention_deletes_nothing() {
        let archive = MemoryArchive::new();
        archive.insert("backups/backup-2020-01-01.json", "{}");
        let report = Publisher::new(&archive, PublishOptions::new().retention_days(u32::MAX))
            .prune(day("2026-10-19"))
            .await
            .unwrap();
        assert_eq!(report.examined, 1);
        assert!(report.deleted.is_empty());
        assert_eq!(archive.paths().len(), 1);
    }
}
