//! Restore Loader
//!
//! Rebuilds store state from a [`BackupDocument`]. A restore moves through
//! fixed phases and performs no write before the last gate has passed:
//!
//! | Phase | Failure |
//! |-------|---------|
//! | Resolve source (file, dated entry or latest entry) | fatal |
//! | Validate (`version`, `keyManifest`) | fatal |
//! | Confirm | clean decline, no writes |
//! | Acquire advisory lock | fatal |
//! | Replay manifest in order | per key, counted |
//! | Release lock, report | logged |
//!
//! Replay is strictly sequential in manifest order. Keys that fail are
//! counted and reported; successful writes are never rolled back.

use crate::codec::{self, DecodeOutcome};
use crate::confirm::{Confirmation, RestorePlan};
use chrono::NaiveDate;
use kvsnap_archive::{ArchiveError, RemoteArchive};
use kvsnap_core::naming::{backup_path, parse_backup_date, BACKUP_DIRECTORY};
use kvsnap_core::{parse_document, BackupDocument, TypeCounts, ValidationError};
use kvsnap_store::{AdvisoryLock, KeyValueStore, LockOptions, StoreError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Which archive entry to restore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveSelector {
    /// The most recent dated entry
    Latest,
    /// The entry for one date
    Date(NaiveDate),
}

/// Where the document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupSource {
    /// A document on local disk
    LocalFile(PathBuf),
    /// A published archive entry
    Archive(ArchiveSelector),
}

/// A dated archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveListing {
    /// Date in the file name
    pub date: NaiveDate,
    /// Archive path
    pub path: String,
}

/// A resolved and validated document
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// File path or archive path
    pub origin: String,
    /// The document
    pub document: BackupDocument,
}

/// Restore settings
#[derive(Debug, Clone)]
pub struct RestoreOptions {
    /// Archive directory holding the dated entries
    pub directory: String,
    /// Advisory lock to hold during replay, if any
    pub lock: Option<LockOptions>,
    /// Resolve, validate and plan without writing
    pub dry_run: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        RestoreOptions {
            directory: BACKUP_DIRECTORY.to_string(),
            lock: Some(LockOptions::default()),
            dry_run: false,
        }
    }
}

impl RestoreOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive directory
    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Lock to hold during replay; `None` disables locking
    pub fn lock(mut self, lock: Option<LockOptions>) -> Self {
        self.lock = lock;
        self
    }

    /// Stop after planning
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// One key that could not be restored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreFailure {
    /// Key
    pub key: String,
    /// Why
    pub reason: String,
}

/// Outcome of a replay
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    /// Manifest entries processed
    pub total: usize,
    /// Keys written, per type
    pub restored: TypeCounts,
    /// Empty collections left untouched
    pub skipped_empty: usize,
    /// Keys that failed, in manifest order
    pub failures: Vec<RestoreFailure>,
}

impl RestoreReport {
    /// Number of failed keys
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Whether any key failed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Human-readable one-liner
    pub fn summary(&self) -> String {
        format!(
            "Restore complete: {} of {} keys ({}), {} failed, {} empty skipped",
            self.restored.total(),
            self.total,
            self.restored,
            self.failed(),
            self.skipped_empty
        )
    }
}

/// How a restore ended
#[derive(Debug, Clone)]
pub enum RestoreOutcome {
    /// Dry run; nothing written
    Planned(RestorePlan),
    /// The operator declined; nothing written
    Declined(RestorePlan),
    /// Replay ran
    Completed {
        /// What was shown before replay
        plan: RestorePlan,
        /// What happened
        report: RestoreReport,
    },
}

/// Restore failures that stop the run before replay
#[derive(Debug, Error)]
pub enum RestoreError {
    /// A local document could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Cause
        #[source]
        source: std::io::Error,
    },

    /// The document failed validation
    #[error("invalid backup document {origin}: {source}")]
    Validation {
        /// File or archive path
        origin: String,
        /// Cause
        #[source]
        source: ValidationError,
    },

    /// The requested archive entry does not exist
    #[error("backup not found: {path}")]
    NotFound {
        /// Archive path
        path: String,
    },

    /// The archive holds no dated entries
    #[error("no backups in archive directory {directory}")]
    NoBackups {
        /// Archive directory
        directory: String,
    },

    /// An archive source was requested without an archive
    #[error("archive source requested but no archive is configured")]
    ArchiveUnavailable,

    /// Archive request failed
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// The advisory lock could not be taken
    #[error("cannot lock store: {0}")]
    Lock(#[source] StoreError),
}

/// Result alias for restore
pub type RestoreResult<T> = std::result::Result<T, RestoreError>;

/// Restore loader over one store and, optionally, an archive
pub struct RestoreLoader<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
    archive: Option<&'a dyn RemoteArchive>,
    options: RestoreOptions,
}

impl<'a, S: KeyValueStore + ?Sized> RestoreLoader<'a, S> {
    /// Loader writing into `store`
    pub fn new(store: &'a S, options: RestoreOptions) -> Self {
        Self {
            store,
            archive: None,
            options,
        }
    }

    /// Allow archive sources
    pub fn with_archive(mut self, archive: &'a dyn RemoteArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Options in effect
    pub fn options(&self) -> &RestoreOptions {
        &self.options
    }

    fn archive(&self) -> RestoreResult<&'a dyn RemoteArchive> {
        self.archive.ok_or(RestoreError::ArchiveUnavailable)
    }

    /// Dated archive entries, newest first
    pub async fn list_backups(&self) -> RestoreResult<Vec<ArchiveListing>> {
        list_backups(self.archive()?, &self.options.directory).await
    }

    /// Fetch or read the document and validate it
    pub async fn resolve(&self, source: &BackupSource) -> RestoreResult<LoadedDocument> {
        let (origin, bytes) = match source {
            BackupSource::LocalFile(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| RestoreError::Io {
                    path: path.clone(),
                    source,
                })?;
                (path.display().to_string(), bytes)
            }
            BackupSource::Archive(ArchiveSelector::Latest) => {
                let latest = self.list_backups().await?.into_iter().next().ok_or_else(|| {
                    RestoreError::NoBackups {
                        directory: self.options.directory.clone(),
                    }
                })?;
                info!(path = %latest.path, "latest backup");
                self.fetch(latest.path).await?
            }
            BackupSource::Archive(ArchiveSelector::Date(date)) => {
                self.fetch(backup_path(&self.options.directory, *date)).await?
            }
        };

        let document = parse_document(&bytes).map_err(|source| RestoreError::Validation {
            origin: origin.clone(),
            source,
        })?;
        info!(origin = %origin, keys = document.len(), version = %document.version, "loaded backup");

        let audit = document.audit_manifest();
        if !audit.is_clean() {
            for key in &audit.duplicates {
                warn!(key = %key, "key listed more than once in manifest");
            }
            for entry in &audit.missing_data {
                warn!(key = %entry.key, kind = %entry.kind, "manifest entry has no data");
            }
            for entry in &audit.unknown_types {
                warn!(key = %entry.key, kind = %entry.kind, "manifest entry has unsupported type");
            }
            for key in &audit.unlisted {
                warn!(key = %key, "data not listed in manifest, will not be restored");
            }
        }

        Ok(LoadedDocument { origin, document })
    }

    async fn fetch(&self, path: String) -> RestoreResult<(String, Vec<u8>)> {
        match self.archive()?.get_file(&path).await {
            Ok(file) => Ok((path, file.content.into_bytes())),
            Err(e) if e.is_not_found() => Err(RestoreError::NotFound { path }),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve, validate, confirm and replay
    pub async fn run(
        &self,
        source: &BackupSource,
        confirmation: &mut dyn Confirmation,
    ) -> RestoreResult<RestoreOutcome> {
        let loaded = self.resolve(source).await?;
        let plan = RestorePlan::new(loaded.origin, &loaded.document);

        if self.options.dry_run {
            info!("dry run, no keys written");
            return Ok(RestoreOutcome::Planned(plan));
        }
        if !confirmation.confirm(&plan) {
            info!("restore declined, no keys written");
            return Ok(RestoreOutcome::Declined(plan));
        }

        let lock = match &self.options.lock {
            Some(options) => Some(
                AdvisoryLock::acquire(self.store, options)
                    .await
                    .map_err(RestoreError::Lock)?,
            ),
            None => None,
        };

        let report = replay(self.store, &loaded.document).await;

        if let Some(lock) = lock {
            match lock.release(self.store).await {
                Ok(true) => debug!("released store lock"),
                Ok(false) => warn!("store lock expired during restore"),
                Err(e) => warn!(error = %e, "failed to release store lock"),
            }
        }

        Ok(RestoreOutcome::Completed { plan, report })
    }
}

/// Dated entries under `directory`, newest first
///
/// A missing directory yields an empty list. Files whose names are not
/// `backup-YYYY-MM-DD.json` are ignored.
pub async fn list_backups(
    archive: &dyn RemoteArchive,
    directory: &str,
) -> RestoreResult<Vec<ArchiveListing>> {
    let entries = match archive.list_directory(directory).await {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut listings: Vec<ArchiveListing> = entries
        .into_iter()
        .filter_map(|e| parse_backup_date(&e.name).map(|date| ArchiveListing { date, path: e.path }))
        .collect();
    listings.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(listings)
}

/// Replay every manifest entry of `document` into `store`, in order
pub async fn replay<S: KeyValueStore + ?Sized>(store: &S, document: &BackupDocument) -> RestoreReport {
    let total = document.key_manifest.len();
    let mut report = RestoreReport {
        total,
        ..RestoreReport::default()
    };

    for (i, entry) in document.key_manifest.iter().enumerate() {
        let tag = entry.tag();
        let portable = tag.and_then(|t| document.portable(&entry.key, t));

        match codec::decode(store, &entry.key, &entry.kind, portable).await {
            Ok(DecodeOutcome::Written { elements }) => {
                if let Some(tag) = tag {
                    report.restored.increment(tag);
                }
                info!(
                    step = %format_args!("{}/{}", i + 1, total),
                    key = %entry.key,
                    kind = %entry.kind,
                    elements,
                    "restored"
                );
            }
            Ok(DecodeOutcome::SkippedEmpty) => {
                report.skipped_empty += 1;
                info!(
                    step = %format_args!("{}/{}", i + 1, total),
                    key = %entry.key,
                    kind = %entry.kind,
                    "skipped empty collection"
                );
            }
            Err(e) => {
                error!(
                    step = %format_args!("{}/{}", i + 1, total),
                    key = %entry.key,
                    kind = %entry.kind,
                    error = %e,
                    "restore failed"
                );
                report.failures.push(RestoreFailure {
                    key: entry.key.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!("{}", report.summary());
    report
}
