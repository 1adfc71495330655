//! Key Enumerator & Exporter
//!
//! Discovers every key in the store and builds a [`BackupDocument`].
//!
//! ## Enumeration
//!
//! 1. `KEYS *` in one call.
//! 2. If that is rejected, cursor scanning from [`SCAN_START`] until the
//!    cursor returns to it, deduplicating across pages. The scan stops at
//!    [`ExportOptions::max_scan_iterations`] pages; whatever was collected
//!    is used and the report marks the key set incomplete.
//!
//! Only when both methods fail outright is enumeration an error.
//!
//! ## Per-key export
//!
//! Keys are processed in batches of [`ExportOptions::batch_size`]. Each key
//! in a batch is read concurrently (`TYPE` then the full read for its tag);
//! the next batch starts only once the whole batch has resolved. A failed
//! read skips that key and is counted, it never aborts the run.

use crate::codec;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use kvsnap_core::{BackupDocument, StoreType, TypeCounts, TypeTag, DEFAULT_SOURCE};
use kvsnap_store::{KeyValueStore, StoreError, DEFAULT_LOCK_KEY, SCAN_START};
use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default number of keys read concurrently
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default `COUNT` hint per scan page
pub const DEFAULT_SCAN_COUNT: usize = 100;

/// Default cap on scan pages
pub const DEFAULT_MAX_SCAN_ITERATIONS: usize = 1000;

/// Export tuning
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Keys read concurrently per batch (at least 1)
    pub batch_size: usize,
    /// `COUNT` hint per scan page
    pub scan_count: usize,
    /// Scan pages fetched before giving up on the cursor
    pub max_scan_iterations: usize,
    /// Keys never exported
    pub exclude: BTreeSet<String>,
    /// `source` field of the document
    pub source: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            scan_count: DEFAULT_SCAN_COUNT,
            max_scan_iterations: DEFAULT_MAX_SCAN_ITERATIONS,
            exclude: BTreeSet::from([DEFAULT_LOCK_KEY.to_string()]),
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl ExportOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys read concurrently per batch
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// `COUNT` hint per scan page
    pub fn scan_count(mut self, scan_count: usize) -> Self {
        self.scan_count = scan_count.max(1);
        self
    }

    /// Scan pages fetched before giving up on the cursor
    pub fn max_scan_iterations(mut self, max: usize) -> Self {
        self.max_scan_iterations = max;
        self
    }

    /// Never export `key`
    pub fn exclude(mut self, key: impl Into<String>) -> Self {
        self.exclude.insert(key.into());
        self
    }

    /// `source` field of the document
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

/// How the key set was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationMethod {
    /// One `KEYS *` call
    KeyListing,
    /// Cursor scan
    Scan {
        /// Pages fetched
        pages: usize,
        /// Whether the cursor returned to its start
        complete: bool,
    },
}

impl EnumerationMethod {
    /// Whether every key was seen
    pub fn is_complete(&self) -> bool {
        match self {
            EnumerationMethod::KeyListing => true,
            EnumerationMethod::Scan { complete, .. } => *complete,
        }
    }
}

impl std::fmt::Display for EnumerationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnumerationMethod::KeyListing => write!(f, "key listing"),
            EnumerationMethod::Scan { pages, complete } => {
                write!(f, "scan, {} pages", pages)?;
                if !complete {
                    write!(f, ", incomplete")?;
                }
                Ok(())
            }
        }
    }
}

/// Keys found and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    /// Sorted, deduplicated keys, exclusions removed
    pub keys: Vec<String>,
    /// Method used
    pub method: EnumerationMethod,
}

/// Outcome of an export
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// How keys were enumerated
    pub method: EnumerationMethod,
    /// Keys enumerated
    pub keys_found: usize,
    /// Keys exported, per type
    pub exported: TypeCounts,
    /// Keys that vanished between enumeration and read
    pub missing: Vec<String>,
    /// Keys of a type no backup can carry, with that type
    pub unsupported: Vec<(String, String)>,
    /// Keys whose reads failed
    pub failed: Vec<String>,
}

impl ExportReport {
    /// Human-readable one-liner
    pub fn summary(&self) -> String {
        format!(
            "Export complete: {} of {} keys ({}), {} failed, {} unsupported, {} vanished ({})",
            self.exported.total(),
            self.keys_found,
            self.exported,
            self.failed.len(),
            self.unsupported.len(),
            self.missing.len(),
            self.method
        )
    }

    /// Whether any key was left out of the document
    pub fn has_issues(&self) -> bool {
        !self.failed.is_empty() || !self.unsupported.is_empty() || !self.method.is_complete()
    }
}

/// Export failures that abort the run
#[derive(Debug, Error)]
pub enum ExportError {
    /// Neither `KEYS` nor `SCAN` worked
    #[error("cannot enumerate keys: listing failed ({listing}), scan failed ({scan})")]
    Enumeration {
        /// `KEYS` failure
        listing: StoreError,
        /// First `SCAN` failure
        scan: StoreError,
    },
}

/// Result alias for export
pub type ExportResult<T> = std::result::Result<T, ExportError>;

enum KeyOutcome {
    Exported(TypeTag, Value),
    Missing,
    Unsupported(String),
    Failed(StoreError),
}

/// Exporter over one store
pub struct Exporter<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
    options: ExportOptions,
}

impl<'a, S: KeyValueStore + ?Sized> Exporter<'a, S> {
    /// Exporter over `store`
    pub fn new(store: &'a S, options: ExportOptions) -> Self {
        Self { store, options }
    }

    /// Options in effect
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Discover all keys
    pub async fn enumerate(&self) -> ExportResult<Enumeration> {
        let (found, method) = match self.store.list_all_keys().await {
            Ok(keys) => (keys, EnumerationMethod::KeyListing),
            Err(listing) => {
                warn!(error = %listing, "key listing rejected, falling back to scan");
                self.scan_all(listing).await?
            }
        };

        let keys: Vec<String> = found
            .into_iter()
            .filter(|k| !self.options.exclude.contains(k))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        info!(keys = keys.len(), method = %method, "enumerated keys");
        Ok(Enumeration { keys, method })
    }

    async fn scan_all(&self, listing: StoreError) -> ExportResult<(Vec<String>, EnumerationMethod)> {
        let mut seen = BTreeSet::new();
        let mut cursor = SCAN_START.to_string();
        let mut pages = 0;

        let complete = loop {
            if pages >= self.options.max_scan_iterations {
                warn!(
                    pages,
                    keys = seen.len(),
                    "scan cursor never returned to start, using keys collected so far"
                );
                break false;
            }
            match self.store.scan(&cursor, self.options.scan_count).await {
                Ok(page) => {
                    pages += 1;
                    debug!(page = pages, keys = page.keys.len(), cursor = %page.cursor, "scan page");
                    seen.extend(page.keys);
                    if page.cursor == SCAN_START {
                        break true;
                    }
                    cursor = page.cursor;
                }
                Err(scan) if pages == 0 => {
                    return Err(ExportError::Enumeration { listing, scan });
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        pages,
                        keys = seen.len(),
                        "scan failed part-way, using keys collected so far"
                    );
                    break false;
                }
            }
        };

        Ok((
            seen.into_iter().collect(),
            EnumerationMethod::Scan { pages, complete },
        ))
    }

    /// Enumerate and read every key into a document stamped `created_at`
    pub async fn export(
        &self,
        created_at: DateTime<Utc>,
    ) -> ExportResult<(BackupDocument, ExportReport)> {
        let enumeration = self.enumerate().await?;
        Ok(self.export_keys(enumeration, created_at).await)
    }

    /// Read already-enumerated keys into a document
    pub async fn export_keys(
        &self,
        enumeration: Enumeration,
        created_at: DateTime<Utc>,
    ) -> (BackupDocument, ExportReport) {
        let mut document = BackupDocument::new(self.options.source.clone(), created_at);
        let mut report = ExportReport {
            method: enumeration.method,
            keys_found: enumeration.keys.len(),
            exported: TypeCounts::default(),
            missing: Vec::new(),
            unsupported: Vec::new(),
            failed: Vec::new(),
        };

        if enumeration.keys.is_empty() {
            warn!("store has no keys, exporting an empty document");
            return (document, report);
        }

        let batch_size = self.options.batch_size.max(1);
        for (n, batch) in enumeration.keys.chunks(batch_size).enumerate() {
            debug!(batch = n + 1, size = batch.len(), "exporting batch");
            let outcomes = join_all(batch.iter().map(|key| self.export_key(key))).await;

            for (key, outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    KeyOutcome::Exported(tag, portable) => {
                        document.insert(key.clone(), tag, portable);
                        report.exported.increment(tag);
                    }
                    KeyOutcome::Missing => {
                        debug!(key = %key, "key vanished before it was read");
                        report.missing.push(key.clone());
                    }
                    KeyOutcome::Unsupported(kind) => {
                        warn!(key = %key, kind = %kind, "unsupported type, key left out of backup");
                        report.unsupported.push((key.clone(), kind));
                    }
                    KeyOutcome::Failed(e) => {
                        warn!(key = %key, error = %e, "failed to read key, skipping");
                        report.failed.push(key.clone());
                    }
                }
            }
        }

        for tag in TypeTag::ALL {
            info!(kind = %tag, count = report.exported.get(tag), "exported");
        }
        (document, report)
    }

    async fn export_key(&self, key: &str) -> KeyOutcome {
        let tag = match self.store.type_of(key).await {
            Ok(StoreType::Tagged(tag)) => tag,
            Ok(StoreType::Missing) => return KeyOutcome::Missing,
            Ok(StoreType::Unsupported(kind)) => return KeyOutcome::Unsupported(kind),
            Err(e) => return KeyOutcome::Failed(e),
        };
        match codec::read(self.store, key, tag).await {
            Ok(Some(value)) => KeyOutcome::Exported(tag, codec::encode(&value)),
            Ok(None) => KeyOutcome::Missing,
            Err(e) => KeyOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvsnap_core::{ScoredMember, StoreValue};
    use async_trait::async_trait;
    use kvsnap_store::{MemoryStore, ScanPage, StoreResult};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T03:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn seeded(n: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..n {
            store.insert(format!("k:{i:03}"), StoreValue::String(i.to_string()));
        }
        store
    }

    #[tokio::test]
    async fn test_enumerate_prefers_key_listing() {
        let store = seeded(3);
        let exporter = Exporter::new(&store, ExportOptions::default());
        let e = exporter.enumerate().await.unwrap();
        assert_eq!(e.method, EnumerationMethod::KeyListing);
        assert_eq!(e.keys.len(), 3);
    }

    #[tokio::test]
    async fn test_enumerate_falls_back_to_scan() {
        let store = seeded(25);
        store.disable_key_listing();
        let exporter = Exporter::new(&store, ExportOptions::new().scan_count(10));
        let e = exporter.enumerate().await.unwrap();
        assert_eq!(e.keys.len(), 25);
        assert_eq!(
            e.method,
            EnumerationMethod::Scan {
                pages: 3,
                complete: true
            }
        );
    }

    #[tokio::test]
    async fn test_runaway_scan_stops_at_cap() {
        let store = seeded(5);
        store.disable_key_listing();
        store.enable_endless_scan();
        let exporter = Exporter::new(
            &store,
            ExportOptions::new().scan_count(2).max_scan_iterations(7),
        );
        let e = exporter.enumerate().await.unwrap();
        assert_eq!(
            e.method,
            EnumerationMethod::Scan {
                pages: 7,
                complete: false
            }
        );
        assert!(!e.keys.is_empty());
    }

    #[tokio::test]
    async fn test_lock_key_is_excluded() {
        let store = seeded(2);
        store.insert(DEFAULT_LOCK_KEY, StoreValue::String("token".into()));
        let (doc, report) = Exporter::new(&store, ExportOptions::default())
            .export(now())
            .await
            .unwrap();
        assert_eq!(report.keys_found, 2);
        assert!(!doc.contains_key(DEFAULT_LOCK_KEY));
    }

    #[tokio::test]
    async fn test_read_failure_skips_only_that_key() {
        let store = seeded(12);
        store.fail_reads_for("k:004");
        let (doc, report) = Exporter::new(&store, ExportOptions::default())
            .export(now())
            .await
            .unwrap();
        assert_eq!(doc.len(), 11);
        assert_eq!(report.failed, vec!["k:004".to_string()]);
        assert!(report.has_issues());
    }

    #[tokio::test]
    async fn test_unsupported_type_is_left_out() {
        let store = seeded(1);
        store.insert_unsupported("events", "stream");
        let (doc, report) = Exporter::new(&store, ExportOptions::default())
            .export(now())
            .await
            .unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(
            report.unsupported,
            vec![("events".to_string(), "stream".to_string())]
        );
    }

    #[tokio::test]
    async fn test_export_encodes_each_type() {
        let store = MemoryStore::new();
        store.insert(
            "scores",
            StoreValue::ZSet(vec![ScoredMember::new("x", 1.0), ScoredMember::new("y", 2.0)]),
        );
        store.insert("log", StoreValue::List(vec!["e1".into(), "e2".into()]));

        let (doc, report) = Exporter::new(&store, ExportOptions::default())
            .export(now())
            .await
            .unwrap();
        assert_eq!(doc.sorted_set_keys["scores"], json!(["x", 1, "y", 2]));
        assert_eq!(
            doc.simple_keys["log"],
            json!({"_type": "list", "items": ["e1", "e2"]})
        );
        assert_eq!(report.exported.total(), 2);
        assert!(doc.audit_manifest().is_clean());
        assert_eq!(doc.created_at, "2026-10-19T03:00:00.000Z");
    }

    /// Counts `type_of` calls that are running at the same time
    struct InFlight {
        inner: MemoryStore,
        current: AtomicUsize,
        max: AtomicUsize,
    }

    impl InFlight {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                current: AtomicUsize::new(0),
                max: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for InFlight {
        async fn list_all_keys(&self) -> StoreResult<Vec<String>> {
            self.inner.list_all_keys().await
        }

        async fn scan(&self, cursor: &str, count: usize) -> StoreResult<ScanPage> {
            self.inner.scan(cursor, count).await
        }

        async fn type_of(&self, key: &str) -> StoreResult<StoreType> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let kind = self.inner.type_of(key).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            kind
        }

        async fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get_string(key).await
        }

        async fn get_all_hash_fields(&self, key: &str) -> StoreResult<BTreeMap<String, String>> {
            self.inner.get_all_hash_fields(key).await
        }

        async fn get_all_set_members(&self, key: &str) -> StoreResult<Vec<String>> {
            self.inner.get_all_set_members(key).await
        }

        async fn get_sorted_set_range_with_scores(
            &self,
            key: &str,
        ) -> StoreResult<Vec<ScoredMember>> {
            self.inner.get_sorted_set_range_with_scores(key).await
        }

        async fn get_full_list(&self, key: &str) -> StoreResult<Vec<String>> {
            self.inner.get_full_list(key).await
        }

        async fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
            self.inner.set_string(key, value).await
        }

        async fn delete_key(&self, key: &str) -> StoreResult<bool> {
            self.inner.delete_key(key).await
        }

        async fn set_hash_fields(
            &self,
            key: &str,
            fields: &BTreeMap<String, String>,
        ) -> StoreResult<()> {
            self.inner.set_hash_fields(key, fields).await
        }

        async fn add_set_members(&self, key: &str, members: &[String]) -> StoreResult<()> {
            self.inner.add_set_members(key, members).await
        }

        async fn add_sorted_set_members(
            &self,
            key: &str,
            members: &[ScoredMember],
        ) -> StoreResult<()> {
            self.inner.add_sorted_set_members(key, members).await
        }

        async fn append_list_items(&self, key: &str, items: &[String]) -> StoreResult<()> {
            self.inner.append_list_items(key, items).await
        }

        async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
            self.inner.set_if_absent(key, value, ttl).await
        }

        async fn delete_if_equals(&self, key: &str, expected: &str) -> StoreResult<bool> {
            self.inner.delete_if_equals(key, expected).await
        }
    }

    #[tokio::test]
    async fn test_batches_run_one_at_a_time() {
        let store = InFlight::new(seeded(35));
        let options = ExportOptions::new().batch_size(10);
        let (doc, report) = Exporter::new(&store, options).export(now()).await.unwrap();

        assert_eq!(store.max.load(Ordering::SeqCst), 10);
        assert_eq!(store.current.load(Ordering::SeqCst), 0);
        assert_eq!(report.exported.total(), 35);
        assert_eq!(doc.key_manifest.len(), 35);
    }

    #[tokio::test]
    async fn test_batch_size_bounds_concurrency() {
        let store = InFlight::new(seeded(9));
        let options = ExportOptions::new().batch_size(4);
        let (_, report) = Exporter::new(&store, options).export(now()).await.unwrap();

        assert_eq!(store.max.load(Ordering::SeqCst), 4);
        assert_eq!(report.exported.total(), 9);
    }

    #[tokio::test]
    async fn test_summary_mentions_counts() {
        let store = seeded(2);
        let (_, report) = Exporter::new(&store, ExportOptions::default())
            .export(now())
            .await
            .unwrap();
        let summary = report.summary();
        assert!(summary.contains("2 of 2 keys"));
        assert!(summary.contains("string=2"));
    }
}
