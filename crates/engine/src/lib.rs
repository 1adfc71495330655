//! Backup and restore engine for kvsnap
//!
//! - [`codec`]: type-dispatched conversion between store values and their
//!   portable form
//! - [`export`]: key enumeration and document construction
//! - [`publish`]: dated archive entries and retention
//! - [`restore`]: source resolution, validation and ordered replay
//! - [`confirm`]: the gate in front of destructive writes
//!
//! The engine talks to the outside world only through the
//! [`KeyValueStore`](kvsnap_store::KeyValueStore) and
//! [`RemoteArchive`](kvsnap_archive::RemoteArchive) traits.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod confirm;
pub mod export;
pub mod publish;
pub mod restore;

pub use codec::{decode, encode, CodecError, DecodeOutcome};
pub use confirm::{AutoConfirm, Confirmation, Decline, RestorePlan};
pub use export::{
    Enumeration, EnumerationMethod, ExportError, ExportOptions, ExportReport, ExportResult,
    Exporter, DEFAULT_BATCH_SIZE, DEFAULT_MAX_SCAN_ITERATIONS, DEFAULT_SCAN_COUNT,
};
pub use publish::{
    PruneReport, PublishError, PublishOptions, PublishReceipt, PublishResult, Publisher,
    DEFAULT_RETENTION_DAYS,
};
pub use restore::{
    list_backups, replay, ArchiveListing, ArchiveSelector, BackupSource, LoadedDocument,
    RestoreError, RestoreFailure, RestoreLoader, RestoreOptions, RestoreOutcome, RestoreReport,
    RestoreResult,
};
