//! Convenient imports for kvsnap.
//!
//! ```ignore
//! use kvsnap::prelude::*;
//! ```

// Error handling
pub use crate::error::{Error, Result};

// Document model
pub use kvsnap_core::{BackupDocument, ManifestEntry, StoreValue, TypeCounts, TypeTag};

// Store and archive access
pub use kvsnap_archive::{GitHubArchive, MemoryArchive, RemoteArchive};
pub use kvsnap_store::{KeyValueStore, LockOptions, MemoryStore, RestStore};

// Engine
pub use kvsnap_engine::{
    ArchiveSelector, AutoConfirm, BackupSource, Confirmation, ExportOptions, Exporter,
    PublishOptions, Publisher, RestoreLoader, RestoreOptions, RestoreOutcome,
};
