//! # kvsnap
//!
//! Point-in-time backup and restore for Redis-compatible key-value stores,
//! with a dated archive kept in a Git repository.
//!
//! ## Quick Start
//!
//! ```ignore
//! use kvsnap::prelude::*;
//!
//! let store = RestStore::new(url, token)?;
//! let archive = GitHubArchive::new("acme/backups", gh_token)?;
//!
//! // Export and publish today's entry
//! let (doc, report) = Exporter::new(&store, ExportOptions::default())
//!     .export(chrono::Utc::now())
//!     .await?;
//! Publisher::new(&archive, PublishOptions::default())
//!     .publish(&doc, chrono::Utc::now().date_naive())
//!     .await?;
//!
//! // Restore the most recent entry
//! let outcome = RestoreLoader::new(&store, RestoreOptions::default())
//!     .with_archive(&archive)
//!     .run(&BackupSource::Archive(ArchiveSelector::Latest), &mut AutoConfirm)
//!     .await?;
//! ```
//!
//! ## Crates
//!
//! - [`model`] - type tags, the backup document, archive naming, validation
//! - [`store`] - the key-value store interface and its REST client
//! - [`archive`] - the remote archive interface and its GitHub client
//! - [`engine`] - codec, exporter, publisher and restore loader

#![warn(missing_docs)]

mod error;

pub mod prelude;

pub use error::{Error, Result};

pub use kvsnap_archive as archive;
pub use kvsnap_core as model;
pub use kvsnap_engine as engine;
pub use kvsnap_store as store;
