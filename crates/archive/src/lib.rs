//! Remote archive access for kvsnap
//!
//! Published backups live in a versioned remote file store. This crate
//! provides:
//! - [`RemoteArchive`]: the capability interface the publisher and restore use
//! - [`GitHubArchive`]: a GitHub contents API backend
//! - [`MemoryArchive`]: an in-memory backend with fault injection

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod github;
pub mod memory;
pub mod traits;

pub use error::{ArchiveError, ArchiveResult};
pub use github::{GitHubArchive, GITHUB_API_BASE};
pub use memory::{CommitRecord, MemoryArchive};
pub use traits::{ArchiveEntry, ArchiveFile, RemoteArchive};
