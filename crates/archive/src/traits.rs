//! The remote archive capability interface
//!
//! A versioned file store in the style of a Git hosting contents API.
//! Every file carries a content-version handle (a SHA); updating or
//! deleting a file requires presenting the current handle.

use crate::error::ArchiveResult;
use async_trait::async_trait;

/// A file's content and its version handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    /// File content
    pub content: String,
    /// Content-version handle
    pub sha: String,
}

/// One directory listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File name
    pub name: String,
    /// Full path
    pub path: String,
    /// Content-version handle
    pub sha: String,
}

/// Capability interface over a versioned remote file store
#[async_trait]
pub trait RemoteArchive: Send + Sync {
    /// Read a file; [`ArchiveError::NotFound`] when absent
    ///
    /// [`ArchiveError::NotFound`]: crate::ArchiveError::NotFound
    async fn get_file(&self, path: &str) -> ArchiveResult<ArchiveFile>;

    /// Create a file (`sha` is `None`) or replace it (`sha` is its current handle)
    ///
    /// Returns the new handle.
    async fn create_or_update_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> ArchiveResult<String>;

    /// Delete a file at its current handle
    async fn delete_file(&self, path: &str, message: &str, sha: &str) -> ArchiveResult<()>;

    /// List a directory; [`ArchiveError::NotFound`] when it does not exist
    ///
    /// [`ArchiveError::NotFound`]: crate::ArchiveError::NotFound
    async fn list_directory(&self, path: &str) -> ArchiveResult<Vec<ArchiveEntry>>;
}
