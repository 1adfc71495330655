//! Archive error types

use thiserror::Error;

/// Errors from a remote archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No file or directory at the path
    #[error("not found in archive: {path}")]
    NotFound {
        /// Requested path
        path: String,
    },

    /// Credentials missing, invalid or lacking permission
    #[error("archive rejected credentials (HTTP {status}): {message}")]
    Unauthorized {
        /// HTTP status
        status: u16,
        /// Server message
        message: String,
    },

    /// Write lost a race: the content handle no longer matches
    #[error("archive write conflict at {path}")]
    Conflict {
        /// Path written
        path: String,
    },

    /// Transport failure
    #[error("archive request failed: {0}")]
    Http(String),

    /// Any other non-success status
    #[error("archive returned HTTP {status}: {message}")]
    Status {
        /// HTTP status
        status: u16,
        /// Server message
        message: String,
    },

    /// Response body could not be understood
    #[error("archive response could not be decoded: {0}")]
    Decode(String),
}

impl ArchiveError {
    /// Whether this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::NotFound { .. })
    }
}

impl From<reqwest::Error> for ArchiveError {
    fn from(e: reqwest::Error) -> Self {
        ArchiveError::Http(e.to_string())
    }
}

/// Result type for archive operations
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;
