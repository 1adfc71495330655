//! Store error types

use thiserror::Error;

/// Errors from a key-value store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure (connect, TLS, timeout)
    #[error("store request failed: {0}")]
    Http(String),

    /// Credentials rejected
    #[error("store rejected credentials (HTTP {status})")]
    Unauthorized {
        /// HTTP status
        status: u16,
    },

    /// The store answered a command with an error reply
    #[error("{command} failed: {message}")]
    Command {
        /// Command name
        command: String,
        /// Error reply
        message: String,
    },

    /// The command is not available on this store (e.g. `KEYS` disabled)
    #[error("{command} is not supported by this store")]
    Unsupported {
        /// Command name
        command: String,
    },

    /// Operation against a key holding a different type
    #[error("WRONGTYPE key {key:?} holds a different kind of value")]
    WrongType {
        /// Key
        key: String,
    },

    /// Reply did not have the expected shape
    #[error("unexpected reply to {command}: {detail}")]
    Protocol {
        /// Command name
        command: String,
        /// What was wrong
        detail: String,
    },

    /// Another run holds the advisory lock
    #[error("another backup or restore run holds lock {key:?}")]
    LockHeld {
        /// Lock key
        key: String,
    },
}

impl StoreError {
    /// Build a protocol error
    pub fn protocol(command: impl Into<String>, detail: impl Into<String>) -> Self {
        StoreError::Protocol {
            command: command.into(),
            detail: detail.into(),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Http(e.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
