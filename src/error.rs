//! Unified error type for kvsnap.
//!
//! Wraps the per-crate errors so callers driving a whole backup or restore
//! can use one `Result`.

use thiserror::Error;

/// All kvsnap errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Store access failed
    #[error(transparent)]
    Store(#[from] kvsnap_store::StoreError),

    /// Archive access failed
    #[error(transparent)]
    Archive(#[from] kvsnap_archive::ArchiveError),

    /// A backup document failed validation
    #[error(transparent)]
    Validation(#[from] kvsnap_core::ValidationError),

    /// Key enumeration failed
    #[error(transparent)]
    Export(#[from] kvsnap_engine::ExportError),

    /// Publishing failed
    #[error(transparent)]
    Publish(#[from] kvsnap_engine::PublishError),

    /// Restore stopped before replay
    #[error(transparent)]
    Restore(#[from] kvsnap_engine::RestoreError),
}

/// Result type for kvsnap operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this is a missing archive entry or directory.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Archive(e) => e.is_not_found(),
            Error::Restore(kvsnap_engine::RestoreError::NotFound { .. }) => true,
            Error::Restore(kvsnap_engine::RestoreError::Archive(e)) => e.is_not_found(),
            _ => false,
        }
    }

    /// Whether another backup or restore holds the store lock.
    pub fn is_lock_held(&self) -> bool {
        matches!(
            self,
            Error::Store(kvsnap_store::StoreError::LockHeld { .. })
                | Error::Restore(kvsnap_engine::RestoreError::Lock(
                    kvsnap_store::StoreError::LockHeld { .. }
                ))
        )
    }
}
