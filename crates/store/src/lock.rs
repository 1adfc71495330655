//! Advisory run lock
//!
//! Backup and restore runs against the same store must not overlap. Each
//! run takes a well-known key with `SET NX` and a short TTL, so a crashed
//! run cannot wedge the store for longer than the TTL. Release deletes the
//! key only if it still holds this run's token.

use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Default lock key
pub const DEFAULT_LOCK_KEY: &str = "kvsnap:lock";

/// Default lock TTL
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(10 * 60);

/// Options for the advisory lock
#[derive(Debug, Clone)]
pub struct LockOptions {
    /// Key the lock lives at
    pub key: String,
    /// How long the lock survives a run that never releases it
    pub ttl: Duration,
}

impl LockOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different lock key
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Use a different TTL
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_LOCK_KEY.to_string(),
            ttl: DEFAULT_LOCK_TTL,
        }
    }
}

/// A held advisory lock
///
/// There is no async drop, so the holder must call [`release`](Self::release);
/// an unreleased lock expires after its TTL.
#[derive(Debug)]
#[must_use = "an advisory lock must be released"]
pub struct AdvisoryLock {
    key: String,
    token: String,
}

impl AdvisoryLock {
    /// Take the lock or fail with [`StoreError::LockHeld`]
    pub async fn acquire<S: KeyValueStore + ?Sized>(
        store: &S,
        options: &LockOptions,
    ) -> StoreResult<Self> {
        let token = Uuid::new_v4().to_string();
        if store.set_if_absent(&options.key, &token, options.ttl).await? {
            info!(key = %options.key, ttl_secs = options.ttl.as_secs(), "Acquired run lock");
            Ok(Self {
                key: options.key.clone(),
                token,
            })
        } else {
            Err(StoreError::LockHeld {
                key: options.key.clone(),
            })
        }
    }

    /// Lock key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Release the lock
    ///
    /// Returns `false` if the lock had already expired or been taken over.
    pub async fn release<S: KeyValueStore + ?Sized>(self, store: &S) -> StoreResult<bool> {
        let released = store.delete_if_equals(&self.key, &self.token).await?;
        if released {
            info!(key = %self.key, "Released run lock");
        } else {
            warn!(key = %self.key, "Run lock had expired before release");
        }
        Ok(released)
    }
}
