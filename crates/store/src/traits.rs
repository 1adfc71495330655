//! The key-value store capability interface
//!
//! Export and restore only ever talk to the store through
//! [`KeyValueStore`]. Reads return whole values; writes are the primitive
//! operations the codec composes into delete-then-write sequences.

use crate::error::StoreResult;
use async_trait::async_trait;
use kvsnap_core::{ScoredMember, StoreType};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Cursor value that starts a scan and marks its end
pub const SCAN_START: &str = "0";

/// One page of a cursor scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage {
    /// Cursor for the next page; [`SCAN_START`] when the scan is complete
    pub cursor: String,
    /// Keys on this page (may repeat keys from earlier pages)
    pub keys: Vec<String>,
}

/// Capability interface over a Redis-compatible store
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; export issues a batch of reads
/// concurrently against one shared store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Every key in one call
    ///
    /// Stores that refuse full listings return [`StoreError::Unsupported`]
    /// or a command error; callers then fall back to [`scan`](Self::scan).
    ///
    /// [`StoreError::Unsupported`]: crate::StoreError::Unsupported
    async fn list_all_keys(&self) -> StoreResult<Vec<String>>;

    /// One page of an incremental scan
    async fn scan(&self, cursor: &str, count: usize) -> StoreResult<ScanPage>;

    /// The type of the value held at `key`
    async fn type_of(&self, key: &str) -> StoreResult<StoreType>;

    /// Read a string; `None` if the key vanished
    async fn get_string(&self, key: &str) -> StoreResult<Option<String>>;

    /// Read every field of a hash
    async fn get_all_hash_fields(&self, key: &str) -> StoreResult<BTreeMap<String, String>>;

    /// Read every member of a set
    async fn get_all_set_members(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Read every member of a sorted set with scores, ascending by score
    async fn get_sorted_set_range_with_scores(&self, key: &str) -> StoreResult<Vec<ScoredMember>>;

    /// Read a whole list in order
    async fn get_full_list(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Overwrite `key` with a string
    async fn set_string(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`; returns whether it existed
    async fn delete_key(&self, key: &str) -> StoreResult<bool>;

    /// Set hash fields (merges into an existing hash)
    async fn set_hash_fields(&self, key: &str, fields: &BTreeMap<String, String>)
        -> StoreResult<()>;

    /// Add set members
    async fn add_set_members(&self, key: &str, members: &[String]) -> StoreResult<()>;

    /// Add sorted-set members with scores
    async fn add_sorted_set_members(&self, key: &str, members: &[ScoredMember])
        -> StoreResult<()>;

    /// Append items to the tail of a list
    async fn append_list_items(&self, key: &str, items: &[String]) -> StoreResult<()>;

    /// Set `key` to `value` with a TTL only if it does not exist
    ///
    /// Returns whether the value was set.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool>;

    /// Delete `key` only if it currently holds `expected`
    ///
    /// Returns whether the key was deleted.
    async fn delete_if_equals(&self, key: &str, expected: &str) -> StoreResult<bool>;
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    async fn list_all_keys(&self) -> StoreResult<Vec<String>> {
        (**self).list_all_keys().await
    }

    async fn scan(&self, cursor: &str, count: usize) -> StoreResult<ScanPage> {
        (**self).scan(cursor, count).await
    }

    async fn type_of(&self, key: &str) -> StoreResult<StoreType> {
        (**self).type_of(key).await
    }

    async fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_string(key).await
    }

    async fn get_all_hash_fields(&self, key: &str) -> StoreResult<BTreeMap<String, String>> {
        (**self).get_all_hash_fields(key).await
    }

    async fn get_all_set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        (**self).get_all_set_members(key).await
    }

    async fn get_sorted_set_range_with_scores(&self, key: &str) -> StoreResult<Vec<ScoredMember>> {
        (**self).get_sorted_set_range_with_scores(key).await
    }

    async fn get_full_list(&self, key: &str) -> StoreResult<Vec<String>> {
        (**self).get_full_list(key).await
    }

    async fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_string(key, value).await
    }

    async fn delete_key(&self, key: &str) -> StoreResult<bool> {
        (**self).delete_key(key).await
    }

    async fn set_hash_fields(
        &self,
        key: &str,
        fields: &BTreeMap<String, String>,
    ) -> StoreResult<()> {
        (**self).set_hash_fields(key, fields).await
    }

    async fn add_set_members(&self, key: &str, members: &[String]) -> StoreResult<()> {
        (**self).add_set_members(key, members).await
    }

    async fn add_sorted_set_members(
        &self,
        key: &str,
        members: &[ScoredMember],
    ) -> StoreResult<()> {
        (**self).add_sorted_set_members(key, members).await
    }

    async fn append_list_items(&self, key: &str, items: &[String]) -> StoreResult<()> {
        (**self).append_list_items(key, items).await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        (**self).set_if_absent(key, value, ttl).await
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> StoreResult<bool> {
        (**self).delete_if_equals(key, expected).await
    }
}
