//! Key-value store access for kvsnap
//!
//! This crate provides:
//! - [`KeyValueStore`]: the capability interface export and restore use
//! - [`RestStore`]: a client for Redis-compatible REST command endpoints
//! - [`MemoryStore`]: an in-memory store with fault injection
//! - [`AdvisoryLock`]: a TTL lock key that keeps runs from overlapping

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod lock;
pub mod memory;
pub mod rest;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use lock::{AdvisoryLock, LockOptions, DEFAULT_LOCK_KEY, DEFAULT_LOCK_TTL};
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use traits::{KeyValueStore, ScanPage, SCAN_START};
