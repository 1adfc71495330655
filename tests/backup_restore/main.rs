//! Backup/Restore Integration Tests
//!
//! End-to-end export, publish, prune and restore against the in-memory
//! store and archive.

#[path = "../common/mod.rs"]
mod common;

mod archive_fetch;
mod idempotence;
mod manifest;
mod partial_failure;
mod retention;
mod round_trip;
mod scenarios;
