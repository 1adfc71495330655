//! Core types for kvsnap
//!
//! This crate defines the data model shared by export and restore:
//! - [`TypeTag`]: the five value shapes a backup can carry
//! - [`StoreValue`]: a key's value in the store's native shape
//! - [`BackupDocument`]: the portable JSON artifact and its manifest
//! - [`naming`]: dated archive entry names and the retention rule
//! - [`validation`]: structural checks run before any restore write

#![warn(missing_docs)]

pub mod counts;
pub mod document;
pub mod error;
pub mod naming;
pub mod tag;
pub mod validation;
pub mod value;

pub use counts::TypeCounts;
pub use document::{
    unwrap_list, wrap_list, BackupDocument, ManifestAudit, ManifestEntry, DEFAULT_SOURCE,
    FORMAT_VERSION, SUPPORTED_VERSIONS,
};
pub use error::{ValidationError, ValidationResult};
pub use tag::{StoreType, TypeTag};
pub use validation::parse_document;
pub use value::{format_score, ScoredMember, StoreValue};
