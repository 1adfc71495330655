//! Document validation errors

use thiserror::Error;

/// Why a Backup Document was refused
///
/// Every variant is raised before restore issues any write.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Not JSON, or JSON whose fields have the wrong shape
    #[error("malformed backup document: {0}")]
    Malformed(String),

    /// Top-level value is not an object
    #[error("backup document must be a JSON object")]
    NotAnObject,

    /// No string `version` field
    #[error("backup document has no version")]
    MissingVersion,

    /// `version` is not one this build can restore
    #[error("unsupported backup document version {version:?} (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the document
        version: String,
        /// Comma-separated supported versions
        supported: String,
    },

    /// No `keyManifest` array
    #[error("backup document has no keyManifest array")]
    MissingManifest,
}

impl From<serde_json::Error> for ValidationError {
    fn from(e: serde_json::Error) -> Self {
        ValidationError::Malformed(e.to_string())
    }
}

/// Result type for document validation
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
