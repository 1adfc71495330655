//! Parsing and validating untrusted Backup Documents
//!
//! Restore is destructive, so a document is checked structurally before it
//! is turned into a [`BackupDocument`]:
//!
//! 1. It is a JSON object
//! 2. It has a string `version` listed in [`SUPPORTED_VERSIONS`]
//! 3. It has a `keyManifest` array
//! 4. The remaining fields deserialize
//!
//! Per-key data is not inspected here; a malformed value fails its own key
//! during replay.

use crate::document::{BackupDocument, SUPPORTED_VERSIONS};
use crate::error::{ValidationError, ValidationResult};
use serde_json::Value;

/// Parse and validate raw document bytes
pub fn parse_document(bytes: &[u8]) -> ValidationResult<BackupDocument> {
    let value: Value = serde_json::from_slice(bytes)?;
    validate_value(value)
}

/// Validate an already-parsed JSON value
pub fn validate_value(value: Value) -> ValidationResult<BackupDocument> {
    let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

    let version = match obj.get("version") {
        Some(Value::String(v)) => v,
        _ => return Err(ValidationError::MissingVersion),
    };
    if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
        return Err(ValidationError::UnsupportedVersion {
            version: version.clone(),
            supported: SUPPORTED_VERSIONS.join(", "),
        });
    }

    if !matches!(obj.get("keyManifest"), Some(Value::Array(_))) {
        return Err(ValidationError::MissingManifest);
    }

    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_minimal_document() {
        let doc = validate_value(json!({"version": "1.0", "keyManifest": []})).unwrap();
        assert!(doc.is_empty());
        assert!(doc.simple_keys.is_empty());
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(matches!(
            parse_document(b"not json"),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_array() {
        assert!(matches!(
            validate_value(json!([])),
            Err(ValidationError::NotAnObject)
        ));
    }

    #[test]
    fn test_rejects_missing_or_numeric_version() {
        assert!(matches!(
            validate_value(json!({"keyManifest": []})),
            Err(ValidationError::MissingVersion)
        ));
        assert!(matches!(
            validate_value(json!({"version": 1, "keyManifest": []})),
            Err(ValidationError::MissingVersion)
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        match validate_value(json!({"version": "2.0", "keyManifest": []})) {
            Err(ValidationError::UnsupportedVersion { version, .. }) => assert_eq!(version, "2.0"),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_missing_manifest() {
        assert!(matches!(
            validate_value(json!({"version": "1.0", "keyManifest": {}})),
            Err(ValidationError::MissingManifest)
        ));
    }

    #[test]
    fn test_rejects_manifest_entry_without_key() {
        let err = validate_value(json!({
            "version": "1.0",
            "keyManifest": [{"type": "string"}],
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }
}
