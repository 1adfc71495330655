//! Value type tags
//!
//! Every key in the store holds exactly one of five value shapes. The tag is
//! how a Backup Document records which shape a key had, and how restore
//! decides which write sequence to issue.
//!
//! ## The Five Shapes
//!
//! | Tag | Shape | Container in the document |
//! |-----|-------|---------------------------|
//! | string | Scalar text | `simpleKeys` |
//! | hash | Field → value map | `hashKeys` |
//! | set | Unordered unique members | `setKeys` |
//! | zset | Members ordered by score | `sortedSetKeys` |
//! | list | Ordered items | `simpleKeys` (wrapped) |

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five value types a backup can carry
///
/// ## Invariant
///
/// This enum is closed. A type reported by the store that is not one of
/// these five is represented as [`StoreType::Unsupported`], never coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// Scalar string value
    String,
    /// Field map
    Hash,
    /// Unordered member set
    Set,
    /// Score-ordered member set
    ZSet,
    /// Ordered item list
    List,
}

impl TypeTag {
    /// All type tags, in the order reports print them
    pub const ALL: [TypeTag; 5] = [
        TypeTag::String,
        TypeTag::Hash,
        TypeTag::Set,
        TypeTag::ZSet,
        TypeTag::List,
    ];

    /// Wire identifier, as written in `keyManifest[].type`
    pub const fn id(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Hash => "hash",
            TypeTag::Set => "set",
            TypeTag::ZSet => "zset",
            TypeTag::List => "list",
        }
    }

    /// Parse from wire identifier
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "string" => Some(TypeTag::String),
            "hash" => Some(TypeTag::Hash),
            "set" => Some(TypeTag::Set),
            "zset" => Some(TypeTag::ZSet),
            "list" => Some(TypeTag::List),
            _ => None,
        }
    }

    /// Whether this is a collection type
    ///
    /// Collections are cleared before they are rewritten on restore, and an
    /// empty collection is never written.
    pub const fn is_collection(&self) -> bool {
        !matches!(self, TypeTag::String)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// What the store reports for a key's type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreType {
    /// One of the five supported shapes
    Tagged(TypeTag),
    /// The key does not exist (expired or deleted since enumeration)
    Missing,
    /// A type the backup format cannot carry (e.g. `stream`)
    Unsupported(String),
}

impl StoreType {
    /// Parse the store's type reply
    pub fn parse(reply: &str) -> Self {
        match reply {
            "none" => StoreType::Missing,
            other => match TypeTag::from_id(other) {
                Some(tag) => StoreType::Tagged(tag),
                None => StoreType::Unsupported(other.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_parse_back() {
        let mut seen = std::collections::HashSet::new();
        for tag in TypeTag::ALL {
            assert!(seen.insert(tag.id()));
            assert_eq!(TypeTag::from_id(tag.id()), Some(tag));
        }
    }

    #[test]
    fn test_serde_uses_wire_ids() {
        let json = serde_json::to_string(&TypeTag::ZSet).unwrap();
        assert_eq!(json, "\"zset\"");
        let tag: TypeTag = serde_json::from_str("\"list\"").unwrap();
        assert_eq!(tag, TypeTag::List);
    }

    #[test]
    fn test_store_type_parse() {
        assert_eq!(StoreType::parse("hash"), StoreType::Tagged(TypeTag::Hash));
        assert_eq!(StoreType::parse("none"), StoreType::Missing);
        assert_eq!(
            StoreType::parse("stream"),
            StoreType::Unsupported("stream".to_string())
        );
    }

    #[test]
    fn test_only_string_is_scalar() {
        assert!(!TypeTag::String.is_collection());
        assert!(TypeTag::ALL[1..].iter().all(|t| t.is_collection()));
    }
}
