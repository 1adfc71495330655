//! Backup Document
//!
//! The single portable artifact capturing full store state at one point in
//! time. Serialized as UTF-8 JSON:
//!
//! ```text
//! {
//!   "version": "1.0",
//!   "createdAt": "2026-10-19T03:00:00.000Z",
//!   "source": "upstash-redis",
//!   "simpleKeys":    { "greeting": "hi", "log": { "_type": "list", "items": ["e1", "e2"] } },
//!   "hashKeys":      { "user:1": { "name": "Ann", "age": "30" } },
//!   "setKeys":       { "tags": ["a", "b"] },
//!   "sortedSetKeys": { "scores": ["x", 1, "y", 2] },
//!   "keyManifest":   [ { "key": "greeting", "type": "string" }, ... ]
//! }
//! ```
//!
//! ## Manifest
//!
//! `keyManifest` is authoritative. Restore walks it in order and only reads
//! the containers to look up each entry's data; container entries with no
//! manifest entry are never restored.
//!
//! Container values are kept as raw JSON so that one malformed key fails on
//! its own during restore instead of making the whole document unreadable.

use crate::counts::TypeCounts;
use crate::tag::TypeTag;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Document format version written by this exporter
pub const FORMAT_VERSION: &str = "1.0";

/// Document versions restore accepts
pub const SUPPORTED_VERSIONS: &[&str] = &[FORMAT_VERSION];

/// Default provenance tag
pub const DEFAULT_SOURCE: &str = "upstash-redis";

/// Marker field of the list wrapper stored in `simpleKeys`
pub const LIST_WRAPPER_TYPE_FIELD: &str = "_type";

/// Items field of the list wrapper stored in `simpleKeys`
pub const LIST_WRAPPER_ITEMS_FIELD: &str = "items";

/// One `keyManifest` entry
///
/// The type is kept as the raw string so a document carrying a tag this
/// build does not know still parses; such entries fail individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Store key
    pub key: String,
    /// Type identifier
    #[serde(rename = "type")]
    pub kind: String,
}

impl ManifestEntry {
    /// Create an entry for a known tag
    pub fn new(key: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            key: key.into(),
            kind: tag.id().to_string(),
        }
    }

    /// The entry's tag, if it is one of the five supported
    pub fn tag(&self) -> Option<TypeTag> {
        TypeTag::from_id(&self.kind)
    }
}

/// Full store state, partitioned by type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    /// Format version
    pub version: String,
    /// Export time, ISO-8601
    #[serde(default)]
    pub created_at: String,
    /// Provenance tag
    #[serde(default)]
    pub source: String,
    /// Strings, plus lists in their `{ "_type": "list", "items": [...] }` wrapper
    #[serde(default)]
    pub simple_keys: BTreeMap<String, Value>,
    /// Hashes as field → value objects
    #[serde(default)]
    pub hash_keys: BTreeMap<String, Value>,
    /// Sets as member arrays
    #[serde(default)]
    pub set_keys: BTreeMap<String, Value>,
    /// Sorted sets as alternating member, score arrays
    #[serde(default)]
    pub sorted_set_keys: BTreeMap<String, Value>,
    /// Restore order
    pub key_manifest: Vec<ManifestEntry>,
}

impl BackupDocument {
    /// Create an empty document stamped with `created_at`
    pub fn new(source: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            source: source.into(),
            simple_keys: BTreeMap::new(),
            hash_keys: BTreeMap::new(),
            set_keys: BTreeMap::new(),
            sorted_set_keys: BTreeMap::new(),
            key_manifest: Vec::new(),
        }
    }

    /// Add a key's portable value and its manifest entry
    ///
    /// Returns `false` and changes nothing if the key is already present.
    pub fn insert(&mut self, key: impl Into<String>, tag: TypeTag, portable: Value) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.container_mut(tag).insert(key.clone(), portable);
        self.key_manifest.push(ManifestEntry::new(key, tag));
        true
    }

    /// Whether any container holds `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.simple_keys.contains_key(key)
            || self.hash_keys.contains_key(key)
            || self.set_keys.contains_key(key)
            || self.sorted_set_keys.contains_key(key)
    }

    /// The stored portable value for `key` under `tag`'s container
    ///
    /// Strings and lists share `simpleKeys`, so a hit there does not by
    /// itself mean the value has the shape `tag` expects.
    pub fn portable(&self, key: &str, tag: TypeTag) -> Option<&Value> {
        self.container(tag).get(key)
    }

    fn container(&self, tag: TypeTag) -> &BTreeMap<String, Value> {
        match tag {
            TypeTag::String | TypeTag::List => &self.simple_keys,
            TypeTag::Hash => &self.hash_keys,
            TypeTag::Set => &self.set_keys,
            TypeTag::ZSet => &self.sorted_set_keys,
        }
    }

    fn container_mut(&mut self, tag: TypeTag) -> &mut BTreeMap<String, Value> {
        match tag {
            TypeTag::String | TypeTag::List => &mut self.simple_keys,
            TypeTag::Hash => &mut self.hash_keys,
            TypeTag::Set => &mut self.set_keys,
            TypeTag::ZSet => &mut self.sorted_set_keys,
        }
    }

    /// Number of manifest entries
    pub fn len(&self) -> usize {
        self.key_manifest.len()
    }

    /// Whether the manifest is empty
    pub fn is_empty(&self) -> bool {
        self.key_manifest.is_empty()
    }

    /// Manifest entries per type; entries with unknown tags are not counted
    pub fn counts(&self) -> TypeCounts {
        let mut counts = TypeCounts::default();
        for tag in self.key_manifest.iter().filter_map(ManifestEntry::tag) {
            counts.increment(tag);
        }
        counts
    }

    /// Parsed `createdAt`, if it is valid RFC 3339
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Cross-check the manifest against the containers
    pub fn audit_manifest(&self) -> ManifestAudit {
        let mut audit = ManifestAudit::default();
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        let mut listed: HashSet<(&str, ContainerId)> = HashSet::new();

        for entry in &self.key_manifest {
            *occurrences.entry(entry.key.as_str()).or_default() += 1;
            match entry.tag() {
                Some(tag) => {
                    listed.insert((entry.key.as_str(), ContainerId::of(tag)));
                    if self.portable(&entry.key, tag).is_none() {
                        audit.missing_data.push(entry.clone());
                    }
                }
                None => audit.unknown_types.push(entry.clone()),
            }
        }

        for entry in &self.key_manifest {
            if occurrences.get(entry.key.as_str()).copied().unwrap_or(0) > 1
                && !audit.duplicates.contains(&entry.key)
            {
                audit.duplicates.push(entry.key.clone());
            }
        }

        let containers = [
            (ContainerId::Simple, &self.simple_keys),
            (ContainerId::Hash, &self.hash_keys),
            (ContainerId::Set, &self.set_keys),
            (ContainerId::SortedSet, &self.sorted_set_keys),
        ];
        for (id, container) in containers {
            for key in container.keys() {
                if !listed.contains(&(key.as_str(), id)) {
                    audit.unlisted.push(key.clone());
                }
            }
        }

        audit
    }

    /// Pretty-printed JSON, as published
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ContainerId {
    Simple,
    Hash,
    Set,
    SortedSet,
}

impl ContainerId {
    fn of(tag: TypeTag) -> Self {
        match tag {
            TypeTag::String | TypeTag::List => ContainerId::Simple,
            TypeTag::Hash => ContainerId::Hash,
            TypeTag::Set => ContainerId::Set,
            TypeTag::ZSet => ContainerId::SortedSet,
        }
    }
}

/// Result of [`BackupDocument::audit_manifest`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestAudit {
    /// Keys listed more than once
    pub duplicates: Vec<String>,
    /// Manifest entries whose container has no value for the key
    pub missing_data: Vec<ManifestEntry>,
    /// Manifest entries with a type this build does not know
    pub unknown_types: Vec<ManifestEntry>,
    /// Container keys no manifest entry refers to
    pub unlisted: Vec<String>,
}

impl ManifestAudit {
    /// No findings
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
            && self.missing_data.is_empty()
            && self.unknown_types.is_empty()
            && self.unlisted.is_empty()
    }
}

/// Wrap list items the way `simpleKeys` stores a list
pub fn wrap_list(items: Vec<Value>) -> Value {
    json!({
        LIST_WRAPPER_TYPE_FIELD: TypeTag::List.id(),
        LIST_WRAPPER_ITEMS_FIELD: items,
    })
}

/// Items of a list wrapper, or `None` if `value` is not one
pub fn unwrap_list(value: &Value) -> Option<&Vec<Value>> {
    let obj = value.as_object()?;
    match obj.get(LIST_WRAPPER_TYPE_FIELD) {
        Some(Value::String(t)) if t == TypeTag::List.id() => {
            obj.get(LIST_WRAPPER_ITEMS_FIELD)?.as_array()
        }
        _ => None,
    }
}
