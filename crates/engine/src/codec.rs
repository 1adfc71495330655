//! Type-Dispatch Codec
//!
//! Converts between a live store value and its portable document form, for
//! exactly the five [`TypeTag`]s. Both directions dispatch on the tag:
//!
//! | Tag | Read | Portable form | Restore writes |
//! |-----|------|---------------|----------------|
//! | string | `GET` | JSON string | `SET` |
//! | hash | `HGETALL` | `{field: value}` | `DEL`, `HSET` |
//! | set | `SMEMBERS` | `[member, ...]` | `DEL`, `SADD` |
//! | zset | `ZRANGE .. WITHSCORES` | `[member, score, ...]` | `DEL`, `ZADD` |
//! | list | `LRANGE 0 -1` | `{"_type": "list", "items": [...]}` | `DEL`, `RPUSH` |
//!
//! Collections are deleted before they are rewritten so that no stale
//! field, member or item from a previous value survives. An empty
//! collection is never written: the delete would leave the key gone with
//! nothing re-added.
//!
//! Sorted sets keep the order the store returns them in; the store, not
//! the codec, owns score order.

use kvsnap_core::{unwrap_list, wrap_list, ScoredMember, StoreValue, TypeTag};
use kvsnap_store::{KeyValueStore, StoreError, StoreResult};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why one key could not be restored
#[derive(Debug, Error)]
pub enum CodecError {
    /// Manifest type is not one of the five tags
    #[error("key {key:?}: unsupported type {kind:?}")]
    UnknownType {
        /// Key
        key: String,
        /// Type found in the manifest
        kind: String,
    },

    /// Manifest entry has no data in its container
    #[error("key {key:?}: no {tag} data in backup document")]
    MissingData {
        /// Key
        key: String,
        /// Manifest tag
        tag: TypeTag,
    },

    /// Portable value does not have the shape its tag requires
    #[error("key {key:?}: malformed {tag} value: {detail}")]
    Shape {
        /// Key
        key: String,
        /// Manifest tag
        tag: TypeTag,
        /// What was wrong
        detail: String,
    },

    /// A store write failed
    #[error("key {key:?}: {source}")]
    Store {
        /// Key
        key: String,
        /// Store failure
        #[source]
        source: StoreError,
    },
}

/// What a successful decode did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The key was written with this many elements (1 for a string)
    Written {
        /// Elements written
        elements: usize,
    },
    /// The collection was empty; the store was left untouched
    SkippedEmpty,
}

// ============================================================================
// Export direction
// ============================================================================

/// Read the full value at `key` with the read matching `tag`
///
/// Returns `None` if a string key vanished between enumeration and read.
pub async fn read<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    tag: TypeTag,
) -> StoreResult<Option<StoreValue>> {
    let value = match tag {
        TypeTag::String => match store.get_string(key).await? {
            Some(s) => StoreValue::String(s),
            None => return Ok(None),
        },
        TypeTag::Hash => StoreValue::Hash(store.get_all_hash_fields(key).await?),
        TypeTag::Set => StoreValue::Set(store.get_all_set_members(key).await?),
        TypeTag::ZSet => StoreValue::ZSet(store.get_sorted_set_range_with_scores(key).await?),
        TypeTag::List => StoreValue::List(store.get_full_list(key).await?),
    };
    Ok(Some(value))
}

/// Portable form of a store value
pub fn encode(value: &StoreValue) -> Value {
    match value {
        StoreValue::String(s) => Value::String(s.clone()),
        StoreValue::Hash(fields) => Value::Object(
            fields
                .iter()
                .map(|(f, v)| (f.clone(), Value::String(v.clone())))
                .collect::<Map<String, Value>>(),
        ),
        StoreValue::Set(members) => {
            Value::Array(members.iter().cloned().map(Value::String).collect())
        }
        StoreValue::ZSet(members) => {
            let mut flat = Vec::with_capacity(members.len() * 2);
            for m in members {
                flat.push(Value::String(m.member.clone()));
                flat.push(score_to_json(m.score));
            }
            Value::Array(flat)
        }
        StoreValue::List(items) => wrap_list(items.iter().cloned().map(Value::String).collect()),
    }
}

fn score_to_json(score: f64) -> Value {
    const EXACT_INT: f64 = 9_007_199_254_740_992.0; // 2^53
    if score.fract() == 0.0 && score.abs() < EXACT_INT {
        Value::Number(Number::from(score as i64))
    } else {
        match Number::from_f64(score) {
            Some(n) => Value::Number(n),
            // +inf / -inf have no JSON number form
            None => Value::String(kvsnap_core::format_score(score)),
        }
    }
}

// ============================================================================
// Restore direction
// ============================================================================

/// Parse a portable value into the store shape `tag` requires
///
/// Scalars written by older exporters may be JSON objects, numbers or
/// booleans rather than strings; those are restored as compact JSON text
/// with object keys in their document order.
pub fn parse_portable(key: &str, tag: TypeTag, portable: &Value) -> Result<StoreValue, CodecError> {
    let shape = |detail: String| CodecError::Shape {
        key: key.to_string(),
        tag,
        detail,
    };

    match tag {
        TypeTag::String => {
            if unwrap_list(portable).is_some() {
                return Err(shape("value is a list wrapper".to_string()));
            }
            scalar_text(portable)
                .map(StoreValue::String)
                .ok_or_else(|| shape(format!("expected a scalar, got {}", kind_of(portable))))
        }
        TypeTag::Hash => {
            let obj = portable
                .as_object()
                .ok_or_else(|| shape(format!("expected an object, got {}", kind_of(portable))))?;
            let mut fields = BTreeMap::new();
            for (field, v) in obj {
                let text = scalar_text(v)
                    .ok_or_else(|| shape(format!("field {field:?} is {}", kind_of(v))))?;
                fields.insert(field.clone(), text);
            }
            Ok(StoreValue::Hash(fields))
        }
        TypeTag::Set => {
            let items = portable
                .as_array()
                .ok_or_else(|| shape(format!("expected an array, got {}", kind_of(portable))))?;
            Ok(StoreValue::Set(texts(items).map_err(shape)?))
        }
        TypeTag::ZSet => {
            let flat = portable
                .as_array()
                .ok_or_else(|| shape(format!("expected an array, got {}", kind_of(portable))))?;
            if flat.len() % 2 != 0 {
                return Err(shape(format!(
                    "member/score array has odd length {}",
                    flat.len()
                )));
            }
            let mut members = Vec::with_capacity(flat.len() / 2);
            for pair in flat.chunks(2) {
                let member = scalar_text(&pair[0])
                    .ok_or_else(|| shape(format!("member is {}", kind_of(&pair[0]))))?;
                let score = json_to_score(&pair[1])
                    .ok_or_else(|| shape(format!("score for {member:?} is not a number")))?;
                members.push(ScoredMember { member, score });
            }
            Ok(StoreValue::ZSet(members))
        }
        TypeTag::List => {
            let items = unwrap_list(portable)
                .ok_or_else(|| shape("expected a {\"_type\": \"list\"} wrapper".to_string()))?;
            Ok(StoreValue::List(texts(items).map_err(shape)?))
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).ok(),
    }
}

fn texts(items: &[Value]) -> Result<Vec<String>, String> {
    items
        .iter()
        .enumerate()
        .map(|(i, v)| scalar_text(v).ok_or_else(|| format!("element {i} is {}", kind_of(v))))
        .collect()
}

fn json_to_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok().filter(|f: &f64| !f.is_nan()),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write `value` at `key`, replacing whatever was there
pub async fn write<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    value: &StoreValue,
) -> Result<DecodeOutcome, CodecError> {
    if value.is_empty() {
        return Ok(DecodeOutcome::SkippedEmpty);
    }

    let store_err = |source: StoreError| CodecError::Store {
        key: key.to_string(),
        source,
    };

    if value.tag().is_collection() {
        store.delete_key(key).await.map_err(store_err)?;
    }

    match value {
        StoreValue::String(s) => store.set_string(key, s).await,
        StoreValue::Hash(fields) => store.set_hash_fields(key, fields).await,
        StoreValue::Set(members) => store.add_set_members(key, members).await,
        StoreValue::ZSet(members) => store.add_sorted_set_members(key, members).await,
        StoreValue::List(items) => store.append_list_items(key, items).await,
    }
    .map_err(store_err)?;

    Ok(DecodeOutcome::Written {
        elements: value.len(),
    })
}

/// Restore one manifest entry
///
/// `kind` is the manifest's raw type string and `portable` the container
/// value found for the key, if any.
pub async fn decode<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    kind: &str,
    portable: Option<&Value>,
) -> Result<DecodeOutcome, CodecError> {
    let tag = TypeTag::from_id(kind).ok_or_else(|| CodecError::UnknownType {
        key: key.to_string(),
        kind: kind.to_string(),
    })?;
    let portable = portable.ok_or_else(|| CodecError::MissingData {
        key: key.to_string(),
        tag,
    })?;
    let value = parse_portable(key, tag, portable)?;
    write(store, key, &value).await
}
