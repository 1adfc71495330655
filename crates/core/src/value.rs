//! Native store values
//!
//! [`StoreValue`] is a key's value in the shape the store hands it out and
//! takes it back, before any document encoding is applied.

use crate::tag::TypeTag;
use std::collections::BTreeMap;

/// A sorted-set member with its score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    /// Member name
    pub member: String,
    /// Score
    pub score: f64,
}

impl ScoredMember {
    /// Create a scored member
    pub fn new(member: impl Into<String>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

/// A key's full value in one of the five supported shapes
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    /// Scalar string
    String(String),
    /// Field map; field order carries no meaning
    Hash(BTreeMap<String, String>),
    /// Members; order carries no meaning
    Set(Vec<String>),
    /// Members ascending by score
    ZSet(Vec<ScoredMember>),
    /// Items in list order
    List(Vec<String>),
}

impl StoreValue {
    /// The type tag of this value
    pub fn tag(&self) -> TypeTag {
        match self {
            StoreValue::String(_) => TypeTag::String,
            StoreValue::Hash(_) => TypeTag::Hash,
            StoreValue::Set(_) => TypeTag::Set,
            StoreValue::ZSet(_) => TypeTag::ZSet,
            StoreValue::List(_) => TypeTag::List,
        }
    }

    /// Number of elements (1 for a string)
    pub fn len(&self) -> usize {
        match self {
            StoreValue::String(_) => 1,
            StoreValue::Hash(fields) => fields.len(),
            StoreValue::Set(members) => members.len(),
            StoreValue::ZSet(members) => members.len(),
            StoreValue::List(items) => items.len(),
        }
    }

    /// Whether this is a collection with no elements
    ///
    /// A string is never empty in this sense, even when it is `""`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render a score the way the store accepts it as a command argument
pub fn format_score(score: f64) -> String {
    if score == f64::INFINITY {
        "+inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        score.to_string()
    }
}
