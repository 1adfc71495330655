//! Per-type counters used by every report

use crate::tag::TypeTag;
use std::fmt;

/// One counter per type tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCounts {
    /// string keys
    pub string: usize,
    /// hash keys
    pub hash: usize,
    /// set keys
    pub set: usize,
    /// zset keys
    pub zset: usize,
    /// list keys
    pub list: usize,
}

impl TypeCounts {
    /// Counter for one tag
    pub fn get(&self, tag: TypeTag) -> usize {
        match tag {
            TypeTag::String => self.string,
            TypeTag::Hash => self.hash,
            TypeTag::Set => self.set,
            TypeTag::ZSet => self.zset,
            TypeTag::List => self.list,
        }
    }

    /// Add one to a tag's counter
    pub fn increment(&mut self, tag: TypeTag) {
        match tag {
            TypeTag::String => self.string += 1,
            TypeTag::Hash => self.hash += 1,
            TypeTag::Set => self.set += 1,
            TypeTag::ZSet => self.zset += 1,
            TypeTag::List => self.list += 1,
        }
    }

    /// Sum over all tags
    pub fn total(&self) -> usize {
        self.string + self.hash + self.set + self.zset + self.list
    }
}

impl fmt::Display for TypeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for tag in TypeTag::ALL {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={}", tag, self.get(tag))?;
        }
        Ok(())
    }
}
