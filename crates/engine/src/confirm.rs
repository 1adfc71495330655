//! Confirmation strategies for destructive restores
//!
//! The restore loader shows a [`RestorePlan`] to a [`Confirmation`] before
//! its first write. Scripted runs use [`AutoConfirm`]; the interactive
//! prompt lives in the CLI crate.

use kvsnap_core::{BackupDocument, TypeCounts, TypeTag};
use std::fmt;

/// What a restore is about to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorePlan {
    /// Where the document came from
    pub origin: String,
    /// `createdAt` of the document
    pub created_at: String,
    /// Manifest entries per type
    pub counts: TypeCounts,
    /// Manifest entries in total, including unknown types
    pub total: usize,
}

impl RestorePlan {
    /// Plan for restoring `document` loaded from `origin`
    pub fn new(origin: impl Into<String>, document: &BackupDocument) -> Self {
        RestorePlan {
            origin: origin.into(),
            created_at: document.created_at.clone(),
            counts: document.counts(),
            total: document.len(),
        }
    }

    /// Manifest entries whose type is not one of the five tags
    pub fn unknown(&self) -> usize {
        self.total - self.counts.total()
    }
}

impl fmt::Display for RestorePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Backup:  {}", self.origin)?;
        if !self.created_at.is_empty() {
            writeln!(f, "Created: {}", self.created_at)?;
        }
        for tag in TypeTag::ALL {
            writeln!(f, "  {:<7} {}", tag.id(), self.counts.get(tag))?;
        }
        if self.unknown() > 0 {
            writeln!(f, "  {:<7} {}", "unknown", self.unknown())?;
        }
        write!(f, "Total:   {} keys", self.total)
    }
}

/// Decides whether a restore may proceed
pub trait Confirmation {
    /// `true` to proceed with the writes described by `plan`
    fn confirm(&mut self, plan: &RestorePlan) -> bool;
}

/// Always proceeds
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn confirm(&mut self, _plan: &RestorePlan) -> bool {
        true
    }
}

/// Never proceeds
#[derive(Debug, Clone, Copy, Default)]
pub struct Decline;

impl Confirmation for Decline {
    fn confirm(&mut self, _plan: &RestorePlan) -> bool {
        false
    }
}

impl<F: FnMut(&RestorePlan) -> bool> Confirmation for F {
    fn confirm(&mut self, plan: &RestorePlan) -> bool {
        self(plan)
    }
}
