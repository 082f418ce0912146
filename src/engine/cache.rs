//! Per-paragraph issue cache.
//!
//! Stores the issues produced by paragraph-scoped rules (pattern + token),
//! keyed by `(paragraph index, content hash)`. Document-scoped rules are
//! cheap relative to tokenization and see cross-paragraph state, so their
//! output is never cached. A miss is never an error; it just means the
//! paragraph gets re-linted.

use std::collections::HashMap;

use crate::LintIssue;
use crate::config::{CacheScope, ChangeReason};

#[derive(Debug, Default)]
pub struct IssueCache {
    entries: HashMap<usize, CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    hash: u64,
    issues: Vec<LintIssue>,
}

impl IssueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached issues for paragraph `idx`, only when the stored hash matches
    /// the paragraph's current content hash.
    pub fn get(&self, idx: usize, hash: u64) -> Option<&[LintIssue]> {
        match self.entries.get(&idx) {
            Some(entry) if entry.hash == hash => Some(&entry.issues),
            _ => None,
        }
    }

    pub fn store(&mut self, idx: usize, hash: u64, issues: Vec<LintIssue>) {
        self.entries.insert(idx, CacheEntry { hash, issues });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop whatever `reason` invalidates on this cache. The verdict cache
    /// applies the same reason on its own side
    /// ([`crate::Validator::apply_change`]); callers forward one reason to
    /// both.
    pub fn apply_change(&mut self, reason: ChangeReason) {
        if reason.invalidates().contains(CacheScope::ISSUES) {
            self.clear();
        }
    }
}
