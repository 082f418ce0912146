//! Verdict cache.
//!
//! Keyed by `rule_id:from:to:hash(paragraph_text)`, valued by the stored
//! boolean verdict (`true` = the issue is real). Only definitive verdicts
//! are stored; fail-open outcomes are not, so a later pass retries them.
//!
//! The cache is the one piece of shared mutable state in the validation
//! layer. It is read before a task is admitted and written once when a task
//! completes, never while holding the lock across an await; last writer
//! wins, which is safe because verdicts for the same key are deterministic
//! given the same text and model.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::{CacheScope, ChangeReason};

/// Cache key for one issue occurrence. The paragraph hash ties the entry to
/// the exact text the issue was found in; any edit changes the hash and the
/// entry simply stops matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueKey(String);

impl IssueKey {
    pub fn new(rule_id: &str, from: usize, to: usize, paragraph_hash: u64) -> Self {
        IssueKey(format!("{rule_id}:{from}:{to}:{paragraph_hash:x}"))
    }
}

#[derive(Debug, Default)]
pub struct VerdictCache {
    entries: Mutex<HashMap<IssueKey, bool>>,
}

impl VerdictCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &IssueKey) -> Option<bool> {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(key).copied()
    }

    pub fn put(&self, key: IssueKey, valid: bool) {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(key, valid);
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop whatever `reason` invalidates on this cache (the issue-cache
    /// counterpart lives in `engine::cache`).
    pub fn apply_change(&self, reason: ChangeReason) {
        if reason.invalidates().contains(CacheScope::VERDICTS) {
            self.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_distinguish_rule_span_and_text() {
        let base = IssueKey::new("r", 0, 4, 1);
        assert_eq!(base, IssueKey::new("r", 0, 4, 1));
        assert_ne!(base, IssueKey::new("s", 0, 4, 1));
        assert_ne!(base, IssueKey::new("r", 1, 4, 1));
        assert_ne!(base, IssueKey::new("r", 0, 4, 2));
    }

    #[test]
    fn model_change_clears_verdicts_but_rule_change_does_not() {
        let cache = VerdictCache::new();
        cache.put(IssueKey::new("r", 0, 1, 9), true);

        cache.apply_change(ChangeReason::RuleConfigChange);
        assert_eq!(cache.len(), 1);

        cache.apply_change(ChangeReason::ModelChange);
        assert!(cache.is_empty());
    }
}
