//! Built-in rule content.
//!
//! Illustrative coverage of the four execution kinds, not an exhaustive
//! style guide: four pattern rules, two token rules, one document rule and
//! one token-document rule. Registration order is the registry order;
//! output ordering does not depend on it (the orchestrator sorts).

mod document;
mod helpers;
mod pattern;
mod token;

use crate::Rule;

/// The default registry: a flat, ordered rule list.
pub fn default_rules() -> Vec<Rule> {
    let mut rules = Vec::new();
    rules.extend(pattern::rules());
    rules.extend(token::rules());
    rules.extend(document::rules());
    rules
}
