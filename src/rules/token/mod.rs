//! Token rules: operate on a paragraph's morphological token stream.
//!
//! The orchestrator tokenizes each paragraph at most once per pass and
//! hands the same stream to every rule here.

mod particles;
mod ra_nuki;


use crate::Rule;

pub(crate) fn rules() -> Vec<Rule> {
    vec![ra_nuki::rule(), particles::rule()]
}
