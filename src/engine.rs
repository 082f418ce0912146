//! Document linting engine.
//!
//! The engine is the deterministic half of the system: given a document, a
//! tokenizer capability and a [`crate::CorrectionConfig`], it produces the
//! same ordered issue list every time. The asynchronous half (the LLM
//! second opinion) lives in [`crate::validate`] and consumes this module's
//! output.
//!
//! ## Responsibilities by module
//!
//! - `document.rs`: paragraph arena; stable indices and per-paragraph
//!   content hashes recomputed only on edit.
//! - `orchestrator.rs`: the lint pass itself: rule dispatch by kind,
//!   per-paragraph tokenization sharing, failure isolation, deterministic
//!   ordering.
//! - `cache.rs`: per-paragraph issue cache keyed by `(index, hash)`, with
//!   invalidation driven by [`crate::ChangeReason`].
//!
//! Rule execution across paragraphs is pure and shares no mutable state, so
//! a host may parallelize it; nothing here requires that, and the built-in
//! implementation is sequential.

mod cache;
mod document;
mod orchestrator;

pub use cache::IssueCache;
pub use document::{Document, Paragraph, content_hash};
pub use orchestrator::{LintReport, Linter, RuleFault};
