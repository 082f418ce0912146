//! LLM second-opinion layer.
//!
//! Some pattern and token rules are heuristic and prone to false positives;
//! their issues are marked `needs_validation` and can be routed through an
//! external inference service for a confirm/dismiss verdict before they
//! reach the author.
//!
//! ```text
//! Vec<ValidatableIssue> ──┬── verdict cache hit ──────────> Verdict
//!                         │
//!                         └── semaphore (N permits)
//!                                │  bounded-context prompt (prompt.rs)
//!                                v
//!                         InferenceClient::generate
//!                                │  defensive parse of {"valid": bool}
//!                                v
//!                         Confirmed / Dismissed / Unvalidated
//! ```
//!
//! The governing principle is **fail-open**: an unavailable backend, a
//! cancelled call, a timeout or an unparsable reply all yield
//! [`Verdict::Unvalidated`], which keeps the issue. The worst outcome of
//! this layer misbehaving is the author seeing a few extra candidate
//! issues, never fewer.

mod cache;
mod client;
mod prompt;
mod validator;

pub use cache::VerdictCache;
pub use client::{InferenceClient, InferenceError, InferenceOptions, InferenceReply};
pub use prompt::{CONTEXT_WINDOW, VERDICT_MAX_TOKENS};
pub use validator::{DEFAULT_CONCURRENCY, ValidatableIssue, Validator, Verdict};
