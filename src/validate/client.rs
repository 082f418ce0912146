//! Inference capability boundary.
//!
//! The inference service (a local model server in the authoring tool) is a
//! black box behind [`InferenceClient`]. No output format is guaranteed
//! beyond best effort; everything downstream parses defensively.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors at the inference boundary. Every variant is handled fail-open by
/// the validator; none of them propagates to the host.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference backend is not reachable")]
    Unavailable,
    #[error("model {0:?} is not loaded")]
    ModelNotLoaded(String),
    #[error("inference call was cancelled")]
    Cancelled,
    #[error("inference call failed: {0}")]
    Backend(String),
}

/// Options for a single generation call.
#[derive(Debug, Clone, Default)]
pub struct InferenceOptions {
    /// Output token budget. Verdict prompts only need a handful of tokens.
    pub max_tokens: u32,
    /// Caller-supplied cancellation. The client honors it per its own
    /// contract (abort or run to completion); either way the validator
    /// treats a cancelled call as [`crate::Verdict::Unvalidated`].
    pub cancel: Option<CancellationToken>,
}

/// Generated text plus optional accounting metadata.
#[derive(Debug, Clone)]
pub struct InferenceReply {
    pub text: String,
    pub tokens_generated: Option<u32>,
}

impl InferenceReply {
    pub fn new(text: impl Into<String>) -> Self {
        InferenceReply { text: text.into(), tokens_generated: None }
    }
}

/// Consumed capability: text generation with availability probes.
///
/// Injected into the [`crate::Validator`] at construction; never looked up
/// globally.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &InferenceOptions,
    ) -> Result<InferenceReply, InferenceError>;

    /// Whether the backend is reachable at all.
    async fn is_available(&self) -> bool;

    /// Whether `model_id` is loaded and ready to serve.
    async fn is_model_loaded(&self, model_id: &str) -> bool;
}
