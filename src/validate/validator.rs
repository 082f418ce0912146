//! Concurrency-controlled verdict dispatch.
//!
//! One configurable strategy: every issue is validated independently, and a
//! semaphore admits at most `concurrency` inference calls at once. A limit
//! of 1 degenerates to one-at-a-time; a large limit approximates
//! all-at-once. Verdicts arrive in any order; the returned vector is
//! index-aligned with the submitted batch regardless.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::LintIssue;
use crate::engine::content_hash;

use super::cache::{IssueKey, VerdictCache};
use super::client::{InferenceClient, InferenceOptions};
use super::prompt;

/// Default bound on simultaneously in-flight inference calls.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Outcome of validating one issue.
///
/// `Unvalidated` is the explicit fail-open state: the layer chose to keep
/// the issue because no trustworthy verdict was obtained (backend down,
/// call failed, reply unparsable, or cancellation). Keeping it distinct
/// from `Confirmed` makes that choice visible and testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The model agrees the issue is real.
    Confirmed,
    /// The model judged the issue a false positive.
    Dismissed,
    /// No verdict was obtained; the issue is kept.
    Unvalidated,
}

impl Verdict {
    /// Whether the issue stays in the report. Only an explicit dismissal
    /// removes it.
    pub fn keeps_issue(self) -> bool {
        !matches!(self, Verdict::Dismissed)
    }
}

/// A [`LintIssue`] paired with the full paragraph text it was found in,
/// the unit submitted for a second opinion.
#[derive(Debug, Clone)]
pub struct ValidatableIssue {
    pub issue: LintIssue,
    pub paragraph_text: String,
    paragraph_hash: u64,
}

impl ValidatableIssue {
    pub fn new(issue: LintIssue, paragraph_text: impl Into<String>) -> Self {
        let paragraph_text = paragraph_text.into();
        let paragraph_hash = content_hash(&paragraph_text);
        ValidatableIssue { issue, paragraph_text, paragraph_hash }
    }

    fn key(&self) -> IssueKey {
        IssueKey::new(self.issue.rule_id, self.issue.span.from, self.issue.span.to, self.paragraph_hash)
    }
}

/// The validation layer: verdict cache, admission control, fail-open
/// semantics.
///
/// Constructed once by the host with the inference capability injected.
/// Each issue's validation is isolated: one failing or cancelled call never
/// affects another's verdict.
pub struct Validator {
    client: Arc<dyn InferenceClient>,
    cache: VerdictCache,
    model_id: String,
    concurrency: usize,
}

impl Validator {
    pub fn new(client: Arc<dyn InferenceClient>, model_id: impl Into<String>) -> Self {
        Validator {
            client,
            cache: VerdictCache::new(),
            model_id: model_id.into(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Override the in-flight bound. Clamped to at least 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Forward a configuration change to the verdict cache. A model change
    /// also swaps the judging model for subsequent batches.
    pub fn apply_change(&mut self, reason: crate::config::ChangeReason, model_id: Option<&str>) {
        self.cache.apply_change(reason);
        if let Some(model_id) = model_id {
            self.model_id = model_id.to_string();
        }
    }

    pub fn cached_verdicts(&self) -> usize {
        self.cache.len()
    }

    /// Validate a batch of issues, returning one [`Verdict`] per input, in
    /// input order.
    ///
    /// - Backend unreachable or model not loaded: all `Unvalidated`, zero
    ///   calls made.
    /// - Cache hit: stored verdict reused, no call for that issue.
    /// - `cancel` requested: no *new* call is admitted afterwards;
    ///   already-issued calls finish per the client's own contract, and
    ///   everything not validated comes back `Unvalidated`.
    pub async fn validate_batch(
        &self,
        batch: &[ValidatableIssue],
        cancel: Option<CancellationToken>,
    ) -> Vec<Verdict> {
        let mut verdicts = vec![Verdict::Unvalidated; batch.len()];
        if batch.is_empty() {
            return verdicts;
        }

        if !self.client.is_available().await {
            debug!("inference backend unavailable; batch kept unvalidated");
            return verdicts;
        }
        if !self.client.is_model_loaded(&self.model_id).await {
            debug!(model = %self.model_id, "model not loaded; batch kept unvalidated");
            return verdicts;
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut inflight: JoinSet<(usize, Verdict)> = JoinSet::new();

        for (idx, item) in batch.iter().enumerate() {
            if let Some(valid) = self.cache.get(&item.key()) {
                verdicts[idx] = if valid { Verdict::Confirmed } else { Verdict::Dismissed };
                continue;
            }
            if cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                // Stays Unvalidated; don't even queue it.
                continue;
            }

            let client = Arc::clone(&self.client);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let prompt = prompt::build(&item.issue, &item.paragraph_text);
            let rule_id = item.issue.rule_id;

            inflight.spawn(async move {
                // Admission: a slot frees up, or the batch was cancelled in
                // the meantime.
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (idx, Verdict::Unvalidated),
                };
                if cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                    return (idx, Verdict::Unvalidated);
                }

                let options =
                    InferenceOptions { max_tokens: prompt::VERDICT_MAX_TOKENS, cancel: cancel.clone() };
                let verdict = match client.generate(&prompt, &options).await {
                    Ok(reply) => match prompt::parse_verdict(&reply.text) {
                        Some(true) => Verdict::Confirmed,
                        Some(false) => Verdict::Dismissed,
                        None => {
                            debug!(rule = rule_id, "unparsable verdict reply; keeping issue");
                            Verdict::Unvalidated
                        }
                    },
                    Err(err) => {
                        warn!(rule = rule_id, error = %err, "inference call failed; keeping issue");
                        Verdict::Unvalidated
                    }
                };
                (idx, verdict)
            });
        }

        while let Some(joined) = inflight.join_next().await {
            match joined {
                Ok((idx, verdict)) => {
                    verdicts[idx] = verdict;
                    match verdict {
                        Verdict::Confirmed => self.cache.put(batch[idx].key(), true),
                        Verdict::Dismissed => self.cache.put(batch[idx].key(), false),
                        // Fail-open outcomes are retried on a later pass.
                        Verdict::Unvalidated => {}
                    }
                }
                Err(err) => {
                    // A panicked task is isolated like any other failure;
                    // its slot's verdict stays Unvalidated.
                    warn!(error = %err, "validation task aborted");
                }
            }
        }

        verdicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::client::{InferenceError, InferenceReply};
    use crate::{Severity, Span};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn item(rule_id: &'static str, from: usize, to: usize, text: &str) -> ValidatableIssue {
        ValidatableIssue::new(
            LintIssue {
                rule_id,
                paragraph: 0,
                span: Span::new(from, to),
                severity: Severity::Warning,
                message: "suspicious".into(),
                message_ja: "疑わしい表現です".into(),
                standard: None,
                fix: None,
                needs_validation: true,
            },
            text,
        )
    }

    /// Scriptable client: fixed reply text, fixed delay, in-flight counting.
    struct FakeClient {
        reply: String,
        delay: Duration,
        available: bool,
        model_loaded: bool,
        calls: AtomicUsize,
        inflight: AtomicUsize,
        max_inflight: AtomicUsize,
    }

    impl FakeClient {
        fn answering(reply: &str) -> Self {
            FakeClient {
                reply: reply.to_string(),
                delay: Duration::ZERO,
                available: true,
                model_loaded: true,
                calls: AtomicUsize::new(0),
                inflight: AtomicUsize::new(0),
                max_inflight: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn unavailable() -> Self {
            let mut client = Self::answering("");
            client.available = false;
            client
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn max_inflight(&self) -> usize {
            self.max_inflight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InferenceClient for FakeClient {
        async fn generate(
            &self,
            _prompt: &str,
            _options: &InferenceOptions,
        ) -> Result<InferenceReply, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_inflight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.inflight.fetch_sub(1, Ordering::SeqCst);
            Ok(InferenceReply::new(self.reply.clone()))
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        async fn is_model_loaded(&self, _model_id: &str) -> bool {
            self.model_loaded
        }
    }

    fn batch_of(n: usize) -> Vec<ValidatableIssue> {
        (0..n).map(|i| item("heuristic-rule", i, i + 1, "これはテスト用の段落です。")).collect()
    }

    #[tokio::test]
    async fn dismissed_only_on_explicit_false() {
        let client = Arc::new(FakeClient::answering(r#"{"valid": false}"#));
        let validator = Validator::new(client, "test-model");
        let verdicts = validator.validate_batch(&batch_of(2), None).await;
        assert_eq!(verdicts, vec![Verdict::Dismissed; 2]);
    }

    #[tokio::test]
    async fn unparsable_replies_fail_open() {
        // Truncated/garbage replies for all five issues keep all five.
        let client = Arc::new(FakeClient::answering(r#"{"valid""#));
        let validator = Validator::new(client.clone(), "test-model");
        let verdicts = validator.validate_batch(&batch_of(5), None).await;
        assert_eq!(verdicts, vec![Verdict::Unvalidated; 5]);
        assert!(verdicts.iter().all(|v| v.keeps_issue()));
        assert_eq!(client.calls(), 5);
    }

    #[tokio::test]
    async fn unavailable_backend_short_circuits() {
        let client = Arc::new(FakeClient::unavailable());
        let validator = Validator::new(client.clone(), "test-model");
        let verdicts = validator.validate_batch(&batch_of(3), None).await;
        assert_eq!(verdicts, vec![Verdict::Unvalidated; 3]);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn model_not_loaded_short_circuits() {
        let mut inner = FakeClient::answering(r#"{"valid": true}"#);
        inner.model_loaded = false;
        let client = Arc::new(inner);
        let validator = Validator::new(client.clone(), "test-model");
        let verdicts = validator.validate_batch(&batch_of(3), None).await;
        assert_eq!(verdicts, vec![Verdict::Unvalidated; 3]);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn inflight_calls_never_exceed_the_limit() {
        let client =
            Arc::new(FakeClient::answering(r#"{"valid": true}"#).with_delay(Duration::from_millis(50)));
        let validator = Validator::new(client.clone(), "test-model").with_concurrency(3);

        let verdicts = validator.validate_batch(&batch_of(10), None).await;

        assert_eq!(verdicts, vec![Verdict::Confirmed; 10]);
        assert_eq!(client.calls(), 10);
        assert!(client.max_inflight() <= 3, "max in-flight was {}", client.max_inflight());
    }

    #[tokio::test]
    async fn cancellation_admits_no_new_work() {
        let client = Arc::new(FakeClient::answering(r#"{"valid": false}"#));
        let validator = Validator::new(client.clone(), "test-model");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let verdicts = validator.validate_batch(&batch_of(4), Some(cancel)).await;

        assert_eq!(verdicts, vec![Verdict::Unvalidated; 4]);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn cache_hits_skip_inference() {
        let client = Arc::new(FakeClient::answering(r#"{"valid": true}"#));
        let validator = Validator::new(client.clone(), "test-model");
        let batch = batch_of(3);

        let first = validator.validate_batch(&batch, None).await;
        assert_eq!(first, vec![Verdict::Confirmed; 3]);
        assert_eq!(client.calls(), 3);

        let second = validator.validate_batch(&batch, None).await;
        assert_eq!(second, vec![Verdict::Confirmed; 3]);
        assert_eq!(client.calls(), 3, "cache hits must not trigger inference");
    }

    #[tokio::test]
    async fn unvalidated_outcomes_are_not_cached() {
        let client = Arc::new(FakeClient::answering("garbage"));
        let validator = Validator::new(client.clone(), "test-model");
        let batch = batch_of(2);

        validator.validate_batch(&batch, None).await;
        validator.validate_batch(&batch, None).await;

        assert_eq!(client.calls(), 4, "fail-open outcomes are retried");
        assert_eq!(validator.cached_verdicts(), 0);
    }

    #[tokio::test]
    async fn model_change_invalidates_cached_verdicts() {
        let client = Arc::new(FakeClient::answering(r#"{"valid": false}"#));
        let mut validator = Validator::new(client.clone(), "model-a");
        let batch = batch_of(1);

        validator.validate_batch(&batch, None).await;
        assert_eq!(validator.cached_verdicts(), 1);

        validator.apply_change(crate::config::ChangeReason::ModelChange, Some("model-b"));
        assert_eq!(validator.cached_verdicts(), 0);

        validator.validate_batch(&batch, None).await;
        assert_eq!(client.calls(), 2);
    }
}
