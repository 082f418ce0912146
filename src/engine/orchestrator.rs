//! The lint pass.
//!
//! [`Linter`] owns the rule registry, the injected tokenizer capability and
//! the per-paragraph issue cache. One call to [`Linter::lint`] is one pass:
//!
//! ```text
//! CorrectionConfig ── resolve ──> active (rule, effective config) pairs
//!                                     │
//! paragraph loop (pattern + token) ───┤  tokenize once per paragraph,
//!   cache hit? reuse stored issues    │  shared by every token rule
//!                                     │
//! document loop (document + token-document, once per pass)
//!                                     │
//!                                     v
//!         sort by (paragraph, from, to, rule id) ──> LintReport
//! ```
//!
//! Rule execution is synchronous and side-effect-free; a failing rule
//! contributes nothing, lands in [`LintReport::faults`] and never aborts
//! the pass.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::CorrectionConfig;
use crate::token::{Token, Tokenizer};
use crate::validate::{ValidatableIssue, Verdict};
use crate::{LintIssue, Rule, RuleConfig, RuleContext, RuleKind};

use super::cache::IssueCache;
use super::document::Document;

/// A soft diagnostic: a rule or the tokenizer failed during a pass. Never
/// surfaced to the author as a lint issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFault {
    /// Failing rule, or `None` for tokenizer faults.
    pub rule_id: Option<&'static str>,
    /// Affected paragraph, or `None` for document-scoped failures.
    pub paragraph: Option<usize>,
    pub detail: String,
}

impl RuleFault {
    fn rule(rule_id: &'static str, paragraph: Option<usize>, err: &anyhow::Error) -> Self {
        RuleFault { rule_id: Some(rule_id), paragraph, detail: format!("{err:#}") }
    }

    fn tokenizer(paragraph: usize, err: &anyhow::Error) -> Self {
        RuleFault { rule_id: None, paragraph: Some(paragraph), detail: format!("{err:#}") }
    }
}

/// Result of one lint pass.
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    /// All issues, ordered by `(paragraph, from, to, rule id)`.
    pub issues: Vec<LintIssue>,
    /// Soft diagnostics collected during the pass.
    pub faults: Vec<RuleFault>,
}

impl LintReport {
    /// The subset of issues eligible for the LLM second opinion, paired
    /// with the paragraph text they were found in. Callers gate this on
    /// `config.llm.validation_enabled`.
    pub fn validatable(&self, doc: &Document) -> Vec<ValidatableIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.needs_validation)
            .filter_map(|issue| {
                let para = doc.paragraph(issue.paragraph)?;
                Some(ValidatableIssue::new(issue.clone(), para.text()))
            })
            .collect()
    }

    /// Drop issues the validation layer dismissed as false positives.
    /// `verdicts` is index-aligned with `batch` (the contract of
    /// [`crate::Validator::validate_batch`]); confirmed and unvalidated
    /// issues are kept.
    pub fn apply_verdicts(&mut self, batch: &[ValidatableIssue], verdicts: &[Verdict]) {
        let dismissed: Vec<&LintIssue> = batch
            .iter()
            .zip(verdicts)
            .filter(|(_, v)| !v.keeps_issue())
            .map(|(item, _)| &item.issue)
            .collect();
        if dismissed.is_empty() {
            return;
        }
        self.issues.retain(|issue| {
            !dismissed.iter().any(|d| {
                d.rule_id == issue.rule_id && d.paragraph == issue.paragraph && d.span == issue.span
            })
        });
    }
}

/// The document linting orchestrator.
///
/// Constructed once by the host with its capabilities injected; there are
/// no global registries. `lint` takes `&mut self` only for the issue cache.
pub struct Linter {
    rules: Vec<Rule>,
    tokenizer: Arc<dyn Tokenizer>,
    cache: IssueCache,
}

impl Linter {
    pub fn new(rules: Vec<Rule>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Linter { rules, tokenizer, cache: IssueCache::new() }
    }

    /// Linter over the built-in default rule set.
    pub fn with_default_rules(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self::new(crate::rules::default_rules(), tokenizer)
    }

    /// Forward a configuration change to the issue cache. The verdict cache
    /// is owned by the [`crate::Validator`]; hosts forward the same reason
    /// there.
    pub fn apply_change(&mut self, reason: crate::config::ChangeReason) {
        self.cache.apply_change(reason);
    }

    /// Run one lint pass over `doc` under `config`.
    pub fn lint(&mut self, doc: &Document, config: &CorrectionConfig) -> LintReport {
        let mut report = LintReport::default();
        if !config.enabled {
            return report;
        }

        let active: Vec<(&Rule, RuleConfig)> =
            self.rules.iter().filter_map(|rule| config.resolve(rule).map(|cfg| (rule, cfg))).collect();

        let wants_paragraph_tokens =
            active.iter().any(|(rule, _)| matches!(rule.kind, RuleKind::Token(_)));
        let wants_document_tokens =
            active.iter().any(|(rule, _)| matches!(rule.kind, RuleKind::TokenDocument(_)));
        let tokenizer_up = self.tokenizer.is_available();
        if (wants_paragraph_tokens || wants_document_tokens) && !tokenizer_up {
            debug!("tokenizer unavailable; token and token-document rules skipped this pass");
        }

        // Token streams by paragraph index, filled lazily. `Some(vec![])`
        // after a tokenizer fault, so a paragraph is attempted at most once.
        let mut streams: Vec<Option<Vec<Token>>> = (0..doc.len()).map(|_| None).collect();

        // Phase 1: paragraph-scoped rules (pattern + token), cache-aware.
        for (idx, para) in doc.paragraphs().enumerate() {
            if let Some(cached) = self.cache.get(idx, para.hash()) {
                report.issues.extend_from_slice(cached);
                continue;
            }

            if wants_paragraph_tokens && tokenizer_up {
                streams[idx] = Some(tokenize_paragraph(
                    self.tokenizer.as_ref(),
                    para.text(),
                    idx,
                    &mut report.faults,
                ));
            }

            let mut para_issues = Vec::new();
            let mut token_rules_skipped = false;
            for (rule, cfg) in &active {
                let ctx = rule_context(rule, cfg, config);
                let result = match rule.kind {
                    RuleKind::Pattern(f) => f(&ctx, para.text()),
                    RuleKind::Token(f) => match streams[idx].as_deref() {
                        Some(tokens) if !tokens.is_empty() || para.text().is_empty() => {
                            f(&ctx, para.text(), tokens)
                        }
                        _ => {
                            token_rules_skipped = true;
                            continue;
                        }
                    },
                    RuleKind::Document(_) | RuleKind::TokenDocument(_) => continue,
                };
                match result {
                    Ok(issues) => {
                        para_issues.extend(issues.into_iter().map(|i| i.at_paragraph(idx)));
                    }
                    Err(err) => {
                        warn!(rule = rule.id, paragraph = idx, error = %format!("{err:#}"), "rule execution failed");
                        report.faults.push(RuleFault::rule(rule.id, Some(idx), &err));
                    }
                }
            }

            // A degraded issue list (token rules skipped because the
            // tokenizer was down or faulted) must not be cached: the hash
            // key only covers text and config, not tokenizer health, so a
            // hit would keep serving the degraded list after recovery. Skip
            // the store and the next pass retries.
            if !token_rules_skipped {
                self.cache.store(idx, para.hash(), para_issues.clone());
            }
            report.issues.extend(para_issues);
        }

        // Phase 2: document-scoped rules, once per pass.
        let texts = doc.texts();
        let document_streams: Option<Vec<Vec<Token>>> = if wants_document_tokens && tokenizer_up {
            // Cache-hit paragraphs skipped tokenization above; fill the gaps.
            for (idx, para) in doc.paragraphs().enumerate() {
                if streams[idx].is_none() {
                    streams[idx] = Some(tokenize_paragraph(
                        self.tokenizer.as_ref(),
                        para.text(),
                        idx,
                        &mut report.faults,
                    ));
                }
            }
            Some(streams.iter().map(|s| s.clone().unwrap_or_default()).collect())
        } else {
            None
        };

        for (rule, cfg) in &active {
            let ctx = rule_context(rule, cfg, config);
            let result = match rule.kind {
                RuleKind::Document(f) => f(&ctx, &texts),
                RuleKind::TokenDocument(f) => match &document_streams {
                    Some(streams) => f(&ctx, &texts, streams),
                    None => continue,
                },
                RuleKind::Pattern(_) | RuleKind::Token(_) => continue,
            };
            match result {
                Ok(issues) => report.issues.extend(issues),
                Err(err) => {
                    warn!(rule = rule.id, error = %format!("{err:#}"), "document rule execution failed");
                    report.faults.push(RuleFault::rule(rule.id, None, &err));
                }
            }
        }

        report.issues.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        report
    }
}

fn rule_context<'a>(rule: &Rule, cfg: &'a RuleConfig, config: &CorrectionConfig) -> RuleContext<'a> {
    RuleContext {
        rule_id: rule.id,
        severity: cfg.severity,
        standard: rule.standard,
        needs_validation: rule.needs_validation,
        mode: config.mode,
        options: &cfg.options,
    }
}

/// Tokenize one paragraph, converting failure into a soft diagnostic and an
/// empty stream (so the paragraph is not re-attempted within this pass).
fn tokenize_paragraph(
    tokenizer: &dyn Tokenizer,
    text: &str,
    idx: usize,
    faults: &mut Vec<RuleFault>,
) -> Vec<Token> {
    match tokenizer.tokenize(text) {
        Ok(tokens) => tokens,
        Err(err) => {
            warn!(paragraph = idx, error = %format!("{err:#}"), "tokenization failed; token rules skipped for this paragraph");
            faults.push(RuleFault::tokenizer(idx, &err));
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChangeReason;
    use crate::token::UnavailableTokenizer;
    use crate::token::test_support::{ScriptedTokenizer, tok};
    use crate::{RuleContext, Severity, Span};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn flag_dame(ctx: &RuleContext, text: &str) -> anyhow::Result<Vec<LintIssue>> {
        let mut issues = Vec::new();
        for m in regex!("ダメ").find_iter(text) {
            let span = crate::segment::char_span(text, m.range());
            issues.push(ctx.issue(span, "dame", "ダメな表現です"));
        }
        Ok(issues)
    }

    fn always_fails(_ctx: &RuleContext, _text: &str) -> anyhow::Result<Vec<LintIssue>> {
        anyhow::bail!("rule blew up")
    }

    fn flag_verbs(
        ctx: &RuleContext,
        _text: &str,
        tokens: &[crate::Token],
    ) -> anyhow::Result<Vec<LintIssue>> {
        Ok(tokens
            .iter()
            .filter(|t| t.is_pos("動詞"))
            .map(|t| ctx.issue(t.span, "verb", "動詞です"))
            .collect())
    }

    fn flag_multi_paragraph(
        ctx: &RuleContext,
        paragraphs: &[&str],
    ) -> anyhow::Result<Vec<LintIssue>> {
        if paragraphs.len() >= 2 {
            Ok(vec![ctx.issue(Span::new(0, 0), "multi", "複数段落").at_paragraph(0)])
        } else {
            Ok(Vec::new())
        }
    }

    fn dame_rule() -> crate::Rule {
        lint_rule! {
            id: "test-dame",
            name: "Dame",
            name_ja: "ダメ",
            severity: Severity::Warning,
            kind: pattern(flag_dame),
        }
    }

    fn failing_rule() -> crate::Rule {
        lint_rule! {
            id: "test-fail",
            name: "Fail",
            name_ja: "失敗",
            severity: Severity::Error,
            kind: pattern(always_fails),
        }
    }

    fn verb_rule() -> crate::Rule {
        lint_rule! {
            id: "test-verb",
            name: "Verb",
            name_ja: "動詞",
            severity: Severity::Info,
            kind: token(flag_verbs),
        }
    }

    fn multi_rule() -> crate::Rule {
        lint_rule! {
            id: "test-multi",
            name: "Multi",
            name_ja: "複数",
            severity: Severity::Info,
            kind: document(flag_multi_paragraph),
        }
    }

    fn scripted_streams() -> HashMap<String, Vec<crate::Token>> {
        let mut streams = HashMap::new();
        streams.insert(
            "彼は走るダメ".to_string(),
            vec![tok("彼", "代名詞", 0), tok("は", "助詞", 1), tok("走る", "動詞", 2), tok("ダメ", "名詞", 4)],
        );
        streams.insert(
            "犬も走る".to_string(),
            vec![tok("犬", "名詞", 0), tok("も", "助詞", 1), tok("走る", "動詞", 2)],
        );
        streams.insert("猫が鳴く".to_string(), vec![tok("猫", "名詞", 0), tok("が", "助詞", 1), tok("鳴く", "動詞", 2)]);
        streams
    }

    fn scripted() -> Arc<ScriptedTokenizer> {
        Arc::new(ScriptedTokenizer::new(scripted_streams()))
    }

    /// Fails the first `failures_left` tokenize calls, then behaves like the
    /// scripted tokenizer.
    struct FlakyTokenizer {
        inner: ScriptedTokenizer,
        failures_left: AtomicUsize,
    }

    impl crate::Tokenizer for FlakyTokenizer {
        fn tokenize(&self, text: &str) -> anyhow::Result<Vec<crate::Token>> {
            let take_failure = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if take_failure {
                anyhow::bail!("analyzer hiccup");
            }
            self.inner.tokenize(text)
        }
    }

    /// Scripted tokenizer whose availability can be flipped mid-test.
    struct SwitchedTokenizer {
        inner: ScriptedTokenizer,
        available: AtomicBool,
    }

    impl crate::Tokenizer for SwitchedTokenizer {
        fn tokenize(&self, text: &str) -> anyhow::Result<Vec<crate::Token>> {
            self.inner.tokenize(text)
        }

        fn is_available(&self) -> bool {
            self.available.load(Ordering::SeqCst)
        }
    }

    fn config() -> crate::CorrectionConfig {
        crate::CorrectionConfig::default()
    }

    #[test]
    fn passes_are_deterministic_and_ordered() {
        let doc = Document::new("彼は走るダメ\n犬も走る");
        let tokenizer = scripted();

        let run = |linter: &mut Linter| linter.lint(&doc, &config());
        let mut a = Linter::new(vec![dame_rule(), verb_rule(), multi_rule()], tokenizer.clone());
        let mut b = Linter::new(vec![verb_rule(), multi_rule(), dame_rule()], tokenizer.clone());

        let first = run(&mut a);
        let second = run(&mut a);
        let reordered = run(&mut b);

        assert_eq!(first.issues, second.issues);
        // Registry order does not affect output order.
        assert_eq!(first.issues, reordered.issues);

        let keys: Vec<_> = first.issues.iter().map(|i| i.sort_key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(first.issues.len(), 4); // dame, 2 verbs, multi
    }

    #[test]
    fn failing_rule_is_isolated() {
        let doc = Document::new("ダメな文");
        let mut linter =
            Linter::new(vec![failing_rule(), dame_rule()], Arc::new(UnavailableTokenizer));

        let report = linter.lint(&doc, &config());

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].rule_id, "test-dame");
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].rule_id, Some("test-fail"));
        assert!(report.faults[0].detail.contains("blew up"));
    }

    #[test]
    fn tokenizer_unavailable_skips_token_rules_only() {
        let doc = Document::new("彼は走るダメ");
        let mut linter =
            Linter::new(vec![dame_rule(), verb_rule()], Arc::new(UnavailableTokenizer));

        let report = linter.lint(&doc, &config());

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].rule_id, "test-dame");
        assert!(report.faults.is_empty());
    }

    #[test]
    fn tokenizer_failure_is_a_soft_diagnostic() {
        // No scripted stream for this text, so tokenize returns Err.
        let doc = Document::new("未知の段落");
        let mut linter = Linter::new(vec![dame_rule(), verb_rule()], scripted());

        let report = linter.lint(&doc, &config());

        assert!(report.issues.is_empty());
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].rule_id, None);
        assert_eq!(report.faults[0].paragraph, Some(0));
    }

    #[test]
    fn transient_tokenizer_fault_is_retried_on_the_next_pass() {
        let doc = Document::new("彼は走るダメ");
        let tokenizer = Arc::new(FlakyTokenizer {
            inner: ScriptedTokenizer::new(scripted_streams()),
            failures_left: AtomicUsize::new(1),
        });
        let mut linter = Linter::new(vec![verb_rule()], tokenizer);

        let first = linter.lint(&doc, &config());
        assert!(first.issues.is_empty());
        assert_eq!(first.faults.len(), 1);

        // Same text, recovered analyzer: the degraded pass was not cached,
        // so the token rule runs this time.
        let second = linter.lint(&doc, &config());
        assert_eq!(second.issues.len(), 1);
        assert_eq!(second.issues[0].rule_id, "test-verb");
        assert!(second.faults.is_empty());
    }

    #[test]
    fn token_rules_run_once_the_tokenizer_comes_back() {
        let doc = Document::new("彼は走るダメ");
        let tokenizer = Arc::new(SwitchedTokenizer {
            inner: ScriptedTokenizer::new(scripted_streams()),
            available: AtomicBool::new(false),
        });
        let mut linter = Linter::new(vec![dame_rule(), verb_rule()], tokenizer.clone());

        let first = linter.lint(&doc, &config());
        assert_eq!(first.issues.len(), 1, "pattern rule only while unavailable");

        tokenizer.available.store(true, Ordering::SeqCst);
        let second = linter.lint(&doc, &config());
        assert_eq!(second.issues.len(), 2);

        // The healthy pass is the one that gets cached.
        let third = linter.lint(&doc, &config());
        assert_eq!(third.issues, second.issues);
        assert_eq!(tokenizer.inner.call_count(), 1);
    }

    #[test]
    fn paragraphs_are_tokenized_once_and_cached_across_passes() {
        let mut doc = Document::new("彼は走るダメ\n犬も走る");
        let tokenizer = scripted();
        let mut linter = Linter::new(vec![verb_rule()], tokenizer.clone());

        let first = linter.lint(&doc, &config());
        assert_eq!(first.issues.len(), 2);
        assert_eq!(tokenizer.call_count(), 2);

        // Unchanged document: both paragraphs served from the issue cache.
        let second = linter.lint(&doc, &config());
        assert_eq!(second.issues, first.issues);
        assert_eq!(tokenizer.call_count(), 2);

        // Editing one paragraph re-tokenizes only that paragraph.
        doc.replace_paragraph(1, "猫が鳴く");
        linter.lint(&doc, &config());
        assert_eq!(tokenizer.call_count(), 3);
    }

    #[test]
    fn rule_config_change_invalidates_the_issue_cache() {
        let doc = Document::new("彼は走るダメ\n犬も走る");
        let tokenizer = scripted();
        let mut linter = Linter::new(vec![verb_rule()], tokenizer.clone());

        linter.lint(&doc, &config());
        linter.apply_change(ChangeReason::RuleConfigChange);
        linter.lint(&doc, &config());

        assert_eq!(tokenizer.call_count(), 4);
    }

    #[test]
    fn disabled_config_yields_an_empty_report() {
        let doc = Document::new("ダメ");
        let mut linter = Linter::new(vec![dame_rule()], Arc::new(UnavailableTokenizer));
        let mut cfg = config();
        cfg.enabled = false;

        let report = linter.lint(&doc, &cfg);
        assert!(report.issues.is_empty());
        assert!(report.faults.is_empty());
    }

    #[test]
    fn validatable_batch_and_verdict_application() {
        let doc = Document::new("第一ー章ダメ");
        let rules = vec![dame_rule(), crate::rules::default_rules().into_iter().find(|r| r.id == "long-vowel-confusion").unwrap()];
        let mut linter = Linter::new(rules, Arc::new(UnavailableTokenizer));

        let mut report = linter.lint(&doc, &config());
        assert_eq!(report.issues.len(), 2);

        let batch = report.validatable(&doc);
        // Only the heuristic long-vowel issue goes to the second opinion.
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].issue.rule_id, "long-vowel-confusion");
        assert_eq!(batch[0].paragraph_text, "第一ー章ダメ");

        report.apply_verdicts(&batch, &[Verdict::Unvalidated]);
        assert_eq!(report.issues.len(), 2, "fail-open keeps the issue");

        report.apply_verdicts(&batch, &[Verdict::Dismissed]);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].rule_id, "test-dame");
    }
}
