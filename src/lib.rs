extern crate self as kousei;

#[macro_use]
mod macros;

pub mod config;
pub mod engine;
pub mod rules;
pub mod segment;
pub mod token;
pub mod validate;

pub use config::{
    CacheScope, ChangeReason, CorrectionConfig, Guideline, IgnoredCorrection, LlmConfig, Mode,
    RerunScope, RuleConfig, RuleOverride, classify_change,
};
pub use engine::{Document, LintReport, Linter, RuleFault};
pub use token::{Token, Tokenizer};
pub use validate::{
    InferenceClient, InferenceError, InferenceOptions, InferenceReply, ValidatableIssue, Validator,
    Verdict,
};

use serde::Serialize;

// --- Core value types --------------------------------------------------------

/// A half-open `[from, to)` range of **char offsets** (Unicode scalar values)
/// into the paragraph text an issue was found in.
///
/// All offsets produced by this crate are char offsets, never byte offsets.
/// The editor side works in characters, and char offsets survive the
/// dialogue-masking transform (see `segment::mask_dialogue`), which preserves
/// char length but not byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Span {
    /// Start char index (inclusive).
    pub from: usize,
    /// End char index (exclusive).
    pub to: usize,
}

impl Span {
    pub fn new(from: usize, to: usize) -> Self {
        debug_assert!(from <= to);
        Span { from, to }
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// Issue severity. The derived order (`Error < Warning < Info`) is the
/// default sort/filter order: more severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Reference into a named style standard (guide name + section number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StandardRef {
    pub name: &'static str,
    pub section: &'static str,
}

/// A proposed one-click fix: replace the issue's `[from, to)` with
/// `replacement`. Applying the fix is owned by the editor, not this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    /// Short label shown on the fix action (Japanese).
    pub label: String,
    /// Literal replacement text for the issue span.
    pub replacement: String,
}

/// A single finding produced by exactly one rule invocation.
///
/// Issues are immutable value objects: every lint pass recreates them from
/// scratch, nothing mutates an issue after it leaves a rule.
///
/// Invariant: `0 <= span.from <= span.to <= char_len(paragraph text)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LintIssue {
    /// Stable identifier of the producing rule.
    pub rule_id: &'static str,
    /// Index of the paragraph the span refers to. Paragraph-scoped rules
    /// emit `0`; the orchestrator rebinds it to the actual index.
    pub paragraph: usize,
    /// Char range into the original paragraph text.
    pub span: Span,
    pub severity: Severity,
    /// Human-readable message (English).
    pub message: String,
    /// Localized message (Japanese).
    pub message_ja: String,
    /// Style standard this finding is based on, if any.
    pub standard: Option<StandardRef>,
    /// Optional literal-replacement fix.
    pub fix: Option<Fix>,
    /// Whether this finding is heuristic and should be offered to the LLM
    /// second-opinion layer before being shown to the author.
    pub needs_validation: bool,
}

impl LintIssue {
    /// Attach a fix (builder-style, used from rule bodies).
    pub fn with_fix(mut self, label: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.fix = Some(Fix { label: label.into(), replacement: replacement.into() });
        self
    }

    /// Rebind the paragraph index (used by the orchestrator for
    /// paragraph-scoped rules, and by document rules directly).
    pub fn at_paragraph(mut self, paragraph: usize) -> Self {
        self.paragraph = paragraph;
        self
    }

    /// Deterministic sort key: position first, then a stable rule-id tiebreak.
    pub(crate) fn sort_key(&self) -> (usize, usize, usize, &'static str) {
        (self.paragraph, self.span.from, self.span.to, self.rule_id)
    }
}

// --- Rule model --------------------------------------------------------------

/// Per-invocation context handed to every rule execution function.
///
/// Carries the rule's own metadata plus its *effective* configuration
/// (default merged with mode/guideline gating and user overrides, see
/// `CorrectionConfig::resolve`), so a rule body can build issues without
/// repeating its identity.
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    pub rule_id: &'static str,
    pub severity: Severity,
    pub standard: Option<StandardRef>,
    pub needs_validation: bool,
    pub mode: Mode,
    pub options: &'a serde_json::Map<String, serde_json::Value>,
}

impl<'a> RuleContext<'a> {
    /// Build an issue carrying this rule's identity. Paragraph index is `0`
    /// until the orchestrator (or a document rule) rebinds it.
    pub fn issue(
        &self,
        span: Span,
        message: impl Into<String>,
        message_ja: impl Into<String>,
    ) -> LintIssue {
        LintIssue {
            rule_id: self.rule_id,
            paragraph: 0,
            span,
            severity: self.severity,
            message: message.into(),
            message_ja: message_ja.into(),
            standard: self.standard,
            fix: None,
            needs_validation: self.needs_validation,
        }
    }

    /// Read an integer option, falling back to `default` when absent or of
    /// the wrong shape.
    pub fn option_usize(&self, name: &str, default: usize) -> usize {
        self.options
            .get(name)
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(default)
    }

    /// Read a boolean option with a fallback.
    pub fn option_bool(&self, name: &str, default: bool) -> bool {
        self.options.get(name).and_then(|v| v.as_bool()).unwrap_or(default)
    }
}

/// Execution function of a pattern rule: raw paragraph text only.
pub type PatternFn = fn(&RuleContext, &str) -> anyhow::Result<Vec<LintIssue>>;

/// Execution function of a token rule: paragraph text plus its morphological
/// token stream (tokenized once per paragraph, shared across token rules).
pub type TokenFn = fn(&RuleContext, &str, &[Token]) -> anyhow::Result<Vec<LintIssue>>;

/// Execution function of a document rule: the full ordered paragraph list.
/// Issues must carry their paragraph index (via [`LintIssue::at_paragraph`]).
pub type DocumentFn = fn(&RuleContext, &[&str]) -> anyhow::Result<Vec<LintIssue>>;

/// Execution function of a token-document rule: all paragraphs plus their
/// token streams (index-aligned; a stream is empty when tokenization failed
/// for that paragraph).
pub type TokenDocumentFn =
    fn(&RuleContext, &[&str], &[Vec<Token>]) -> anyhow::Result<Vec<LintIssue>>;

/// The closed set of rule execution shapes.
///
/// Every rule declares exactly one kind and the orchestrator dispatches on
/// it; there is deliberately no trait hierarchy here, so adding a
/// hypothetical fifth shape is a visible, breaking change rather than one
/// more abstract base.
#[derive(Clone, Copy)]
pub enum RuleKind {
    Pattern(PatternFn),
    Token(TokenFn),
    Document(DocumentFn),
    TokenDocument(TokenDocumentFn),
}

impl RuleKind {
    /// True for the per-paragraph kinds (pattern/token).
    pub fn is_paragraph_scoped(&self) -> bool {
        matches!(self, RuleKind::Pattern(_) | RuleKind::Token(_))
    }

    /// True for the kinds that need a token stream.
    pub fn needs_tokens(&self) -> bool {
        matches!(self, RuleKind::Token(_) | RuleKind::TokenDocument(_))
    }
}

impl std::fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleKind::Pattern(_) => "Pattern",
            RuleKind::Token(_) => "Token",
            RuleKind::Document(_) => "Document",
            RuleKind::TokenDocument(_) => "TokenDocument",
        };
        write!(f, "RuleKind::{name}(<fn>)")
    }
}

/// A lint rule: stable identity, display names, execution kind, default
/// configuration and activation metadata.
///
/// Execution must be pure: the same text/tokens and the same effective
/// configuration always yield the same issue list. The issue cache and the
/// determinism guarantees rely on this.
pub struct Rule {
    /// Stable identifier, also the cache-key component.
    pub id: &'static str,
    /// Display name (English).
    pub name: &'static str,
    /// Display name (Japanese).
    pub name_ja: &'static str,
    pub kind: RuleKind,
    /// Writing modes this rule applies to; empty means every mode.
    pub modes: &'static [Mode],
    /// Guideline this rule belongs to; `Some` means the rule only runs when
    /// that guideline is active in the configuration.
    pub guideline: Option<Guideline>,
    /// Style standard backing this rule's findings.
    pub standard: Option<StandardRef>,
    /// Whether findings are heuristic enough to warrant an LLM second
    /// opinion.
    pub needs_validation: bool,
    /// Factory for the rule's default configuration.
    pub default_config: fn() -> RuleConfig,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("modes", &self.modes)
            .field("guideline", &self.guideline)
            .field("needs_validation", &self.needs_validation)
            .finish()
    }
}
