//! Morphological token model and the tokenizer capability boundary.
//!
//! The tokenizer itself is an external collaborator (an IPC-attached
//! morphological analyzer in the authoring tool); this crate only consumes
//! it through the [`Tokenizer`] trait. Token and token-document rules are
//! the only consumers, and the orchestrator requests a paragraph's token
//! stream at most once per pass regardless of how many token rules run.

use crate::Span;

/// One morphological token of a paragraph.
///
/// `span` is a `[start, end)` char range into the paragraph the token was
/// requested for. Streams returned by a well-behaved tokenizer are ordered,
/// contiguous and non-overlapping; rules should tolerate (skip over) streams
/// that are not, since the analyzer is outside our control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Surface form as it appears in the text.
    pub surface: String,
    /// Coarse part-of-speech tag (品詞), e.g. `動詞`, `助詞`, `名詞`.
    pub pos: String,
    /// Fine part-of-speech tag (品詞細分類), e.g. `数`, `格助詞`.
    pub pos_detail: String,
    /// Conjugation type (活用型), e.g. `一段`, empty when not conjugable.
    pub conjugation_type: String,
    /// Conjugation form (活用形), e.g. `未然形`, empty when not conjugable.
    pub conjugation_form: String,
    /// Base (dictionary) form, e.g. `食べる` for surface `食べ`.
    pub base_form: String,
    /// Reading in katakana, e.g. `タベ`.
    pub reading: String,
    /// Char range into the paragraph text.
    pub span: Span,
}

impl Token {
    /// True when the coarse tag matches.
    pub fn is_pos(&self, pos: &str) -> bool {
        self.pos == pos
    }
}

/// Consumed capability: morphological analysis of a single paragraph.
///
/// Implementations are injected into the [`crate::Linter`] at construction;
/// there is no global tokenizer instance. Unavailability is a first-class
/// state: token and token-document rules are simply skipped while pattern
/// and document rules keep running.
pub trait Tokenizer: Send + Sync {
    /// Tokenize one paragraph. Errors are reported as soft diagnostics and
    /// cause token rules to be skipped for this paragraph only.
    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<Token>>;

    /// Cheap probe; when `false` the orchestrator does not attempt to
    /// tokenize at all for the current pass.
    fn is_available(&self) -> bool {
        true
    }
}

/// A tokenizer that is never available. Used by hosts (and the demo binary)
/// that want pattern/document linting without a morphological analyzer.
#[derive(Debug, Default)]
pub struct UnavailableTokenizer;

impl Tokenizer for UnavailableTokenizer {
    fn tokenize(&self, _text: &str) -> anyhow::Result<Vec<Token>> {
        anyhow::bail!("no morphological analyzer attached")
    }

    fn is_available(&self) -> bool {
        false
    }
}
