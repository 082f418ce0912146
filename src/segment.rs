//! Text segmentation utilities.
//!
//! Leaf module with no dependencies on the rest of the crate beyond [`Span`]:
//! every rule that reasons about sentences or quoted dialogue goes through
//! here, so the two transforms must be deterministic and restartable (the
//! same text always yields the same result).
//!
//! - [`split_sentences`]: delimiter scan producing non-empty sentence spans.
//! - [`mask_dialogue`]: replaces quoted-speech characters with a placeholder
//!   while preserving char length, so offset arithmetic done on the masked
//!   text is valid on the original.
//! - [`char_span`] / [`slice`] / [`char_len`]: byte-offset to char-offset
//!   bridges for regex-based rules (`regex` reports byte offsets, the public
//!   surface of this crate is char offsets).

use crate::Span;

/// Placeholder written over quoted-speech characters. The geta mark is the
/// conventional Japanese typographic stand-in for an unprintable character.
pub const MASK_CHAR: char = '〓';

/// Sentence delimiters: ideographic/fullwidth stops, their half-width
/// equivalents, and newline.
const SENTENCE_DELIMITERS: &[char] = &['。', '．', '！', '？', '.', '!', '?', '\n'];

/// Split `text` into sentence spans (char offsets, delimiters excluded).
///
/// Emits every non-empty, non-whitespace span between delimiters, including
/// a trailing span when the text does not end on a delimiter.
pub fn split_sentences(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut sentence_start = 0usize;
    let mut idx = 0usize;
    let mut has_content = false;

    for ch in text.chars() {
        if SENTENCE_DELIMITERS.contains(&ch) {
            if has_content {
                spans.push(Span::new(sentence_start, idx));
            }
            has_content = false;
            sentence_start = idx + 1;
        } else if !ch.is_whitespace() {
            has_content = true;
        }
        idx += 1;
    }

    if has_content {
        spans.push(Span::new(sentence_start, idx));
    }

    spans
}

/// Replace every character inside quotation brackets with [`MASK_CHAR`].
///
/// Single corner brackets `「…」` and double corner brackets `『…』` are
/// tracked with independent depth counters, so nesting either inside the
/// other works. The brackets themselves stay visible; only the enclosed
/// characters are masked.
///
/// Guarantees for all inputs, balanced or not:
/// - `char_len(mask_dialogue(s)) == char_len(s)`
/// - unbalanced closing brackets never underflow (depths clamp at zero)
pub fn mask_dialogue(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut single_depth = 0usize;
    let mut double_depth = 0usize;

    for ch in text.chars() {
        match ch {
            '「' => {
                out.push(if single_depth + double_depth > 0 { MASK_CHAR } else { ch });
                single_depth += 1;
            }
            '」' => {
                single_depth = single_depth.saturating_sub(1);
                out.push(if single_depth + double_depth > 0 { MASK_CHAR } else { ch });
            }
            '『' => {
                out.push(if single_depth + double_depth > 0 { MASK_CHAR } else { ch });
                double_depth += 1;
            }
            '』' => {
                double_depth = double_depth.saturating_sub(1);
                out.push(if single_depth + double_depth > 0 { MASK_CHAR } else { ch });
            }
            _ => {
                out.push(if single_depth + double_depth > 0 { MASK_CHAR } else { ch });
            }
        }
    }

    out
}

/// Number of chars (Unicode scalar values) in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Convert a byte range (as reported by `regex`) into a char [`Span`].
///
/// `bytes` must lie on char boundaries of `text`; regex match ranges always
/// do.
pub fn char_span(text: &str, bytes: std::ops::Range<usize>) -> Span {
    let from = text[..bytes.start].chars().count();
    let to = from + text[bytes.start..bytes.end].chars().count();
    Span::new(from, to)
}

/// Slice `text` by a char-offset span. Out-of-range spans are clamped to the
/// end of the text rather than panicking.
pub fn slice(text: &str, span: Span) -> &str {
    let byte_start = byte_offset(text, span.from);
    let byte_end = byte_offset(text, span.to);
    &text[byte_start..byte_end]
}

/// Byte offset of the `char_idx`-th char, clamped to `text.len()`.
pub fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices().nth(char_idx).map(|(b, _)| b).unwrap_or(text.len())
}
