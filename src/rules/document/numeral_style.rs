//! Numeral width consistency: half-width and full-width arabic numerals
//! mixed across the document.
//!
//! Token-document: numeral tokens come from the morphological analysis
//! (品詞細分類 = 数詞), and consistency is only meaningful over the whole
//! text. The minority width is flagged with a width-conversion fix.

use crate::rules::helpers;
use crate::token::Token;
use crate::{LintIssue, Rule, RuleContext, Severity, Span};

pub(crate) fn rule() -> Rule {
    lint_rule! {
        id: "numeral-width",
        name: "Numeral width consistency",
        name_ja: "算用数字の全角半角混在",
        severity: Severity::Info,
        kind: token_document(check),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Width {
    Half,
    Full,
}

struct Numeral {
    paragraph: usize,
    span: Span,
    surface: String,
    width: Width,
}

fn check(
    ctx: &RuleContext,
    _paragraphs: &[&str],
    streams: &[Vec<Token>],
) -> anyhow::Result<Vec<LintIssue>> {
    let mut numerals = Vec::new();
    for (paragraph, tokens) in streams.iter().enumerate() {
        for token in tokens {
            let Some(width) = numeral_width(token) else { continue };
            numerals.push(Numeral {
                paragraph,
                span: token.span,
                surface: token.surface.clone(),
                width,
            });
        }
    }

    let half = numerals.iter().filter(|n| n.width == Width::Half).count();
    let full = numerals.len() - half;
    if half == 0 || full == 0 {
        return Ok(Vec::new());
    }

    // Flag the minority; on a tie, flag full-width (half-width arabic
    // numerals are the common baseline for horizontal text).
    let flagged = if full <= half { Width::Full } else { Width::Half };

    Ok(numerals
        .iter()
        .filter(|n| n.width == flagged)
        .map(|n| {
            let converted = helpers::convert_digit_width(&n.surface, flagged == Width::Half);
            ctx.issue(
                n.span,
                format!("numeral width inconsistent with the rest of the document: {}", n.surface),
                format!("算用数字の字幅が他と揃っていません（「{}」）", n.surface),
            )
            .at_paragraph(n.paragraph)
            .with_fix("字幅を統一", converted)
        })
        .collect())
}

/// The width of a numeral token, or `None` for non-numeral tokens and
/// kanji numerals (which this rule leaves alone).
fn numeral_width(token: &Token) -> Option<Width> {
    let is_numeral_pos = token.pos_detail.contains('数');
    let chars_half = token.surface.chars().all(|c| c.is_ascii_digit());
    let chars_full = token.surface.chars().all(helpers::is_fullwidth_digit);
    if !is_numeral_pos && !chars_half && !chars_full {
        return None;
    }
    if chars_half && !token.surface.is_empty() {
        Some(Width::Half)
    } else if chars_full && !token.surface.is_empty() {
        Some(Width::Full)
    } else {
        None
    }
}
