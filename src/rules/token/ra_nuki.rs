//! ら抜き言葉: the potential form of an ichidan verb written without ら
//! (食べれる for 食べられる).
//!
//! Needs the token stream: the surface alone cannot distinguish 食べれる
//! from a godan potential like 読める. Tokenizers disagree on these
//! segmentations often enough that findings go through the LLM second
//! opinion.

use crate::token::Token;
use crate::{LintIssue, Rule, RuleContext, Severity};

pub(crate) fn rule() -> Rule {
    lint_rule! {
        id: "ra-nuki",
        name: "Ra-nuki potential form",
        name_ja: "ら抜き言葉",
        severity: Severity::Warning,
        needs_validation: true,
        kind: token(check),
    }
}

fn check(ctx: &RuleContext, _text: &str, tokens: &[Token]) -> anyhow::Result<Vec<LintIssue>> {
    let mut issues = Vec::new();

    for pair in tokens.windows(2) {
        let [verb, aux] = pair else { continue };
        if !verb.is_pos("動詞") || !verb.conjugation_type.contains("一段") {
            continue;
        }
        if !aux.is_pos("助動詞") || aux.base_form != "れる" {
            continue;
        }
        // Adjacent tokens only; a gap means the analyzer saw something else.
        if aux.span.from != verb.span.to {
            continue;
        }

        let span = crate::Span::new(verb.span.from, aux.span.to);
        let corrected = format!("{}ら{}", verb.surface, aux.surface);
        issues.push(
            ctx.issue(
                span,
                format!("ra-nuki form {}{}; standard is {corrected}", verb.surface, aux.surface),
                format!("「{}{}」はら抜き言葉です（「{corrected}」が標準的）", verb.surface, aux.surface),
            )
            .with_fix("「ら」を挿入", corrected.clone()),
        );
    }

    Ok(issues)
}
