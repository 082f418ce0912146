//! Doubled particle: the same particle twice in a row (「私はは思う」),
//! almost always a typo surviving an edit.

use crate::token::Token;
use crate::{LintIssue, Rule, RuleContext, Severity};

pub(crate) fn rule() -> Rule {
    lint_rule! {
        id: "doubled-particle",
        name: "Doubled particle",
        name_ja: "助詞の重複",
        severity: Severity::Error,
        kind: token(check),
    }
}

fn check(ctx: &RuleContext, _text: &str, tokens: &[Token]) -> anyhow::Result<Vec<LintIssue>> {
    let mut issues = Vec::new();

    for pair in tokens.windows(2) {
        let [first, second] = pair else { continue };
        if !first.is_pos("助詞") || !second.is_pos("助詞") {
            continue;
        }
        if first.surface != second.surface || second.span.from != first.span.to {
            continue;
        }

        let span = crate::Span::new(first.span.from, second.span.to);
        issues.push(
            ctx.issue(
                span,
                format!("particle {:?} repeated", first.surface),
                format!("助詞「{}」が重複しています", first.surface),
            )
            .with_fix("重複を削除", first.surface.clone()),
        );
    }

    Ok(issues)
}
