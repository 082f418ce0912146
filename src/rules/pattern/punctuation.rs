//! Doubled punctuation: runs of the same ideographic stop or comma.

use crate::config::Guideline;
use crate::segment;
use crate::{LintIssue, Rule, RuleContext, Severity};

pub(crate) fn rule() -> Rule {
    lint_rule! {
        id: "doubled-punctuation",
        name: "Doubled punctuation",
        name_ja: "句読点の重複",
        severity: Severity::Error,
        guideline: Guideline::JtfStyle,
        standard: ("JTF日本語標準スタイルガイド", "2.1.3"),
        kind: pattern(check),
    }
}

fn check(ctx: &RuleContext, text: &str) -> anyhow::Result<Vec<LintIssue>> {
    let re = regex!(r"。{2,}|、{2,}");
    let masked = segment::mask_dialogue(text);

    let mut issues = Vec::new();
    for m in re.find_iter(&masked) {
        let span = segment::char_span(&masked, m.range());
        let mark = m.as_str().chars().next().unwrap_or('。');
        issues.push(
            ctx.issue(
                span,
                format!("repeated punctuation mark {mark:?}"),
                format!("句読点「{mark}」が連続しています"),
            )
            .with_fix("重複を削除", mark.to_string()),
        );
    }

    Ok(issues)
}
