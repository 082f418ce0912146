//! Long-vowel mark confusion: a `ー` that does not follow kana is more
//! likely a stray dash, minus sign or the kanji `一` typed as a prolonged
//! sound mark.
//!
//! Runs on the dialogue-masked text, so quoted speech (`「ー」`) is never
//! flagged. Heuristic by nature; findings go through the LLM second
//! opinion.

use crate::rules::helpers;
use crate::segment;
use crate::{LintIssue, Rule, RuleContext, Severity, Span};

pub(crate) fn rule() -> Rule {
    lint_rule! {
        id: "long-vowel-confusion",
        name: "Long-vowel mark confusion",
        name_ja: "長音記号の誤用",
        severity: Severity::Warning,
        needs_validation: true,
        kind: pattern(check),
    }
}

fn check(ctx: &RuleContext, text: &str) -> anyhow::Result<Vec<LintIssue>> {
    let masked = segment::mask_dialogue(text);

    let mut issues = Vec::new();
    let mut prev: Option<char> = None;
    for (idx, ch) in masked.chars().enumerate() {
        if matches!(ch, 'ー' | 'ｰ')
            && !prev.is_some_and(|p| helpers::is_katakana(p) || helpers::is_hiragana(p))
        {
            issues.push(ctx.issue(
                Span::new(idx, idx + 1),
                "long-vowel mark does not follow kana; possibly a stray dash or 一",
                "長音記号「ー」が仮名に続いていません（ダッシュや「一」の誤入力の可能性）",
            ));
        }
        prev = Some(ch);
    }

    Ok(issues)
}
