//! Conjunction overuse: runs of sentences that all open with a conjunction.

use crate::rules::helpers;
use crate::segment;
use crate::{LintIssue, Rule, RuleContext, Severity, Span};

/// Sentence-initial conjunctions counted by this rule.
const CONJUNCTIONS: &[&str] = &[
    "しかし", "だから", "そして", "それで", "また", "さらに", "つまり", "ただし", "しかも",
    "でも", "なお", "ところが",
];

pub(crate) fn rule() -> Rule {
    lint_rule! {
        id: "conjunction-overuse",
        name: "Conjunction overuse",
        name_ja: "接続詞の多用",
        severity: Severity::Info,
        options: { "threshold" => 3 },
        needs_validation: true,
        kind: pattern(check),
    }
}

fn check(ctx: &RuleContext, text: &str) -> anyhow::Result<Vec<LintIssue>> {
    let threshold = ctx.option_usize("threshold", 3).max(1);
    // Quoted dialogue is excluded: characters may talk however they like.
    let masked = segment::mask_dialogue(text);
    let sentences = segment::split_sentences(&masked);

    let mut issues = Vec::new();
    let mut run: Vec<Span> = Vec::new();

    for span in sentences.iter().copied().chain(std::iter::once(Span::new(0, 0))) {
        let opens_with_conjunction = !span.is_empty() && starts_with_conjunction(&masked, span);
        if opens_with_conjunction {
            run.push(span);
            continue;
        }
        if run.len() >= threshold {
            issues.push(run_issue(ctx, &run));
        }
        run.clear();
    }

    Ok(issues)
}

fn run_issue(ctx: &RuleContext, run: &[Span]) -> LintIssue {
    let span = Span::new(run[0].from, run[run.len() - 1].to);
    let count = run.len();
    ctx.issue(
        span,
        format!("{count} consecutive sentences start with a conjunction"),
        format!("接続詞で始まる文が{count}回連続しています"),
    )
}

fn starts_with_conjunction(text: &str, span: Span) -> bool {
    let sentence = segment::slice(text, span);
    let trimmed = sentence.trim_start();
    CONJUNCTIONS.iter().any(|c| {
        trimmed.strip_prefix(c).is_some_and(|rest| {
            // "しかし" as a prefix of an unrelated word doesn't count; the
            // conjunction must be followed by a boundary-ish char.
            rest.chars().next().is_none_or(|c| !helpers::is_hiragana(c))
        })
    })
}
