//! Era/Western year consistency: `令和5年（2022年）` states the wrong
//! Western year; Reiwa 5 is 2023.

use crate::config::Guideline;
use crate::rules::helpers;
use crate::segment;
use crate::{LintIssue, Rule, RuleContext, Severity};

pub(crate) fn rule() -> Rule {
    lint_rule! {
        id: "era-year-consistency",
        name: "Era/Western year consistency",
        name_ja: "元号と西暦の不一致",
        severity: Severity::Warning,
        guideline: Guideline::Koyobun,
        standard: ("公用文作成の考え方", "Ⅰ-2"),
        kind: pattern(check),
    }
}

/// Era name to the Western year of its year zero (era year N falls in
/// `base + N`, ignoring the handful of mid-year transitions).
fn era_base(era: &str) -> Option<u32> {
    match era {
        "明治" => Some(1867),
        "大正" => Some(1911),
        "昭和" => Some(1925),
        "平成" => Some(1988),
        "令和" => Some(2018),
        _ => None,
    }
}

fn check(ctx: &RuleContext, text: &str) -> anyhow::Result<Vec<LintIssue>> {
    let re = regex!(
        r"(明治|大正|昭和|平成|令和)(元|[0-9０-９]{1,2})年([（(])([0-9０-９]{4})年([）)])"
    );

    let mut issues = Vec::new();
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let era = &caps[1];
        let era_year_text = &caps[2];
        let open = &caps[3];
        let western_text = &caps[4];
        let close = &caps[5];

        let Some(base) = era_base(era) else { continue };
        let era_year =
            if era_year_text == "元" { Some(1) } else { helpers::parse_digits(era_year_text) };
        let (Some(era_year), Some(stated)) = (era_year, helpers::parse_digits(western_text)) else {
            continue;
        };

        let expected = base + era_year;
        if stated == expected {
            continue;
        }

        let span = segment::char_span(text, whole.range());
        let corrected = helpers::format_digits_like(expected, western_text);
        let replacement = format!("{era}{era_year_text}年{open}{corrected}年{close}");
        issues.push(
            ctx.issue(
                span,
                format!("{era} {era_year} is {expected}, not {stated}"),
                format!("{era}{era_year_text}年は西暦{expected}年です（{stated}年ではありません）"),
            )
            .with_fix("西暦を修正", replacement),
        );
    }

    Ok(issues)
}
