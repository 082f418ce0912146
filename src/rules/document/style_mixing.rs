//! Style mixing: です・ます (polite) and だ・である (plain) sentence
//! endings in the same document.
//!
//! Document-scoped: a single paragraph in either register is fine; the
//! problem only exists across the whole text. The minority register is
//! flagged, sentence by sentence, so the author sees exactly what to
//! rewrite.

use crate::config::Mode;
use crate::segment;
use crate::{LintIssue, Rule, RuleContext, Severity, Span};

const POLITE_ENDINGS: &[&str] =
    &["です", "ます", "でした", "ました", "ません", "ましょう", "ください"];
const PLAIN_ENDINGS: &[&str] = &["である", "であった", "だった", "だろう", "ではない", "だ"];

pub(crate) fn rule() -> Rule {
    lint_rule! {
        id: "style-mixing",
        name: "Sentence-style mixing",
        name_ja: "文体の混在",
        severity: Severity::Warning,
        // SNS writing mixes registers on purpose.
        modes: [Mode::Novel, Mode::Official, Mode::Blog, Mode::Academic],
        kind: document(check),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Register {
    Polite,
    Plain,
}

struct Ending {
    paragraph: usize,
    span: Span,
    register: Register,
}

fn check(ctx: &RuleContext, paragraphs: &[&str]) -> anyhow::Result<Vec<LintIssue>> {
    let mut endings = Vec::new();
    for (paragraph, text) in paragraphs.iter().enumerate() {
        let masked = segment::mask_dialogue(text);
        for span in segment::split_sentences(&masked) {
            let sentence = segment::slice(&masked, span);
            if let Some(register) = classify(sentence) {
                endings.push(Ending { paragraph, span, register });
            }
        }
    }

    let polite = endings.iter().filter(|e| e.register == Register::Polite).count();
    let plain = endings.len() - polite;
    if polite == 0 || plain == 0 {
        return Ok(Vec::new());
    }

    // Flag the minority register; on a tie, flag plain (the polite register
    // is the safer default to keep in every supported mode).
    let flagged = if plain <= polite { Register::Plain } else { Register::Polite };
    let (flagged_name, other_name) =
        if flagged == Register::Plain { ("だ・である", "です・ます") } else { ("です・ます", "だ・である") };

    Ok(endings
        .iter()
        .filter(|e| e.register == flagged)
        .map(|e| {
            ctx.issue(
                e.span,
                format!("sentence style mixing: {flagged_name} amid {other_name}"),
                format!("文体が混在しています（{other_name}調の中に{flagged_name}調）"),
            )
            .at_paragraph(e.paragraph)
        })
        .collect())
}

fn classify(sentence: &str) -> Option<Register> {
    let trimmed = sentence.trim_end();
    if POLITE_ENDINGS.iter().any(|e| trimmed.ends_with(e)) {
        return Some(Register::Polite);
    }
    if PLAIN_ENDINGS.iter().any(|e| trimmed.ends_with(e)) {
        return Some(Register::Plain);
    }
    None
}
