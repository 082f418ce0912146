//! Verdict prompt construction and defensive reply parsing.
//!
//! Prompts are bounded: a fixed char window around the flagged span, the
//! rule identity and its message. The model is asked for a one-line JSON
//! payload `{"valid": true|false}`; anything else (truncation, prose,
//! markdown fences, malformed JSON) parses to "no verdict" and the issue
//! is kept.

use crate::segment;
use crate::{LintIssue, Span};

/// Chars of paragraph context included on each side of the flagged span.
pub const CONTEXT_WINDOW: usize = 60;

/// Output token budget for a verdict call.
pub const VERDICT_MAX_TOKENS: u32 = 64;

/// Build the validation prompt for one issue within its paragraph.
pub fn build(issue: &LintIssue, paragraph_text: &str) -> String {
    let len = segment::char_len(paragraph_text);
    let from = issue.span.from.min(len);
    let to = issue.span.to.min(len).max(from);

    let window_from = from.saturating_sub(CONTEXT_WINDOW);
    let window_to = (to + CONTEXT_WINDOW).min(len);
    let context = segment::slice(paragraph_text, Span::new(window_from, window_to));
    let excerpt = segment::slice(paragraph_text, Span::new(from, to));

    format!(
        "あなたは日本語の文章校正アシスタントです。\n\
         次の指摘が本当に修正すべき問題かどうかを判定してください。\n\
         \n\
         指摘ルール: {rule_id}\n\
         指摘内容: {message}\n\
         該当箇所: 「{excerpt}」\n\
         前後の文脈: {context}\n\
         \n\
         指摘が妥当なら {{\"valid\": true}}、誤検出なら {{\"valid\": false}} を\n\
         JSONのみで出力してください。説明は不要です。",
        rule_id = issue.rule_id,
        message = issue.message_ja,
        excerpt = excerpt,
        context = context,
    )
}

/// Extract the verdict from a best-effort model reply.
///
/// Returns `Some(true)` / `Some(false)` only when a JSON object with a
/// boolean `valid` field is found; `None` for everything else. The caller
/// maps `None` to [`crate::Verdict::Unvalidated`].
pub fn parse_verdict(reply: &str) -> Option<bool> {
    // Fast path: the whole reply is the payload.
    if let Some(valid) = parse_object(reply.trim()) {
        return Some(valid);
    }

    // Otherwise scan for an embedded object. Replies are tiny (the output
    // budget is `VERDICT_MAX_TOKENS`), so the quadratic scan is harmless.
    let bytes: Vec<(usize, char)> = reply.char_indices().collect();
    for (open_idx, (open, _)) in bytes.iter().enumerate().filter(|(_, (_, c))| *c == '{') {
        for (close, _) in bytes.iter().skip(open_idx + 1).filter(|(_, c)| *c == '}') {
            let candidate = &reply[*open..close + '}'.len_utf8()];
            if let Some(valid) = parse_object(candidate) {
                return Some(valid);
            }
        }
    }

    None
}

fn parse_object(candidate: &str) -> Option<bool> {
    let value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    value.get("valid")?.as_bool()
}
