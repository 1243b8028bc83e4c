//! Text rendering for stored strategies: the history table shown to the user
//! and the context digest prepended to strategist prompts.

use chrono::Local;
use pitwall_core::strategy::StrategyRecord;
use std::fmt::Write;

const TOPIC_PREVIEW_CHARS: usize = 50;

pub const DIGEST_HEADER: &str = "--- Recent strategy history (newest first) ---";
pub const DIGEST_FOOTER: &str = "--- End of strategy history ---";

/// The first `max` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Up to and including the first `.`, `!` or `?` that is followed by
/// whitespace or ends the text, so decimals like `3.48` stay whole.
pub fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let at_boundary = chars.peek().is_none_or(|&(_, next)| next.is_whitespace());
        if matches!(c, '.' | '!' | '?') && at_boundary {
            return &text[..i + c.len_utf8()];
        }
    }
    text
}

/// One digest line per record.
pub fn digest_line(record: &StrategyRecord) -> String {
    if record.is_optimization_run() {
        let result = record
            .advice
            .as_deref()
            .map(first_sentence)
            .filter(|s| !s.is_empty())
            .unwrap_or("no explanation recorded");
        format!(
            "OPTIMIZATION RUN (Gain: {:.2}s). Result: {result}",
            record.calculated_delta
        )
    } else {
        let topic: String = record.topic.chars().take(TOPIC_PREVIEW_CHARS).collect();
        format!(
            "STANDARD STRATEGY (Delta: {:.2}s). Topic: {topic}...",
            record.calculated_delta
        )
    }
}

/// The block summarizing recent records for the strategist, or `None` when
/// there is no history.
pub fn context_digest(records: &[StrategyRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }
    let mut block = String::from(DIGEST_HEADER);
    block.push('\n');
    for record in records {
        let _ = writeln!(block, "- {}", digest_line(record));
    }
    block.push_str(DIGEST_FOOTER);
    Some(block)
}

/// The strategist prompt: digest (if any), then the question.
pub fn with_context(digest: Option<&str>, question: &str) -> String {
    match digest {
        Some(digest) => format!("{digest}\n\n{question}"),
        None => question.to_string(),
    }
}

/// The history table, newest first as given.
pub fn history_table(records: &[StrategyRecord]) -> String {
    let mut out = String::from("--- Strategy History (Long Term Memory) ---\n");
    if records.is_empty() {
        out.push_str("No strategies saved yet.");
        return out;
    }

    out.push_str("| ID | Date/Time         | Delta (s) | Topic\n");
    out.push_str(
        "|----|-------------------|-----------|----------------------------------------------------\n",
    );
    for record in records {
        let date = record
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        let _ = writeln!(
            out,
            "| {:<2} | {:<17} | {:<9.2} | {}",
            record.id,
            date,
            record.calculated_delta,
            preview(&record.topic, TOPIC_PREVIEW_CHARS)
        );
    }
    out.push_str("\nUse 'delete <ID>' to remove an entry.");
    out
}
