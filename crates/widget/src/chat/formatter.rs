//! Heuristic paragraph splitting for reply text.
//!
//! Rules run in order and the first one that applies wins:
//! 1. two or more non-blank lines: one block per line;
//! 2. otherwise split on `". "`, trim each fragment and make sure it ends with
//!    a period; keep the fragments when there are at least two of them or the
//!    text is longer than [`LONG_REPLY_THRESHOLD`] characters;
//! 3. otherwise the text is returned untouched as a single block.
//!
//! Sentence splitting is purely lexical: abbreviations and decimals such as
//! `"3. 5"` are split like any other `". "`.

use serde_json::Value;

/// Length, in characters, above which single-sentence replies are still normalized.
pub const LONG_REPLY_THRESHOLD: usize = 100;

const SENTENCE_BREAK: &str = ". ";

/// Splits raw reply text into display blocks. Always returns at least one block.
pub fn format_reply(raw: &str) -> Vec<String> {
    let lines = raw
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>();
    if lines.len() >= 2 {
        return lines.into_iter().map(str::to_string).collect();
    }

    let fragments = raw
        .split(SENTENCE_BREAK)
        .map(close_sentence)
        .collect::<Vec<_>>();
    if fragments.len() >= 2 || raw.chars().count() > LONG_REPLY_THRESHOLD {
        return fragments;
    }

    vec![raw.to_string()]
}

/// Formats an arbitrary JSON value: `null` reads as empty text, strings as
/// themselves and anything else as its JSON rendering.
pub fn format_value(value: &Value) -> Vec<String> {
    format_reply(&value_text(value))
}

pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn close_sentence(fragment: &str) -> String {
    let trimmed = fragment.trim();
    if trimmed.ends_with('.') {
        trimmed.to_string()
    } else {
        format!("{trimmed}.")
    }
}
