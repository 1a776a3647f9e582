//! Unfenced `{"tool": ...}` objects embedded in prose.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::ToolCall;

static TOOL_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{\s*"tool"\s*:"#).expect("tool key regex must compile"));

/// First `{"tool": ...}` object in the text that parses as a tool call.
pub fn parse(text: &str) -> Option<ToolCall> {
    TOOL_KEY_RE.find_iter(text).find_map(|m| {
        let candidate = balanced_from(text, m.start())?;
        let value = serde_json::from_str::<serde_json::Value>(candidate).ok()?;
        ToolCall::from_value(&value)
    })
}

/// The balanced `{...}` object starting at byte offset `start`, if it closes.
///
/// Braces inside string literals are ignored.
pub fn balanced_from(text: &str, start: usize) -> Option<&str> {
    let tail = text.get(start..)?;
    if !tail.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;
    for (i, ch) in tail.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&tail[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Every top-level balanced object in the text, in order.
pub fn balanced_objects(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        match balanced_from(text, start) {
            Some(obj) => {
                found.push(obj);
                pos = start + obj.len();
            }
            None => pos = start + 1,
        }
    }
    found
}
