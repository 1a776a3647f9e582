//! Fenced ```` ```tool ```` / ```` ```json ```` blocks.

use std::sync::LazyLock;

use regex::Regex;

use super::bare_json;
use crate::types::ToolCall;

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*(?:tool|json)[ \t]*\r?\n?(.*?)```").expect("fence regex must compile")
});

/// First fenced block whose body is a `{tool, args}` object.
pub fn parse(text: &str) -> Option<ToolCall> {
    FENCE_RE.captures_iter(text).find_map(|caps| {
        let body = caps.get(1)?.as_str().trim();
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => ToolCall::from_value(&value),
            // Models sometimes add a comment line inside the fence.
            Err(_) => bare_json::balanced_objects(body)
                .into_iter()
                .filter_map(|candidate| serde_json::from_str(candidate).ok())
                .find_map(|value| ToolCall::from_value(&value)),
        }
    })
}
