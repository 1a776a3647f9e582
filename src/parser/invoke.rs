//! XML-ish `<invoke name="..."><parameter name="...">...</parameter></invoke>` calls.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::types::ToolCall;

static INVOKE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<invoke\s+name\s*=\s*["']([^"']+)["']\s*>(.*?)</invoke>"#)
        .expect("invoke regex must compile")
});

static PARAMETER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<parameter\s+name\s*=\s*["']([^"']+)["']\s*>(.*?)</parameter>"#)
        .expect("parameter regex must compile")
});

/// First complete `<invoke>` block.
pub fn parse(text: &str) -> Option<ToolCall> {
    let caps = INVOKE_RE.captures(text)?;
    let name = caps.get(1)?.as_str().trim();
    if name.is_empty() {
        return None;
    }

    let mut args = Map::new();
    for param in PARAMETER_RE.captures_iter(caps.get(2)?.as_str()) {
        let key = param[1].trim().to_string();
        args.insert(key, parameter_value(&param[2]));
    }
    Some(ToolCall::new(name, args))
}

/// Parameter values that parse as JSON keep their structure; anything else is
/// passed through as the raw string.
fn parameter_value(raw: &str) -> Value {
    serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_string()))
}
