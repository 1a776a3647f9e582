//! Tool-call extraction from free-form model text.
//!
//! Models emit tool calls in several dialects. Each dialect is a pure
//! `&str -> Option<ToolCall>` function and they are tried in priority order:
//!
//! 1. [`fenced`]: a ```` ```tool ```` or ```` ```json ```` block holding `{"tool", "args"}`
//! 2. [`invoke`]: `<invoke name="..."><parameter name="...">...</parameter></invoke>`
//! 3. [`bare_json`]: an unfenced `{"tool": ...}` object anywhere in the text
//!
//! No match means the reply is a final answer. Parsing never fails.

pub mod bare_json;
pub mod fenced;
pub mod invoke;

use std::sync::LazyLock;

use regex::Regex;

use crate::types::ToolCall;

/// One tool-call dialect.
pub type Strategy = fn(&str) -> Option<ToolCall>;

/// Dialects in priority order.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("fenced", fenced::parse),
    ("invoke", invoke::parse),
    ("bare_json", bare_json::parse),
];

/// Extract the first structurally valid tool call from a model reply.
pub fn parse_tool_call(response: &str) -> Option<ToolCall> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let call = strategy(response)?;
        tracing::debug!(dialect = name, tool = %call.tool, "parsed tool call");
        Some(call)
    })
}

static FENCED_ARTIFACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*(?:tool|json)\b.*?(?:```|\z)").expect("fenced artifact regex must compile")
});

static INVOKE_ARTIFACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<invoke\b.*?(?:</invoke>|\z)").expect("invoke artifact regex must compile")
});

static STRAY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?(?:function_calls|invoke|parameter|tool_call)\b[^>]*>")
        .expect("stray tag regex must compile")
});

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run regex must compile"));

/// Remove leftover tool-call syntax from a final answer before showing it.
///
/// Fenced `json` blocks are only removed when they mention `"tool"`, so
/// ordinary JSON in an answer survives. If nothing but artifacts remain, the
/// trimmed original is returned so the user never sees an empty reply.
pub fn strip_tool_artifacts(text: &str) -> String {
    let without_fences = FENCED_ARTIFACT_RE.replace_all(text, |caps: &regex::Captures<'_>| {
        let block = &caps[0];
        let is_tool_block = block.trim_start_matches('`').trim_start().starts_with("tool")
            || block.contains("\"tool\"");
        if is_tool_block {
            String::new()
        } else {
            block.to_string()
        }
    });
    let without_invokes = INVOKE_ARTIFACT_RE.replace_all(&without_fences, "");
    let without_tags = STRAY_TAG_RE.replace_all(&without_invokes, "");
    let collapsed = BLANK_RUN_RE.replace_all(&without_tags, "\n\n");

    let cleaned = collapsed.trim();
    if cleaned.is_empty() {
        text.trim().to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fenced_block_wins_over_invoke() {
        let text = r#"Let me look.
<invoke name="list_dir"><parameter name="target_directory">src</parameter></invoke>

```tool
{"tool": "read_file", "args": {"target_file": "main.rs"}}
```"#;

        let call = parse_tool_call(text).unwrap();

        assert_eq!(call.tool, "read_file");
        assert_eq!(call.args["target_file"], "main.rs");
    }

    #[test]
    fn invoke_wins_over_bare_json() {
        let text = r#"{"tool": "grep", "args": {"pattern": "x"}}
<invoke name="list_dir"><parameter name="target_directory">.</parameter></invoke>"#;

        assert_eq!(parse_tool_call(text).unwrap().tool, "list_dir");
    }

    #[test]
    fn prose_is_a_final_answer() {
        assert!(parse_tool_call("The bug is in line 4; swap the arguments.").is_none());
        assert!(parse_tool_call("").is_none());
    }

    #[test]
    fn malformed_fence_falls_through_to_next_dialect() {
        let text = "```tool\n{not json}\n```\nthen {\"tool\": \"todo_write\", \"args\": {}}";
        assert_eq!(parse_tool_call(text).unwrap().tool, "todo_write");
    }

    #[test]
    fn strip_removes_tool_syntax_but_keeps_prose() {
        let text = "Done! The file is fixed.\n\n```tool\n{\"tool\": \"read_file\", \"args\": {}}\n```\n</invoke>";
        assert_eq!(strip_tool_artifacts(text), "Done! The file is fixed.");
    }

    #[test]
    fn strip_keeps_plain_json_examples() {
        let text = "Config:\n```json\n{\"port\": 8080}\n```";
        assert_eq!(strip_tool_artifacts(text), text);
    }

    #[test]
    fn strip_never_returns_empty() {
        let text = "```tool\n{\"tool\": \"x\"\n```";
        assert_eq!(strip_tool_artifacts(text), text);
    }
}
