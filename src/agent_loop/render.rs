//! Short human-readable rendering of a tool call.

use serde_json::Value;

use crate::types::ToolCall;
use crate::util::truncate_chars;

/// Render `call` as `name(arg1, arg2, ...)`.
///
/// String arguments longer than `max_chars` are cut and suffixed with `...`;
/// other values are shown as compact JSON.
pub fn render_call(call: &ToolCall, max_chars: usize) -> String {
    let args = call
        .args
        .values()
        .map(|value| render_value(value, max_chars))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({args})", call.tool)
}

fn render_value(value: &Value, max_chars: usize) -> String {
    match value {
        Value::String(s) => {
            let single_line = s.replace('\n', "\\n");
            let cut = truncate_chars(&single_line, max_chars);
            if cut.len() < single_line.len() {
                format!("\"{cut}...\"")
            } else {
                format!("\"{cut}\"")
            }
        }
        other => other.to_string(),
    }
}
