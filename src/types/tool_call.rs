//! A tool invocation extracted from model text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured tool call: the tool name plus its named arguments.
///
/// Parsed once per model turn and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }

    /// Build a call from a JSON value shaped like `{"tool": "...", "args": {...}}`.
    ///
    /// Returns `None` when the value is not structurally a tool call.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let tool = obj.get("tool")?.as_str()?.trim();
        if tool.is_empty() {
            return None;
        }
        let args = match obj.get("args") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => return None,
        };
        Some(Self::new(tool, args))
    }

    /// Arguments as a JSON object value.
    pub fn args_value(&self) -> Value {
        Value::Object(self.args.clone())
    }
}
