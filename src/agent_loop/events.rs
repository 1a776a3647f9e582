//! Progress updates emitted while a turn runs.

use serde::{Deserialize, Serialize};

/// A progress event for the UI layer.
///
/// `Response` and `Error` are terminal: exactly one of them (or an
/// `Aborted` error from the runner) ends every turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentUpdate {
    /// Status text shown before a model call.
    Thinking { text: String },
    /// A parsed tool call, rendered as `name(arg, ...)`.
    Tool { call: String },
    /// Truncated tool output.
    ToolResult { tool: String, preview: String },
    /// Final answer for the turn.
    Response { text: String },
    Error { message: String },
}

impl AgentUpdate {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Response { .. } | Self::Error { .. })
    }
}
