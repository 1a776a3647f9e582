//! Tool registry and execution.
//!
//! Tools are looked up by name in a [`ToolRegistry`]. [`ToolRegistry::execute`]
//! always produces text for the model: unknown tools, invalid arguments,
//! handler errors and handler panics all become descriptive strings.

pub mod arguments;
pub mod builtin;
pub mod context;
pub mod path;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use context::ToolContext;
pub use path::resolve_path;
pub use tool::{FnTool, Tool};
pub use types::{ParameterBuilder, ToolParameters};
pub use validation::validate_arguments;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::error::{Result, TillerError};
use crate::types::ToolCall;

/// Prefix of every failed tool result.
pub const TOOL_ERROR_PREFIX: &str = "Tool error:";

/// Name → tool mapping, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the full built-in catalogue.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for tool in builtin::all_tools() {
            let name = tool.name().to_string();
            let registered = registry.register(tool);
            debug_assert!(registered.is_ok(), "built-in tool '{name}' rejected: {registered:?}");
            if let Err(err) = registered {
                tracing::error!(tool = %name, error = %err, "built-in tool rejected");
            }
        }
        registry
    }

    /// Add a tool. Duplicate names and inconsistent schemas are rejected.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        if self.get(tool.name()).is_some() {
            return Err(TillerError::Configuration(format!(
                "tool '{}' is already registered",
                tool.name()
            )));
        }
        validation::check_schema(&tool.parameters().schema).map_err(|e| {
            TillerError::Configuration(format!("tool '{}' has an invalid schema: {e}", tool.name()))
        })?;
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a parsed call and return the text shown to the model.
    ///
    /// Never fails: every problem is rendered into the returned string.
    pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> String {
        let Some(tool) = self.get(&call.tool) else {
            let err = TillerError::UnknownTool {
                name: call.tool.clone(),
            };
            tracing::warn!(error = %err, "unknown tool requested");
            return format!("{err}. Available tools: {}", self.names().join(", "));
        };

        let args_value = call.args_value();
        if let Err(msg) = validate_arguments(&args_value, &tool.parameters().schema) {
            tracing::warn!(tool = %call.tool, error = %msg, "invalid tool arguments");
            return format!("{TOOL_ERROR_PREFIX} invalid arguments for {}: {msg}", call.tool);
        }

        let args = ToolArguments::new(args_value);
        tracing::debug!(tool = %call.tool, cwd = %ctx.cwd.display(), "executing tool");
        match AssertUnwindSafe(tool.execute(&args, ctx)).catch_unwind().await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                tracing::warn!(tool = %call.tool, error = %err, "tool failed");
                format!("{TOOL_ERROR_PREFIX} {}", error_message(&err))
            }
            Err(_) => {
                tracing::warn!(tool = %call.tool, "tool panicked");
                format!("{TOOL_ERROR_PREFIX} {} crashed while running", call.tool)
            }
        }
    }
}

/// Message for the model without the error-kind prefix where one is redundant.
fn error_message(err: &TillerError) -> String {
    match err {
        TillerError::Backend(msg) | TillerError::InvalidArgument(msg) => msg.clone(),
        TillerError::ToolExecution { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
