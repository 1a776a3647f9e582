//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::context::ToolContext;
use super::types::ToolParameters;
use crate::error::Result;

/// A named operation the model can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in a call.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> &ToolParameters;

    /// One example call shown in the system prompt.
    fn example(&self) -> Option<&str> {
        None
    }

    /// Run the tool. The returned text is shown to the model.
    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<String>;
}

type ToolHandler = dyn Fn(ToolArguments, ToolContext) -> Pin<Box<dyn Future<Output = Result<String>> + Send>>
    + Send
    + Sync;

/// Tool built from a closure.
pub struct FnTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    example: Option<String>,
    handler: Arc<ToolHandler>,
}

impl FnTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            example: None,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    fn example(&self) -> Option<&str> {
        self.example.as_deref()
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<String> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
