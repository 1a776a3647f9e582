//! Shared test helpers and scripted provider.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tiller::agent_loop::{AgentRunner, AgentUpdate};
use tiller::backend::LocalBackend;
use tiller::config::AgentSettings;
use tiller::error::{Result, TillerError};
use tiller::provider::{ModelProvider, ProviderRequest, ProviderResponse, Usage};
use tiller::tools::{ToolContext, ToolRegistry};
use tiller::types::ChatMessage;

/// A provider that replays queued replies and records every transcript it is sent.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String>>>,
    fallback: Option<String>,
    transcripts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: None,
            transcripts: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `text` whenever the queue is empty.
    pub fn always(text: &str) -> Self {
        Self {
            fallback: Some(text.to_string()),
            ..Self::new()
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: TillerError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.transcripts.lock().unwrap().len()
    }

    pub fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.transcripts.lock().unwrap().clone()
    }

    pub fn last_transcript(&self) -> Vec<ChatMessage> {
        self.transcripts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        self.transcripts
            .lock()
            .unwrap()
            .push(request.messages.clone());
        let next = self.replies.lock().unwrap().pop_front();
        let text = match next {
            Some(reply) => reply?,
            None => self
                .fallback
                .clone()
                .unwrap_or_else(|| "Nothing left to say.".to_string()),
        };
        Ok(ProviderResponse {
            text,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
            },
            finish_reason: Some("stop".to_string()),
        })
    }
}

/// Settings with no pause between iterations.
pub fn fast_settings(max_iterations: usize) -> AgentSettings {
    AgentSettings {
        max_iterations,
        iteration_delay_ms: 0,
        ..AgentSettings::default()
    }
}

/// Runner over the local filesystem rooted at `cwd` with the built-in tools.
pub fn runner(
    provider: Arc<ScriptedProvider>,
    cwd: &Path,
    settings: AgentSettings,
) -> AgentRunner {
    let context = ToolContext::new(cwd, Arc::new(LocalBackend::new()));
    AgentRunner::new(provider, Arc::new(ToolRegistry::builtin()), context).with_settings(settings)
}

/// Update callback that collects everything it sees.
pub fn collector() -> (Arc<Mutex<Vec<AgentUpdate>>>, impl Fn(AgentUpdate)) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let seen = Arc::clone(&seen);
        move |update: AgentUpdate| seen.lock().unwrap().push(update)
    };
    (seen, sink)
}

/// A fenced tool-call reply.
pub fn tool_reply(tool: &str, args: serde_json::Value) -> String {
    format!(
        "Let me check.\n```tool\n{}\n```",
        serde_json::json!({ "tool": tool, "args": args })
    )
}
