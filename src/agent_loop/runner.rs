//! Turn-by-turn driver: model call, tool-call parse, tool execution, repeat.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::AgentSettings;
use crate::editor::{strip_context_block, with_context};
use crate::error::{Result, TillerError};
use crate::parser::{parse_tool_call, strip_tool_artifacts};
use crate::provider::ModelProvider;
use crate::tools::{ToolContext, ToolRegistry, TOOL_ERROR_PREFIX};
use crate::types::{ChatMessage, GenerationSettings, Role};
use crate::util::{truncate_chars, truncate_with_marker};

use super::events::AgentUpdate;
use super::prompt::system_prompt;
use super::render::render_call;

/// Result of one completed turn.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final answer with tool-call artifacts removed.
    pub text: String,
    /// Transcript without the system prompt, ready to pass back as prior history.
    pub history: Vec<ChatMessage>,
    /// Model calls made during the turn.
    pub iterations: usize,
    /// True when the turn ended on the iteration cap.
    pub exhausted: bool,
}

/// Drives one agent turn against a provider and a tool registry.
///
/// A runner holds no per-turn state, so one instance can serve any number
/// of sequential turns.
pub struct AgentRunner {
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    context: ToolContext,
    settings: AgentSettings,
    generation: GenerationSettings,
    system_prompt: String,
}

impl AgentRunner {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        registry: Arc<ToolRegistry>,
        context: ToolContext,
    ) -> Self {
        let system_prompt = system_prompt(&registry);
        Self {
            provider,
            registry,
            context,
            settings: AgentSettings::default(),
            generation: GenerationSettings::default(),
            system_prompt,
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_generation_settings(mut self, generation: GenerationSettings) -> Self {
        self.generation = generation;
        self
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run one user turn to completion.
    ///
    /// `prior_history` is never modified; the returned outcome carries the
    /// new history. Provider failures emit an `Error` update and abort the
    /// turn. A tripped `cancel` token yields [`TillerError::Aborted`] at the
    /// next iteration boundary without any further update.
    pub async fn run(
        &self,
        user_message: &str,
        prior_history: &[ChatMessage],
        on_update: impl Fn(AgentUpdate),
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        let max_iterations = self.settings.max_iterations;
        tracing::info!(
            %run_id,
            provider = self.provider.provider_name(),
            model = self.provider.model_id(),
            cwd = %self.context.cwd.display(),
            "agent turn started"
        );

        let mut transcript = Vec::with_capacity(prior_history.len() + 2);
        transcript.push(ChatMessage::system(self.system_prompt.clone()));
        transcript.extend(prior_history.iter().filter(|m| !m.is_system()).map(|m| {
            if m.role == Role::User {
                ChatMessage::user(strip_context_block(&m.content))
            } else {
                m.clone()
            }
        }));
        let user_index = transcript.len();
        let editor = self.context.editor.snapshot();
        transcript.push(ChatMessage::user(with_context(user_message, &editor)));

        let mut final_text = None;
        let mut iterations = 0;
        // Reminders consumed by this turn go back to the queue if it fails.
        let mut injected = Vec::new();

        while iterations < max_iterations {
            if cancel.is_cancelled() {
                tracing::info!(%run_id, iteration = iterations, "agent turn cancelled");
                self.context.scheduler.requeue(injected);
                return Err(TillerError::Aborted);
            }
            iterations += 1;

            for reminder in self.context.scheduler.drain_due() {
                tracing::debug!(%run_id, "injecting due reminder");
                transcript.push(ChatMessage::user(reminder.as_user_message()));
                injected.push(reminder);
            }

            on_update(AgentUpdate::Thinking {
                text: thinking_text(iterations, max_iterations),
            });
            let reply = match self.provider.agent_chat(&transcript, &self.generation).await {
                Ok(reply) => reply,
                Err(err) => {
                    tracing::warn!(%run_id, iteration = iterations, error = %err, "model call failed");
                    on_update(AgentUpdate::Error {
                        message: err.to_string(),
                    });
                    self.context.scheduler.requeue(injected);
                    return Err(err);
                }
            };

            let Some(call) = parse_tool_call(&reply) else {
                let text = strip_tool_artifacts(&reply);
                transcript.push(ChatMessage::assistant(reply));
                on_update(AgentUpdate::Response { text: text.clone() });
                final_text = Some(text);
                break;
            };

            tracing::debug!(%run_id, iteration = iterations, tool = %call.tool, "tool call parsed");
            on_update(AgentUpdate::Tool {
                call: render_call(&call, self.settings.call_arg_preview),
            });
            transcript.push(ChatMessage::assistant(reply));

            let result = self.registry.execute(&call, &self.context).await;
            if result.starts_with(TOOL_ERROR_PREFIX) {
                tracing::warn!(%run_id, tool = %call.tool, "tool reported an error");
            }
            let stored = truncate_with_marker(&result, self.settings.tool_result_limit);
            on_update(AgentUpdate::ToolResult {
                tool: call.tool.clone(),
                preview: preview(&result, self.settings.tool_preview_limit),
            });
            transcript.push(ChatMessage::user(format!(
                "Tool result for {}:\n{stored}",
                call.tool
            )));

            if iterations < max_iterations {
                self.pause(cancel).await;
            }
        }

        let exhausted = final_text.is_none();
        let text = match final_text {
            Some(text) => text,
            None => {
                let text = exhausted_message(max_iterations);
                tracing::warn!(%run_id, max_iterations, "iteration cap reached");
                transcript.push(ChatMessage::assistant(text.clone()));
                on_update(AgentUpdate::Response { text: text.clone() });
                text
            }
        };

        // Stored history keeps the user's words, not the editor snapshot.
        transcript[user_index] = ChatMessage::user(user_message);
        transcript.remove(0);

        tracing::info!(%run_id, iterations, exhausted, "agent turn finished");
        Ok(RunOutcome {
            text,
            history: transcript,
            iterations,
            exhausted,
        })
    }

    async fn pause(&self, cancel: &CancellationToken) {
        if self.settings.iteration_delay_ms == 0 {
            return;
        }
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(Duration::from_millis(self.settings.iteration_delay_ms)) => {}
        }
    }
}

fn thinking_text(iteration: usize, max_iterations: usize) -> String {
    if iteration == 1 {
        "Thinking...".to_string()
    } else {
        format!("Thinking (step {iteration}/{max_iterations})...")
    }
}

fn preview(result: &str, max_chars: usize) -> String {
    let cut = truncate_chars(result, max_chars);
    if cut.len() < result.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}

/// Assistant message used when a turn runs out of iterations.
pub fn exhausted_message(max_iterations: usize) -> String {
    format!(
        "I reached maximum iterations ({max_iterations}) before finishing. \
         The task may be partially complete; review the changes so far and ask me to continue."
    )
}
