//! Per-panel agent session: owns history, the visible conversation, and the
//! cancel signal for the turn in flight.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio_util::sync::CancellationToken;

use crate::agent_loop::{AgentRunner, AgentUpdate};
use crate::backend::LocalBackend;
use crate::config::AgentSettings;
use crate::editor::SharedEditorState;
use crate::error::{Result, TillerError};
use crate::provider::ModelProvider;
use crate::scheduler::Reminder;
use crate::tools::{ToolContext, ToolRegistry};
use crate::types::ChatMessage;

/// Who wrote a visible conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryRole {
    User,
    Assistant,
    Error,
}

/// One line of the user-facing chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: EntryRole,
    pub text: String,
}

impl ConversationEntry {
    fn new(role: EntryRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Trips the cancel token of whatever turn a session is running.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<Mutex<CancellationToken>>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).cancel();
    }

    fn fresh(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        token
    }
}

/// An independent agent conversation.
///
/// Sessions share nothing mutable with each other, so several can run at
/// once against different workspaces.
pub struct AgentSession {
    runner: AgentRunner,
    history: Vec<ChatMessage>,
    conversation: Vec<ConversationEntry>,
    cancel: CancelHandle,
}

impl AgentSession {
    pub fn new(runner: AgentRunner) -> Self {
        Self {
            runner,
            history: Vec::new(),
            conversation: Vec::new(),
            cancel: CancelHandle::default(),
        }
    }

    /// Session over the local filesystem rooted at `cwd` with the built-in tools.
    pub fn local(
        provider: Arc<dyn ModelProvider>,
        cwd: impl Into<PathBuf>,
        settings: AgentSettings,
    ) -> Self {
        let context = ToolContext::new(cwd, Arc::new(LocalBackend::new())).with_command_timeout(
            std::time::Duration::from_millis(settings.command_timeout_ms),
        );
        let runner = AgentRunner::new(provider, Arc::new(ToolRegistry::builtin()), context)
            .with_settings(settings);
        Self::new(runner)
    }

    /// Run one turn for `message`.
    ///
    /// On success the history is replaced with the turn's transcript. A
    /// provider failure leaves history untouched and adds an error entry to
    /// the conversation. Cancellation returns [`TillerError::Aborted`] and
    /// records nothing beyond the user's message.
    pub async fn send(
        &mut self,
        message: &str,
        on_update: impl Fn(AgentUpdate),
    ) -> Result<String> {
        let token = self.cancel.fresh();
        self.conversation
            .push(ConversationEntry::new(EntryRole::User, message));

        match self
            .runner
            .run(message, &self.history, on_update, &token)
            .await
        {
            Ok(outcome) => {
                self.history = outcome.history;
                self.conversation
                    .push(ConversationEntry::new(EntryRole::Assistant, outcome.text.clone()));
                Ok(outcome.text)
            }
            Err(TillerError::Aborted) => Err(TillerError::Aborted),
            Err(err) => {
                self.conversation
                    .push(ConversationEntry::new(EntryRole::Error, err.to_string()));
                Err(err)
            }
        }
    }

    /// Cancel the running turn at its next iteration boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Handle that can cancel turns from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Reminders that came due after the last turn finished.
    pub fn take_due_reminders(&self) -> Vec<Reminder> {
        self.runner.context().scheduler.drain_due()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn conversation(&self) -> &[ConversationEntry] {
        &self.conversation
    }

    pub fn editor(&self) -> &SharedEditorState {
        &self.runner.context().editor
    }

    pub fn runner(&self) -> &AgentRunner {
        &self.runner
    }

    /// Forget the conversation. Pending reminders are kept.
    pub fn clear(&mut self) {
        self.history.clear();
        self.conversation.clear();
    }

    /// Cancel the current turn and drop pending reminder timers.
    pub fn shutdown(&self) {
        self.cancel();
        self.runner.context().scheduler.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_handle_trips_latest_token() {
        let handle = CancelHandle::default();
        let first = handle.fresh();
        let second = handle.fresh();
        handle.cancel();
        assert!(!first.is_cancelled());
        assert!(second.is_cancelled());
    }

    #[test]
    fn entry_roles_display_lowercase() {
        assert_eq!(EntryRole::Error.to_string(), "error");
    }
}
