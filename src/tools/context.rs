//! Per-run environment handed to every tool handler.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::backend::{self, Backend};
use crate::editor::SharedEditorState;
use crate::error::Result;
use crate::scheduler::ReminderScheduler;

use super::path::{display_path, resolve_path};

/// What a tool can reach: the workspace root, the command backend, the
/// editor's open documents, and the reminder queue.
#[derive(Clone)]
pub struct ToolContext {
    pub cwd: PathBuf,
    pub backend: Arc<dyn Backend>,
    pub editor: SharedEditorState,
    pub scheduler: ReminderScheduler,
    /// Default wait before `run_terminal_cmd` backgrounds a command.
    pub command_timeout: Duration,
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("cwd", &self.cwd)
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}

impl ToolContext {
    pub fn new(cwd: impl Into<PathBuf>, backend: Arc<dyn Backend>) -> Self {
        Self {
            cwd: cwd.into(),
            backend,
            editor: SharedEditorState::default(),
            scheduler: ReminderScheduler::new(),
            command_timeout: Duration::from_millis(backend::process::DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_editor(mut self, editor: SharedEditorState) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_scheduler(mut self, scheduler: ReminderScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn resolve(&self, raw: &str) -> PathBuf {
        resolve_path(&self.cwd, raw)
    }

    pub fn display(&self, path: &Path) -> String {
        display_path(&self.cwd, path)
    }

    pub async fn invoke(&self, command: &str, args: Value) -> Result<Value> {
        self.backend.invoke(command, args).await
    }

    pub async fn invoke_as<T: serde::de::DeserializeOwned>(
        &self,
        command: &str,
        args: Value,
    ) -> Result<T> {
        backend::invoke_as(self.backend.as_ref(), command, args).await
    }
}
