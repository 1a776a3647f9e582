//! The command backend the tools run against.
//!
//! Every side effect a tool performs goes through [`Backend::invoke`], a
//! string-keyed RPC. [`LocalBackend`] serves it in-process; an editor host can
//! substitute its own implementation.

pub mod browser;
pub mod fs;
pub mod local;
pub mod process;
pub mod search;

pub use browser::{BrowserDriver, FetchBrowser};
pub use fs::FileEntry;
pub use local::LocalBackend;
pub use process::{CmdResult, CmdStatus, ProcessTable};
pub use search::SearchMatch;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, TillerError};

/// Backend command names.
pub mod commands {
    pub const READ_FILE: &str = "read_file";
    pub const WRITE_FILE: &str = "write_file";
    pub const LIST_DIR: &str = "list_dir";
    pub const LIST_FILES: &str = "list_files";
    pub const GET_BASENAME: &str = "get_basename";
    pub const RIPGREP_SEARCH: &str = "ripgrep_search";
    pub const SEARCH_REPLACE: &str = "search_replace";
    pub const EXEC_BACKGROUND_CMD: &str = "exec_background_cmd";
    pub const CHECK_BACKGROUND_CMD: &str = "check_background_cmd";
    pub const KILL_BACKGROUND_CMD: &str = "kill_background_cmd";
    pub const AGENT_SPAWN: &str = "agent_spawn";
    pub const AGENT_EXECUTE: &str = "agent_execute";
    pub const AGENT_CLICK: &str = "agent_click";
    pub const AGENT_TYPE: &str = "agent_type";
    pub const AGENT_SCROLL: &str = "agent_scroll";
    pub const AGENT_HOVER: &str = "agent_hover";
    pub const AGENT_GET_CONTENT: &str = "agent_get_content";
    pub const AGENT_CLOSE: &str = "agent_close";
}

/// String-keyed command RPC.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run a backend command with JSON arguments.
    async fn invoke(&self, command: &str, args: Value) -> Result<Value>;
}

/// Invoke a command and decode its result.
pub async fn invoke_as<T: DeserializeOwned>(
    backend: &dyn Backend,
    command: &str,
    args: Value,
) -> Result<T> {
    let value = backend.invoke(command, args).await?;
    serde_json::from_value(value).map_err(|e| {
        TillerError::backend(format!("{command}: unexpected result shape: {e}"))
    })
}
