//! In-process backend serving every command against the local machine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::browser::{BrowserDriver, FetchBrowser};
use super::commands::*;
use super::process::{ProcessTable, DEFAULT_TIMEOUT_MS};
use super::search::{self, SearchOptions};
use super::{fs, Backend};
use crate::error::{Result, TillerError};

/// Backend that touches the local filesystem, spawns local processes, and
/// drives a [`BrowserDriver`].
#[derive(Clone)]
pub struct LocalBackend {
    processes: ProcessTable,
    browser: Arc<dyn BrowserDriver>,
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackend")
            .field("processes", &self.processes)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct PathArgs {
    path: String,
}

#[derive(Deserialize)]
struct WriteArgs {
    path: String,
    content: String,
}

#[derive(Deserialize)]
struct ExecArgs {
    command: String,
    #[serde(default)]
    cwd: String,
    timeout_ms: Option<u64>,
}

#[derive(Deserialize)]
struct PidArgs {
    pid: String,
}

#[derive(Deserialize)]
struct ReplaceArgs {
    file_path: String,
    search: String,
    replace: String,
    #[serde(default)]
    all: bool,
}

#[derive(Deserialize)]
struct UrlArgs {
    url: String,
}

#[derive(Deserialize)]
struct LabelArgs {
    label: String,
}

#[derive(Deserialize)]
struct ScriptArgs {
    label: String,
    script: String,
}

#[derive(Deserialize)]
struct SelectorArgs {
    label: String,
    selector: String,
}

#[derive(Deserialize)]
struct TypeArgs {
    label: String,
    selector: String,
    text: String,
}

fn parse_args<T: DeserializeOwned>(command: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| TillerError::backend(format!("{command}: invalid arguments: {e}")))
}

impl LocalBackend {
    pub fn new() -> Self {
        Self::with_browser(Arc::new(FetchBrowser::new()))
    }

    pub fn with_browser(browser: Arc<dyn BrowserDriver>) -> Self {
        Self {
            processes: ProcessTable::new(),
            browser,
        }
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value> {
        tracing::trace!(command, "backend invoke");
        match command {
            READ_FILE => {
                let a: PathArgs = parse_args(command, args)?;
                Ok(Value::String(fs::read_file(Path::new(&a.path)).await?))
            }
            WRITE_FILE => {
                let a: WriteArgs = parse_args(command, args)?;
                fs::write_file(Path::new(&a.path), &a.content).await?;
                Ok(Value::Null)
            }
            LIST_DIR => {
                let a: PathArgs = parse_args(command, args)?;
                Ok(serde_json::to_value(fs::list_dir(Path::new(&a.path)).await?)?)
            }
            LIST_FILES => {
                let a: PathArgs = parse_args(command, args)?;
                let files: Vec<String> = fs::list_files(Path::new(&a.path))
                    .await?
                    .into_iter()
                    .map(|p| p.to_string_lossy().to_string())
                    .collect();
                Ok(json!(files))
            }
            GET_BASENAME => {
                let a: PathArgs = parse_args(command, args)?;
                Ok(Value::String(fs::get_basename(&a.path)))
            }
            RIPGREP_SEARCH => {
                let opts: SearchOptions = parse_args(command, args)?;
                Ok(serde_json::to_value(search::search(opts).await?)?)
            }
            SEARCH_REPLACE => {
                let a: ReplaceArgs = parse_args(command, args)?;
                let count =
                    fs::search_replace(Path::new(&a.file_path), &a.search, &a.replace, a.all)
                        .await?;
                Ok(json!(count))
            }
            EXEC_BACKGROUND_CMD => {
                let a: ExecArgs = parse_args(command, args)?;
                let timeout = Duration::from_millis(a.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
                let result = self
                    .processes
                    .exec(&a.command, &PathBuf::from(a.cwd), timeout)
                    .await?;
                Ok(serde_json::to_value(result)?)
            }
            CHECK_BACKGROUND_CMD => {
                let a: PidArgs = parse_args(command, args)?;
                Ok(serde_json::to_value(self.processes.check(&a.pid).await?)?)
            }
            KILL_BACKGROUND_CMD => {
                let a: PidArgs = parse_args(command, args)?;
                self.processes.kill(&a.pid).await?;
                Ok(Value::Null)
            }
            AGENT_SPAWN => {
                let a: UrlArgs = parse_args(command, args)?;
                Ok(Value::String(self.browser.spawn(&a.url).await?))
            }
            AGENT_EXECUTE => {
                let a: ScriptArgs = parse_args(command, args)?;
                self.browser.execute(&a.label, &a.script).await?;
                Ok(Value::Null)
            }
            AGENT_CLICK => {
                let a: SelectorArgs = parse_args(command, args)?;
                self.browser.click(&a.label, &a.selector).await?;
                Ok(Value::Null)
            }
            AGENT_TYPE => {
                let a: TypeArgs = parse_args(command, args)?;
                self.browser.type_text(&a.label, &a.selector, &a.text).await?;
                Ok(Value::Null)
            }
            AGENT_SCROLL => {
                let a: SelectorArgs = parse_args(command, args)?;
                self.browser.scroll(&a.label, &a.selector).await?;
                Ok(Value::Null)
            }
            AGENT_HOVER => {
                let a: SelectorArgs = parse_args(command, args)?;
                self.browser.hover(&a.label, &a.selector).await?;
                Ok(Value::Null)
            }
            AGENT_GET_CONTENT => {
                let a: LabelArgs = parse_args(command, args)?;
                Ok(Value::String(self.browser.get_content(&a.label).await?))
            }
            AGENT_CLOSE => {
                let a: LabelArgs = parse_args(command, args)?;
                self.browser.close(&a.label).await?;
                Ok(Value::Null)
            }
            other => Err(TillerError::backend(format!("unknown command '{other}'"))),
        }
    }
}
