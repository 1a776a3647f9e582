//! The user settings file: agent-loop tunables plus per-provider credentials,
//! loaded from `settings.toml` in the user config dir.
//!
//! ```toml
//! max_iterations = 40
//!
//! [providers.openai]
//! api_key = "sk-..."
//!
//! [providers.ollama]
//! base_url = "http://gpu-box:11434"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TillerError};

const MAX_ITERATIONS_ENV: &str = "TILLER_MAX_ITERATIONS";
const SETTINGS_FILE: &str = "settings.toml";

/// Limits and pacing for one agent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Model-call round-trips allowed in a single user turn.
    pub max_iterations: usize,
    /// Fixed pause between iterations that executed a tool.
    pub iteration_delay_ms: u64,
    /// Characters of a tool result kept in the transcript.
    pub tool_result_limit: usize,
    /// Characters of a tool result shown in the progress update.
    pub tool_preview_limit: usize,
    /// Characters of each string argument shown when rendering a call.
    pub call_arg_preview: usize,
    /// Default wait before a terminal command is moved to the background.
    pub command_timeout_ms: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            iteration_delay_ms: 500,
            tool_result_limit: 20_000,
            tool_preview_limit: 200,
            call_arg_preview: 60,
            command_timeout_ms: 5_000,
        }
    }
}

impl AgentSettings {
    /// Load settings from the default location, falling back to defaults.
    ///
    /// `TILLER_MAX_ITERATIONS` overrides the file value.
    pub fn load() -> Self {
        let mut settings = SettingsFile::load().agent;
        settings.apply_env(|name| std::env::var(name).ok());
        settings
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| TillerError::Configuration(e.to_string()))
    }

    pub(crate) fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(max) = env(MAX_ITERATIONS_ENV)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|max| *max > 0)
        {
            self.max_iterations = max;
        }
    }
}

/// One `[providers.<name>]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProvidersSection {
    providers: HashMap<String, ProviderSettings>,
}

/// Everything `settings.toml` holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsFile {
    pub agent: AgentSettings,
    /// Keyed by provider name as written in the file.
    pub providers: HashMap<String, ProviderSettings>,
}

impl SettingsFile {
    /// Read the default settings file. A missing or unreadable file yields defaults.
    pub fn load() -> Self {
        match default_settings_path() {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(file) => file,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let agent = AgentSettings::from_toml(raw)?;
        let section: ProvidersSection =
            toml::from_str(raw).map_err(|e| TillerError::Configuration(e.to_string()))?;
        Ok(Self {
            agent,
            providers: section.providers,
        })
    }
}

/// `<config dir>/tiller/settings.toml` for the current platform.
pub fn default_settings_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "tiller", "tiller")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}
