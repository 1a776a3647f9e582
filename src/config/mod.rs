//! Configuration system (layered: code > env > settings file).

pub mod settings;

pub use settings::{AgentSettings, ProviderSettings, SettingsFile};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::models::ProviderKey;

/// Provider credentials and endpoints.
///
/// Resolution order for API keys and base URLs:
/// 1. Explicit values (`set_api_key` / `set_base_url`)
/// 2. Environment variables (and `.env`, loaded by [`TillerConfig::from_env`])
/// 3. `[providers.<name>]` tables in the settings file
#[derive(Debug, Clone, Default)]
pub struct TillerConfig {
    api_keys: Arc<RwLock<HashMap<String, String>>>,
    base_urls: Arc<RwLock<HashMap<String, String>>>,
    agent: AgentSettings,
}

impl TillerConfig {
    /// Create an empty config with default agent settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the user settings file, then environment variables
    /// (OPENAI_API_KEY, ANTHROPIC_API_KEY, etc.) on top.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::layered(SettingsFile::load(), |name| std::env::var(name).ok())
    }

    /// Build from a parsed settings file with values from `env` taking precedence.
    pub fn layered(file: SettingsFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut agent = file.agent;
        agent.apply_env(&env);
        let config = Self::new().with_agent_settings(agent);

        for (name, entry) in &file.providers {
            let Some(provider) = ProviderKey::parse(name) else {
                tracing::warn!(provider = %name, "ignoring settings for unknown provider");
                continue;
            };
            if let Some(key) = entry.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
                config.set_api_key(provider.as_str(), key.clone());
            }
            if let Some(url) = &entry.base_url {
                config.set_base_url(provider.as_str(), url.clone());
            }
        }

        let env_mappings = [
            ("OPENAI_API_KEY", ProviderKey::OpenAi),
            ("ANTHROPIC_API_KEY", ProviderKey::Anthropic),
            ("GOOGLE_API_KEY", ProviderKey::Google),
            ("GEMINI_API_KEY", ProviderKey::Google),
        ];
        for (env_var, provider) in &env_mappings {
            if let Some(key) = env(env_var) {
                if !key.trim().is_empty() {
                    config.set_api_key(provider.as_str(), key);
                }
            }
        }

        let url_mappings = [
            ("OPENAI_BASE_URL", ProviderKey::OpenAi),
            ("ANTHROPIC_BASE_URL", ProviderKey::Anthropic),
            ("GOOGLE_BASE_URL", ProviderKey::Google),
            ("OLLAMA_BASE_URL", ProviderKey::Ollama),
        ];
        for (env_var, provider) in &url_mappings {
            if let Some(url) = env(env_var) {
                config.set_base_url(provider.as_str(), url);
            }
        }

        config
    }

    pub fn with_agent_settings(mut self, agent: AgentSettings) -> Self {
        self.agent = agent;
        self
    }

    pub fn agent_settings(&self) -> &AgentSettings {
        &self.agent
    }

    pub fn set_api_key(&self, provider: &str, key: String) {
        if let Ok(mut keys) = self.api_keys.write() {
            keys.insert(provider.to_string(), key);
        }
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys.read().ok()?.get(provider).cloned()
    }

    pub fn set_base_url(&self, provider: &str, url: String) {
        if let Ok(mut urls) = self.base_urls.write() {
            urls.insert(provider.to_string(), url.trim_end_matches('/').to_string());
        }
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls.read().ok()?.get(provider).cloned()
    }

    /// Check if a provider has what it needs to make a call.
    pub fn has_credentials(&self, provider: ProviderKey) -> bool {
        provider.is_local() || self.get_api_key(provider.as_str()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_keys_round_trip() {
        let config = TillerConfig::new();
        config.set_api_key("openai", "sk-test".to_string());
        assert_eq!(config.get_api_key("openai").as_deref(), Some("sk-test"));
        assert_eq!(config.get_api_key("anthropic"), None);
    }

    #[test]
    fn base_urls_drop_trailing_slash() {
        let config = TillerConfig::new();
        config.set_base_url("ollama", "http://127.0.0.1:11434/".to_string());
        assert_eq!(
            config.get_base_url("ollama").as_deref(),
            Some("http://127.0.0.1:11434")
        );
    }

    #[test]
    fn local_provider_never_needs_credentials() {
        let config = TillerConfig::new();
        assert!(config.has_credentials(ProviderKey::Ollama));
        assert!(!config.has_credentials(ProviderKey::Google));
    }

    #[test]
    fn clones_share_key_tables() {
        let config = TillerConfig::new();
        let clone = config.clone();
        clone.set_api_key("google", "g-key".to_string());
        assert_eq!(config.get_api_key("google").as_deref(), Some("g-key"));
    }
}
