//! Provider adapters: one chat interface over local and hosted model APIs.

pub(crate) mod format;
pub mod http;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "google")]
pub mod google;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TillerConfig;
use crate::error::{Result, TillerError};
use crate::models::{ModelSpec, ProviderKey};
use crate::parser::bare_json;
use crate::types::{ChatMessage, GenerationSettings};

/// A request sent to a provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ChatMessage>,
    pub settings: GenerationSettings,
}

/// Token accounting reported by a provider, when it reports any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Raw response from a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub finish_reason: Option<String>,
}

/// A single-shot generation request outside the agent loop.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub system: Option<String>,
    pub prompt: String,
    /// Ask for strict JSON output and parse it into [`GenerateResult::json`].
    pub force_json: bool,
    pub settings: GenerationSettings,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.force_json = true;
        self
    }
}

/// Result of [`ModelProvider::generate`].
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub text: String,
    pub json: Option<serde_json::Value>,
}

/// Core provider trait: every model backend implements this.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g. "ollama", "openai").
    fn provider_name(&self) -> &str;

    /// Model ID used on the wire.
    fn model_id(&self) -> &str;

    /// Send a transcript and return the full response text.
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Cheap reachability check. Hosted providers assume yes.
    async fn is_available(&self) -> bool {
        true
    }

    /// Chat entry point used by the agent loop.
    async fn agent_chat(
        &self,
        messages: &[ChatMessage],
        settings: &GenerationSettings,
    ) -> Result<String> {
        let request = ProviderRequest {
            messages: messages.to_vec(),
            settings: settings.clone(),
        };
        let response = self.complete(&request).await?;
        tracing::debug!(
            provider = self.provider_name(),
            model = self.model_id(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model call finished"
        );
        Ok(response.text)
    }

    /// Single-shot generation, optionally forcing a JSON object response.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResult> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(request.prompt.clone()));

        let settings = if request.force_json {
            request.settings.force_json()
        } else {
            request.settings.clone()
        };
        let response = self.complete(&ProviderRequest { messages, settings }).await?;

        let json = if request.force_json {
            Some(extract_json(&response.text).ok_or_else(|| TillerError::Provider {
                provider: self.provider_name().to_string(),
                message: "response was not valid JSON".to_string(),
            })?)
        } else {
            None
        };
        Ok(GenerateResult {
            text: response.text,
            json,
        })
    }
}

/// Pull a JSON object out of a model response.
///
/// Models in JSON mode still sometimes wrap output in a code fence or add a
/// sentence around it, so the first balanced object wins.
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return Some(value);
    }
    bare_json::balanced_objects(trimmed)
        .into_iter()
        .find_map(|candidate| serde_json::from_str(candidate).ok())
}

/// Create a provider for the given model.
pub fn create_provider(
    spec: &ModelSpec,
    config: &TillerConfig,
) -> Result<Arc<dyn ModelProvider>> {
    let base_url = config.get_base_url(spec.provider_name());
    let api_key = |provider: ProviderKey| -> Result<String> {
        config.get_api_key(provider.as_str()).ok_or_else(|| {
            TillerError::Authentication(format!(
                "Missing {}",
                provider.api_key_env().unwrap_or("API key")
            ))
        })
    };

    match spec.provider {
        #[cfg(feature = "ollama")]
        ProviderKey::Ollama => Ok(Arc::new(ollama::OllamaProvider::new(
            spec.model_id.clone(),
            base_url,
        ))),
        #[cfg(feature = "openai")]
        ProviderKey::OpenAi => Ok(Arc::new(openai::OpenAiProvider::new(
            spec.model_id.clone(),
            api_key(ProviderKey::OpenAi)?,
            base_url,
        ))),
        #[cfg(feature = "anthropic")]
        ProviderKey::Anthropic => Ok(Arc::new(anthropic::AnthropicProvider::new(
            spec.model_id.clone(),
            api_key(ProviderKey::Anthropic)?,
            base_url,
        ))),
        #[cfg(feature = "google")]
        ProviderKey::Google => Ok(Arc::new(google::GoogleProvider::new(
            spec.model_id.clone(),
            api_key(ProviderKey::Google)?,
            base_url,
        ))),
        #[allow(unreachable_patterns)]
        other => Err(TillerError::Configuration(format!(
            "Provider '{}' not enabled. Enable the '{}' feature.",
            other.as_str(),
            other.as_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_handles_prose_and_fences() {
        assert_eq!(extract_json(r#"{"a":1}"#).unwrap()["a"], 1);
        assert_eq!(
            extract_json("Sure:\n```json\n{\"a\": 2}\n```").unwrap()["a"],
            2
        );
        assert!(extract_json("no json here").is_none());
    }

    #[cfg(feature = "openai")]
    #[test]
    fn create_provider_requires_hosted_key() {
        let config = TillerConfig::new();
        let spec: ModelSpec = "openai:gpt-4o".parse().unwrap();
        match create_provider(&spec, &config) {
            Err(TillerError::Authentication(msg)) => assert!(msg.contains("OPENAI_API_KEY")),
            other => panic!("expected auth error, got {:?}", other.map(|p| p.model_id().to_string())),
        }
    }

    #[cfg(feature = "ollama")]
    #[test]
    fn create_provider_local_needs_no_key() {
        let config = TillerConfig::new();
        let spec: ModelSpec = "ollama:llama3.1".parse().unwrap();
        let provider = create_provider(&spec, &config).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_id(), "llama3.1");
    }
}
