//! Ollama local daemon provider (native `/api/chat`).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

use super::format::role_name;
use super::http::{json_headers, post_json, shared_client};
use super::{ModelProvider, ProviderRequest, ProviderResponse, Usage};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct OllamaProvider {
    model: String,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(model: String, base_url: Option<String>) -> Self {
        Self {
            model,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| serde_json::json!({ "role": role_name(m.role), "content": m.content }))
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });

        let settings = &request.settings;
        let mut options = serde_json::Map::new();
        if let Some(t) = settings.temperature {
            options.insert("temperature".into(), t.into());
        }
        if let Some(p) = settings.top_p {
            options.insert("top_p".into(), p.into());
        }
        if let Some(max) = settings.max_tokens {
            options.insert("num_predict".into(), max.into());
        }
        if let Some(stops) = &settings.stop_sequences {
            options.insert("stop".into(), serde_json::json!(stops));
        }
        let obj = body.as_object_mut().expect("body is an object");
        if !options.is_empty() {
            obj.insert("options".into(), serde_json::Value::Object(options));
        }
        if settings.wants_json() {
            obj.insert("format".into(), "json".into());
        }
        body
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let body = self.build_request_body(request);
        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(model = %self.model, messages = request.messages.len(), "ollama chat");

        let data: OllamaChatResponse = post_json(&url, json_headers(), &body).await?;

        Ok(ProviderResponse {
            text: data.message.map(|m| m.content).unwrap_or_default(),
            usage: Usage {
                input_tokens: data.prompt_eval_count.unwrap_or(0),
                output_tokens: data.eval_count.unwrap_or(0),
            },
            finish_reason: data.done_reason,
        })
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match shared_client().get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "ollama daemon not reachable");
                false
            }
        }
    }
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
    done_reason: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatMessage, GenerationSettings};

    #[test]
    fn body_carries_json_format_and_options() {
        let provider = OllamaProvider::new("llama3.1".into(), Some("http://h:1/".into()));
        let request = ProviderRequest {
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            settings: GenerationSettings::builder()
                .temperature(0.2)
                .max_tokens(64)
                .build()
                .force_json(),
        };

        let body = provider.build_request_body(&request);

        assert_eq!(provider.base_url, "http://h:1");
        assert_eq!(body["format"], "json");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 64);
        assert_eq!(body["messages"][0]["role"], "system");
    }
}
