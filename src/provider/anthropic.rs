//! Anthropic Messages API provider.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

use super::format::{role_name, split_system, JSON_ONLY_INSTRUCTION};
use super::http::{anthropic_headers, post_json};
use super::{ModelProvider, ProviderRequest, ProviderResponse, Usage};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicProvider {
    model: String,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Self {
        Self {
            model,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let (system, turns) = split_system(&request.messages);
        let settings = &request.settings;

        let system = match (system, settings.wants_json()) {
            (Some(s), true) => Some(format!("{s}\n\n{JSON_ONLY_INSTRUCTION}")),
            (None, true) => Some(JSON_ONLY_INSTRUCTION.to_string()),
            (s, false) => s,
        };

        let messages: Vec<serde_json::Value> = turns
            .iter()
            .map(|m| serde_json::json!({ "role": role_name(m.role), "content": m.content }))
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": settings.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });

        let obj = body.as_object_mut().expect("body is an object");
        if let Some(system) = system {
            obj.insert("system".into(), system.into());
        }
        if let Some(t) = settings.temperature {
            obj.insert("temperature".into(), t.into());
        }
        if let Some(p) = settings.top_p {
            obj.insert("top_p".into(), p.into());
        }
        if let Some(stops) = &settings.stop_sequences {
            obj.insert("stop_sequences".into(), serde_json::json!(stops));
        }
        body
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let body = self.build_request_body(request);
        let url = format!("{}/messages", self.base_url);
        tracing::debug!(model = %self.model, "anthropic messages request");

        let data: AnthropicResponse =
            post_json(&url, anthropic_headers(&self.api_key, API_VERSION), &body).await?;

        let text = data
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(ProviderResponse {
            text,
            usage: data
                .usage
                .map(|u| Usage {
                    input_tokens: u.input_tokens,
                    output_tokens: u.output_tokens,
                })
                .unwrap_or_default(),
            finish_reason: data.stop_reason,
        })
    }
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
