//! OpenAI Chat Completions API provider.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, TillerError};

use super::format::role_name;
use super::http::{bearer_headers, post_json};
use super::{ModelProvider, ProviderRequest, ProviderResponse, Usage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
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
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| serde_json::json!({ "role": role_name(m.role), "content": m.content }))
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        let settings = &request.settings;
        let obj = body.as_object_mut().expect("body is an object");
        if let Some(max) = settings.max_tokens {
            obj.insert("max_tokens".into(), max.into());
        }
        if let Some(t) = settings.temperature {
            obj.insert("temperature".into(), t.into());
        }
        if let Some(p) = settings.top_p {
            obj.insert("top_p".into(), p.into());
        }
        if let Some(stops) = &settings.stop_sequences {
            obj.insert("stop".into(), serde_json::json!(stops));
        }
        if settings.wants_json() {
            obj.insert(
                "response_format".into(),
                serde_json::json!({"type": "json_object"}),
            );
        }
        body
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, "openai chat completion");

        let data: OpenAiChatResponse = post_json(&url, bearer_headers(&self.api_key), &body).await?;

        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TillerError::Provider {
                provider: "openai".into(),
                message: "response contained no choices".into(),
            })?;

        Ok(ProviderResponse {
            text: choice.message.content.unwrap_or_default(),
            usage: data
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                })
                .unwrap_or_default(),
            finish_reason: choice.finish_reason,
        })
    }
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
