//! Google Gemini API provider.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, TillerError};
use crate::types::Role;

use super::format::split_system;
use super::http::{json_headers, post_json};
use super::{ModelProvider, ProviderRequest, ProviderResponse, Usage};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    model: String,
    api_key: String,
    base_url: String,
}

impl GoogleProvider {
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
        let contents: Vec<serde_json::Value> = turns
            .iter()
            .map(|m| {
                let role = if m.role == Role::Assistant { "model" } else { "user" };
                serde_json::json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        let mut body = serde_json::json!({ "contents": contents });
        let obj = body.as_object_mut().expect("body is an object");
        if let Some(system) = system {
            obj.insert(
                "systemInstruction".into(),
                serde_json::json!({ "parts": [{ "text": system }] }),
            );
        }

        let settings = &request.settings;
        let mut config = serde_json::Map::new();
        if let Some(max) = settings.max_tokens {
            config.insert("maxOutputTokens".into(), max.into());
        }
        if let Some(t) = settings.temperature {
            config.insert("temperature".into(), t.into());
        }
        if let Some(p) = settings.top_p {
            config.insert("topP".into(), p.into());
        }
        if let Some(stops) = &settings.stop_sequences {
            config.insert("stopSequences".into(), serde_json::json!(stops));
        }
        if settings.wants_json() {
            config.insert("responseMimeType".into(), "application/json".into());
        }
        if !config.is_empty() {
            obj.insert("generationConfig".into(), serde_json::Value::Object(config));
        }
        body
    }
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let body = self.build_request_body(request);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        tracing::debug!(model = %self.model, "gemini generateContent");

        let data: GeminiResponse = post_json(&url, json_headers(), &body).await?;

        let candidate = data
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| TillerError::Provider {
                provider: "google".into(),
                message: "response contained no candidates".into(),
            })?;

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(ProviderResponse {
            text,
            usage: data
                .usage_metadata
                .map(|u| Usage {
                    input_tokens: u.prompt_token_count.unwrap_or(0),
                    output_tokens: u.candidates_token_count.unwrap_or(0),
                })
                .unwrap_or_default(),
            finish_reason: candidate.finish_reason,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}
