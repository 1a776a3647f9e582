//! HTTP-level tests for the provider adapters.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tiller::config::TillerConfig;
use tiller::error::TillerError;
use tiller::models::ModelSpec;
use tiller::provider::anthropic::AnthropicProvider;
use tiller::provider::google::GoogleProvider;
use tiller::provider::ollama::OllamaProvider;
use tiller::provider::openai::OpenAiProvider;
use tiller::provider::{create_provider, GenerateRequest, ModelProvider};
use tiller::types::{ChatMessage, GenerationSettings};

fn transcript() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("You are terse."),
        ChatMessage::user("Say hi"),
    ]
}

#[tokio::test]
async fn ollama_chat_posts_messages_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.1",
            "stream": false,
            "messages": [
                {"role": "system", "content": "You are terse."},
                {"role": "user", "content": "Say hi"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "hi"},
            "done_reason": "stop",
            "prompt_eval_count": 12,
            "eval_count": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaProvider::new("llama3.1".into(), Some(server.uri()));
    let text = provider
        .agent_chat(&transcript(), &GenerationSettings::default())
        .await
        .unwrap();
    assert_eq!(text, "hi");
}

#[tokio::test]
async fn ollama_availability_probes_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .mount(&server)
        .await;

    let up = OllamaProvider::new("llama3.1".into(), Some(server.uri()));
    assert!(up.is_available().await);

    // Nothing listens on port 9 in the test environment.
    let down = OllamaProvider::new("llama3.1".into(), Some("http://127.0.0.1:9".into()));
    assert!(!down.is_available().await);
}

#[tokio::test]
async fn openai_chat_completions_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "hello"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 1}
        })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("gpt-4o".into(), "sk-test".into(), Some(server.uri()));
    let text = provider
        .agent_chat(&transcript(), &GenerationSettings::default())
        .await
        .unwrap();
    assert_eq!(text, "hello");
}

#[tokio::test]
async fn openai_generate_forces_json_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"response_format": {"type": "json_object"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "```json\n{\"title\": \"Fix\"}\n```"},
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("gpt-4o".into(), "sk-test".into(), Some(server.uri()));
    let result = provider
        .generate(&GenerateRequest::new("Name this change").json())
        .await
        .unwrap();
    assert_eq!(result.json, Some(json!({"title": "Fix"})));
}

#[tokio::test]
async fn openai_server_error_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("gpt-4o".into(), "sk-test".into(), Some(server.uri()));
    let err = provider
        .agent_chat(&transcript(), &GenerationSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TillerError::Api { status: 503, .. }));
    assert!(err.is_provider_failure());
}

#[tokio::test]
async fn unauthorized_maps_to_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(
        "claude-sonnet-4-5".into(),
        "bad".into(),
        Some(server.uri()),
    );
    let err = provider
        .agent_chat(&transcript(), &GenerationSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TillerError::Authentication(_)));
}

#[tokio::test]
async fn anthropic_hoists_system_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "system": "You are terse.",
            "messages": [{"role": "user", "content": "Say hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"type": "text", "text": "hi "},
                {"type": "text", "text": "there"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 5, "output_tokens": 2}
        })))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(
        "claude-sonnet-4-5".into(),
        "ak-test".into(),
        Some(server.uri()),
    );
    let text = provider
        .agent_chat(&transcript(), &GenerationSettings::default())
        .await
        .unwrap();
    assert_eq!(text, "hi there");
}

#[tokio::test]
async fn google_generate_content_uses_system_instruction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(query_param("key", "g-test"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "You are terse."}]},
            "contents": [{"role": "user", "parts": [{"text": "Say hi"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "hi"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 1}
        })))
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(
        "gemini-2.0-flash".into(),
        "g-test".into(),
        Some(server.uri()),
    );
    let text = provider
        .agent_chat(&transcript(), &GenerationSettings::default())
        .await
        .unwrap();
    assert_eq!(text, "hi");
}

#[tokio::test]
async fn factory_uses_configured_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "routed"}, "finish_reason": "stop"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = TillerConfig::new();
    config.set_api_key("openai", "sk-test".into());
    config.set_base_url("openai", server.uri());
    let spec: ModelSpec = "openai:gpt-4o-mini".parse().unwrap();
    let provider = create_provider(&spec, &config).unwrap();

    assert_eq!(provider.provider_name(), "openai");
    assert_eq!(provider.model_id(), "gpt-4o-mini");
    let text = provider
        .agent_chat(&[ChatMessage::user("ping")], &GenerationSettings::default())
        .await
        .unwrap();
    assert_eq!(text, "routed");
}

#[test]
fn factory_reports_missing_key() {
    let spec: ModelSpec = "anthropic:claude-sonnet-4-5".parse().unwrap();
    let err = match create_provider(&spec, &TillerConfig::new()) {
        Ok(_) => panic!("expected a missing-key error"),
        Err(err) => err,
    };
    assert!(matches!(err, TillerError::Authentication(ref m) if m == "Missing ANTHROPIC_API_KEY"));
}
