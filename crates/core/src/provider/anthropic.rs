use crate::completion::{ModelResponse, ProviderAdapter};
use crate::model::ProviderConfig;
use crate::provider::openai::ChatMessage;
use crate::provider::{finish, probe, require_model, send_json};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use tracing::{instrument, warn};

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: String,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

/// Adapter for the Anthropic messages API. Token usage is estimated from text
/// length.
pub struct AnthropicAdapter {
    config: ProviderConfig,
    client: Client,
}

impl AnthropicAdapter {
    pub fn new(config: ProviderConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn messages_request(&self, prompt: &str, max_tokens: u32) -> Result<RequestBuilder> {
        let body = MessagesRequest {
            model: require_model(&self.config)?,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: self.config.temperature(),
        };
        let url = format!("{}/messages", self.config.base_url());
        Ok(self
            .client
            .post(url)
            .header("x-api-key", self.config.resolve_api_key()?)
            .header("anthropic-version", API_VERSION)
            .json(&body))
    }

    async fn request(&self, prompt: &str) -> Result<ModelResponse> {
        let request = self.messages_request(prompt, self.config.max_tokens())?;
        let reply = send_json(request, PROVIDER).await?;
        finish(&self.config, prompt, &reply)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[instrument(skip_all, fields(id = %self.config.id))]
    async fn generate(&self, prompt: &str) -> ModelResponse {
        self.request(prompt).await.unwrap_or_else(|err| {
            warn!("anthropic generation failed: {err:#}");
            ModelResponse::failure(&self.config, &err)
        })
    }

    async fn check_connection(&self) -> Result<()> {
        probe(self.messages_request("Hi", 1)?, PROVIDER).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProviderKind;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    fn create_mock_config(server_url: &str) -> ProviderConfig {
        let mut config =
            ProviderConfig::new("claude", ProviderKind::Anthropic, "claude-3-haiku-20240307");
        config.base_url = Some(server_url.to_string());
        config.api_key = Some("MOCK_ANTHROPIC_KEY".to_string());
        config.max_tokens = Some(256);
        config
    }

    #[tokio::test]
    async fn test_anthropic_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "MOCK_ANTHROPIC_KEY"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-3-haiku-20240307",
                "messages": [{"role": "user", "content": "abcd"}],
                "max_tokens": 256
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "content": [{"type": "text", "text": "abcdefgh"}],
                "stop_reason": "end_turn"
            })))
            .mount(&server)
            .await;

        let adapter = AnthropicAdapter::new(create_mock_config(&server.uri()), Client::new());
        let response = adapter.generate("abcd").await;

        assert!(response.is_success(), "{:?}", response.error);
        assert_eq!(response.text, "abcdefgh");
        assert_eq!(response.metrics.prompt_tokens, Some(1));
        assert_eq!(response.metrics.completion_tokens, Some(2));
        assert!(response.metrics.cost.is_some());
    }

    #[tokio::test]
    async fn test_anthropic_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            })))
            .mount(&server)
            .await;

        let adapter = AnthropicAdapter::new(create_mock_config(&server.uri()), Client::new());
        let response = adapter.generate("Hello").await;
        assert_eq!(
            response.error.as_deref(),
            Some("anthropic API request failed with status 529: Overloaded")
        );
    }

    #[tokio::test]
    async fn test_anthropic_check_connection_uses_one_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(body_partial_json(json!({"max_tokens": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "H"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = AnthropicAdapter::new(create_mock_config(&server.uri()), Client::new());
        assert!(adapter.check_connection().await.is_ok());
    }
}
