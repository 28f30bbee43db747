use crate::completion::{ModelResponse, ProviderAdapter};
use crate::model::ProviderConfig;
use crate::provider::{finish, probe, require_model, send_json};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use tracing::{instrument, warn};

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub(crate) role: &'static str,
    pub(crate) content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: String,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

/// Adapter for the OpenAI chat completions API and compatible servers.
pub struct OpenAIAdapter {
    config: ProviderConfig,
    client: Client,
}

impl OpenAIAdapter {
    pub fn new(config: ProviderConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let mut request = request.bearer_auth(self.config.resolve_api_key()?);
        if let Some(org) = self.config.organization.as_deref().filter(|o| !o.is_empty()) {
            request = request.header("OpenAI-Organization", org);
        }
        if let Some(project) = self.config.project.as_deref().filter(|p| !p.is_empty()) {
            request = request.header("OpenAI-Project", project);
        }
        Ok(request)
    }

    async fn request(&self, prompt: &str) -> Result<ModelResponse> {
        let body = ChatCompletionRequest {
            model: require_model(&self.config)?,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature(),
            max_tokens: self.config.max_tokens(),
        };
        let url = format!("{}/chat/completions", self.config.base_url());
        let request = self.authorized(self.client.post(url).json(&body))?;

        let reply = send_json(request, PROVIDER).await?;
        finish(&self.config, prompt, &reply)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAIAdapter {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[instrument(skip_all, fields(id = %self.config.id))]
    async fn generate(&self, prompt: &str) -> ModelResponse {
        self.request(prompt).await.unwrap_or_else(|err| {
            warn!("openai generation failed: {err:#}");
            ModelResponse::failure(&self.config, &err)
        })
    }

    async fn check_connection(&self) -> Result<()> {
        let url = format!("{}/models", self.config.base_url());
        let request = self.authorized(self.client.get(url))?;
        probe(request, PROVIDER).await
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
        let mut config = ProviderConfig::new("gpt", ProviderKind::Openai, "gpt-4o");
        config.base_url = Some(server_url.to_string());
        config.api_key = Some("MOCK_OPENAI_API_KEY".to_string());
        config
    }

    fn mock_completion_body() -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1684,
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello world"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 20, "completion_tokens": 30, "total_tokens": 50}
        })
    }

    #[tokio::test]
    async fn test_openai_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer MOCK_OPENAI_API_KEY"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "Hello"}],
                "temperature": 0.7,
                "max_tokens": 1000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_completion_body()))
            .mount(&server)
            .await;

        let adapter = OpenAIAdapter::new(create_mock_config(&server.uri()), Client::new());
        let response = adapter.generate("Hello").await;

        assert!(response.is_success(), "{:?}", response.error);
        assert_eq!(response.text, "Hello world");
        assert_eq!(response.provider, "openai");
        assert_eq!(response.metrics.prompt_tokens, Some(20));
        assert_eq!(response.metrics.completion_tokens, Some(30));
        assert_eq!(response.metrics.total_tokens, Some(50));
        assert!(response.metrics.response_time_ms > 0.0);
        assert!(response.metrics.cost.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_openai_sends_organization_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("OpenAI-Organization", "org-1"))
            .and(header("OpenAI-Project", "proj-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_completion_body()))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = create_mock_config(&server.uri());
        config.organization = Some("org-1".to_string());
        config.project = Some("proj-1".to_string());
        let response = OpenAIAdapter::new(config, Client::new())
            .generate("Hello")
            .await;
        assert!(response.is_success(), "{:?}", response.error);
    }

    #[tokio::test]
    async fn test_openai_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let adapter = OpenAIAdapter::new(create_mock_config(&server.uri()), Client::new());
        let response = adapter.generate("Hello").await;

        assert!(response.text.is_empty());
        assert_eq!(response.metrics.tokens_per_second, 0.0);
        let error = response.error.unwrap();
        assert!(error.contains("status 401"));
        assert!(error.contains("Incorrect API key provided"));
    }

    #[tokio::test]
    async fn test_openai_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let adapter = OpenAIAdapter::new(create_mock_config(&server.uri()), Client::new());
        let response = adapter.generate("Hello").await;
        assert!(response.error.unwrap().contains("Malformed openai response"));
    }

    #[tokio::test]
    async fn test_openai_missing_key_fails_without_request() {
        let server = MockServer::start().await;
        let mut config = create_mock_config(&server.uri());
        config.api_key = None;

        let response = OpenAIAdapter::new(config, Client::new())
            .generate("Hello")
            .await;
        assert!(response.error.unwrap().contains("API key is required"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_openai_check_connection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let adapter = OpenAIAdapter::new(create_mock_config(&server.uri()), Client::new());
        assert!(adapter.check_connection().await.is_ok());

        let down = OpenAIAdapter::new(create_mock_config("http://127.0.0.1:1"), Client::new());
        assert!(down.check_connection().await.is_err());
    }
}
