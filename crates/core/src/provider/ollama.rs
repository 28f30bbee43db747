use crate::completion::{ModelResponse, ProviderAdapter};
use crate::model::ProviderConfig;
use crate::provider::{finish, probe, require_model, send_json};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{instrument, warn};

const PROVIDER: &str = "ollama";

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_thread: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: String,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

/// Adapter for a local Ollama server. Prefers the durations Ollama reports
/// over wall-clock time.
pub struct OllamaAdapter {
    config: ProviderConfig,
    client: Client,
}

impl OllamaAdapter {
    pub fn new(config: ProviderConfig, client: Client) -> Self {
        Self { config, client }
    }

    async fn request(&self, prompt: &str) -> Result<ModelResponse> {
        let body = GenerateRequest {
            model: require_model(&self.config)?,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature(),
                num_predict: self.config.max_tokens(),
                num_ctx: self.config.context_size,
                num_thread: self.config.threads,
            },
        };
        let url = format!("{}/api/generate", self.config.base_url());
        let reply = send_json(self.client.post(url).json(&body), PROVIDER).await?;

        let mut response = finish(&self.config, prompt, &reply)?;
        response.metrics.context_size = self.config.context_size;
        Ok(response)
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[instrument(skip_all, fields(id = %self.config.id))]
    async fn generate(&self, prompt: &str) -> ModelResponse {
        self.request(prompt).await.unwrap_or_else(|err| {
            warn!("ollama generation failed: {err:#}");
            ModelResponse::failure(&self.config, &err)
        })
    }

    async fn check_connection(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.config.base_url());
        probe(self.client.get(url), PROVIDER).await
    }
}
