use crate::completion::{ModelResponse, ProviderAdapter};
use crate::model::ProviderConfig;
use crate::provider::{finish, probe, require_model, send_json};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use tracing::{instrument, warn};

const PROVIDER: &str = "huggingface";

#[derive(Debug, Serialize)]
struct InferenceParameters {
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

/// Adapter for key-based text generation inference APIs. The model id is part
/// of the endpoint path.
pub struct HuggingFaceAdapter {
    config: ProviderConfig,
    client: Client,
}

impl HuggingFaceAdapter {
    pub fn new(config: ProviderConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn inference_request(&self, prompt: &str, max_tokens: u32) -> Result<RequestBuilder> {
        let url = format!("{}/{}", self.config.base_url(), require_model(&self.config)?);
        let body = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                temperature: self.config.temperature(),
                max_tokens,
            },
        };
        Ok(self
            .client
            .post(url)
            .bearer_auth(self.config.resolve_api_key()?)
            .json(&body))
    }

    async fn request(&self, prompt: &str) -> Result<ModelResponse> {
        let request = self.inference_request(prompt, self.config.max_tokens())?;
        let reply = send_json(request, PROVIDER).await?;
        finish(&self.config, prompt, &reply)
    }
}

#[async_trait]
impl ProviderAdapter for HuggingFaceAdapter {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[instrument(skip_all, fields(id = %self.config.id))]
    async fn generate(&self, prompt: &str) -> ModelResponse {
        self.request(prompt).await.unwrap_or_else(|err| {
            warn!("huggingface generation failed: {err:#}");
            ModelResponse::failure(&self.config, &err)
        })
    }

    async fn check_connection(&self) -> Result<()> {
        probe(self.inference_request("Hi", 1)?, PROVIDER).await
    }
}
