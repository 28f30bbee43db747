use crate::completion::{ModelResponse, ProviderAdapter};
use crate::model::ProviderConfig;
use crate::provider::{finish, probe, send_json};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument, warn};

const PROVIDER: &str = "gguf";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
    // llama.cpp server name for the output token limit.
    n_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    n_threads: Option<u32>,
}

/// Adapter for a local llama.cpp style completion server serving a GGUF model.
pub struct GgufAdapter {
    config: ProviderConfig,
    client: Client,
}

impl GgufAdapter {
    pub fn new(config: ProviderConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn endpoint(&self) -> Result<String> {
        let configured = self.config.base_url.as_deref().is_some_and(|u| !u.trim().is_empty())
            || self.config.port.is_some()
            || self.config.expanded_model_path().is_some();
        if !configured {
            return Err(anyhow!("gguf provider requires a base_url or model_path"));
        }
        Ok(self.config.base_url())
    }

    /// Size of the model file on disk, used as a memory footprint estimate.
    async fn model_file_mb(&self) -> Option<f64> {
        let path = self.config.expanded_model_path()?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(meta.len() as f64 / (1024.0 * 1024.0)),
            _ => {
                debug!(path = %path.display(), "model file not readable, skipping memory estimate");
                None
            }
        }
    }

    async fn request(&self, prompt: &str) -> Result<ModelResponse> {
        let url = format!("{}/completion", self.endpoint()?);
        let max_tokens = self.config.max_tokens();
        let body = CompletionRequest {
            prompt,
            temperature: self.config.temperature(),
            max_tokens,
            n_predict: max_tokens,
            n_threads: self.config.threads,
        };
        let reply = send_json(self.client.post(url).json(&body), PROVIDER).await?;

        let mut response = finish(&self.config, prompt, &reply)?;
        response.metrics.context_size = self.config.context_size;
        response.metrics.memory_usage_mb = self.model_file_mb().await;
        Ok(response)
    }
}

#[async_trait]
impl ProviderAdapter for GgufAdapter {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[instrument(skip_all, fields(id = %self.config.id))]
    async fn generate(&self, prompt: &str) -> ModelResponse {
        self.request(prompt).await.unwrap_or_else(|err| {
            warn!("gguf generation failed: {err:#}");
            ModelResponse::failure(&self.config, &err)
        })
    }

    async fn check_connection(&self) -> Result<()> {
        let url = format!("{}/health", self.endpoint()?);
        probe(self.client.get(url), PROVIDER).await
    }
}
