use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::metrics::Metrics;
use crate::model::ProviderConfig;

/// Outcome of one adapter invocation. `error` is set iff the call failed, in
/// which case `text` is empty and `metrics` is all zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub config_id: String,
    pub provider: String,
    pub model: String,
    pub text: String,
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelResponse {
    pub fn success(config: &ProviderConfig, text: String, metrics: Metrics) -> Self {
        Self {
            config_id: config.id.clone(),
            provider: config.kind.as_str().to_string(),
            model: config.model_id(),
            text,
            metrics,
            error: None,
        }
    }

    /// Builds a failed response. The error is rendered with its full context
    /// chain.
    pub fn failure(config: &ProviderConfig, error: &anyhow::Error) -> Self {
        Self {
            config_id: config.id.clone(),
            provider: config.kind.as_str().to_string(),
            model: config.model_id(),
            text: String::new(),
            metrics: Metrics::zero(),
            error: Some(format!("{error:#}")),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A single provider backend speaking its own wire protocol.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn config(&self) -> &ProviderConfig;

    /// Issues one completion request. Never fails: transport, status and
    /// payload errors are captured in [`ModelResponse::error`].
    async fn generate(&self, prompt: &str) -> ModelResponse;

    /// Cheapest available liveness probe for the provider.
    async fn check_connection(&self) -> Result<()>;
}
