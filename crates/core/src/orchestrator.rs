//! Fans a prompt out to every enabled provider and gathers the results.
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::completion::{ModelResponse, ProviderAdapter};
use crate::model::ProviderConfig;
use crate::provider::llm::build_adapter;

/// Settings shared by every call of a comparison run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompareSettings {
    /// Upper bound for each provider call. `None` waits as long as the
    /// transport allows.
    pub request_timeout: Option<Duration>,
}

/// Aggregate outcome of one comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub prompt: String,
    pub timestamp: DateTime<Utc>,
    /// In the order the provider calls settled.
    pub responses: Vec<ModelResponse>,
    pub total_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ComparisonResult {
    pub fn successful(&self) -> impl Iterator<Item = &ModelResponse> {
        self.responses.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ModelResponse> {
        self.responses.iter().filter(|r| !r.is_success())
    }
}

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Prompt must not be empty")]
    EmptyPrompt,
    #[error("No enabled providers to compare")]
    NoEnabledProviders,
    #[error("No successful responses: {}", .result.errors.as_deref().unwrap_or_default().join("; "))]
    AllProvidersFailed { result: Box<ComparisonResult> },
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Caller-owned comparison engine holding one adapter per enabled config.
///
/// The adapter set is rebuilt by [`Orchestrator::update_configurations`] and
/// never mutated while a run is in flight.
pub struct Orchestrator {
    client: Client,
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl Orchestrator {
    pub fn new(settings: &CompareSettings) -> Result<Self, CompareError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            adapters: Vec::new(),
        })
    }

    /// Uses pre-built adapters instead of building them from configs.
    pub fn from_adapters(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self {
            client: Client::new(),
            adapters,
        }
    }

    /// Replaces the adapter set with one adapter per enabled config.
    #[instrument(skip_all)]
    pub fn update_configurations(&mut self, configs: &[ProviderConfig]) {
        self.adapters = configs
            .iter()
            .filter(|c| c.enabled)
            .map(|c| build_adapter(c.clone(), self.client.clone()))
            .collect();
        info!(enabled = self.adapters.len(), total = configs.len(), "configurations updated");
    }

    pub fn enabled_ids(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.config().id.as_str()).collect()
    }

    /// Sends `prompt` to every adapter concurrently and waits for all of them.
    #[instrument(skip(self, prompt), fields(providers = self.adapters.len()))]
    pub async fn compare(&self, prompt: &str) -> Result<ComparisonResult, CompareError> {
        if prompt.trim().is_empty() {
            return Err(CompareError::EmptyPrompt);
        }
        if self.adapters.is_empty() {
            return Err(CompareError::NoEnabledProviders);
        }

        let timestamp = Utc::now();
        let start = Instant::now();
        let mut pending: FuturesUnordered<_> = self
            .adapters
            .iter()
            .map(|adapter| adapter.generate(prompt))
            .collect();

        let mut responses = Vec::with_capacity(self.adapters.len());
        while let Some(response) = pending.next().await {
            responses.push(response);
        }
        let total_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        let errors: Vec<String> = responses
            .iter()
            .filter_map(|r| {
                r.error
                    .as_ref()
                    .map(|e| format!("{} ({}): {}", r.config_id, r.provider, e))
            })
            .collect();
        let all_failed = errors.len() == responses.len();
        info!(
            total_time_ms,
            failed = errors.len(),
            succeeded = responses.len() - errors.len(),
            "comparison finished"
        );

        let result = ComparisonResult {
            prompt: prompt.to_string(),
            timestamp,
            responses,
            total_time_ms,
            errors: if errors.is_empty() { None } else { Some(errors) },
        };

        if all_failed {
            return Err(CompareError::AllProvidersFailed {
                result: Box::new(result),
            });
        }
        Ok(result)
    }

    /// Probes every adapter concurrently. `true` means the probe succeeded.
    #[instrument(skip(self))]
    pub async fn validate_connections(&self) -> HashMap<String, bool> {
        let mut pending: FuturesUnordered<_> = self
            .adapters
            .iter()
            .map(|adapter| async move {
                let id = adapter.config().id.clone();
                match adapter.check_connection().await {
                    Ok(()) => (id, true),
                    Err(err) => {
                        warn!(id = %id, "connection check failed: {err:#}");
                        (id, false)
                    }
                }
            })
            .collect();

        let mut status = HashMap::with_capacity(self.adapters.len());
        while let Some((id, ok)) = pending.next().await {
            status.insert(id, ok);
        }
        status
    }
}

/// One-shot comparison over `configs`.
pub async fn compare(
    prompt: &str,
    configs: &[ProviderConfig],
    settings: &CompareSettings,
) -> Result<ComparisonResult, CompareError> {
    let mut orchestrator = Orchestrator::new(settings)?;
    orchestrator.update_configurations(configs);
    orchestrator.compare(prompt).await
}

/// One-shot connection check over the enabled `configs`.
pub async fn validate_connections(
    configs: &[ProviderConfig],
    settings: &CompareSettings,
) -> Result<HashMap<String, bool>, CompareError> {
    let mut orchestrator = Orchestrator::new(settings)?;
    orchestrator.update_configurations(configs);
    Ok(orchestrator.validate_connections().await)
}
