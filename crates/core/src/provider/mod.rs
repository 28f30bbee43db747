pub mod anthropic;
pub mod gguf;
pub mod huggingface;
pub mod llm;
pub mod ollama;
pub mod openai;
#[cfg(test)]
pub(crate) mod test_provider;

use anyhow::{Context, Result, anyhow};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

use crate::completion::ModelResponse;
use crate::metrics::{Metrics, normalize, response_text};
use crate::model::ProviderConfig;

/// A successful provider reply with the wall-clock time spent on it.
pub(crate) struct RawReply {
    pub(crate) payload: Value,
    pub(crate) elapsed_ms: f64,
}

/// Sends a request and reads the whole body. Timing covers the send and the
/// body read.
pub(crate) async fn send_json(request: RequestBuilder, provider: &str) -> Result<RawReply> {
    let start = Instant::now();
    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to send request to {provider} API"))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read response from {provider} API"))?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    if !status.is_success() {
        return Err(anyhow!(status_error(provider, status, &body)));
    }

    let payload: Value = serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse JSON response from {provider} API"))?;
    debug!(provider, elapsed_ms, "received response");
    Ok(RawReply {
        payload,
        elapsed_ms,
    })
}

/// Sends a liveness probe; any non-success status is an error.
pub(crate) async fn probe(request: RequestBuilder, provider: &str) -> Result<()> {
    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to reach {provider} API"))?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!(status_error(provider, status, &body)))
}

/// Turns a successful reply into a response, extracting text and metrics.
pub(crate) fn finish(config: &ProviderConfig, prompt: &str, reply: &RawReply) -> Result<ModelResponse> {
    let provider = config.kind.as_str();
    let text = response_text(config.kind, &reply.payload)
        .ok_or_else(|| anyhow!("Malformed {provider} response: missing generated text"))?
        .to_string();
    let metrics: Metrics = normalize(
        config.kind,
        &config.model_id(),
        &reply.payload,
        reply.elapsed_ms,
        prompt,
    );
    Ok(ModelResponse::success(config, text, metrics))
}

pub(crate) fn require_model(config: &ProviderConfig) -> Result<String> {
    let model = config.model_id();
    if model.trim().is_empty() {
        return Err(anyhow!("Model is required for {} provider", config.kind));
    }
    Ok(model)
}

/// Prefers the provider's own error message, falling back to the body text.
fn status_error(provider: &str, status: StatusCode, body: &str) -> String {
    let generic = format!(
        "{provider} API request failed with status {}",
        status.as_u16()
    );
    match provider_message(body) {
        Some(message) => format!("{generic}: {message}"),
        None => generic,
    }
}

fn provider_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let message = value
            .pointer("/error/message")
            .or_else(|| value.get("error").filter(|e| e.is_string()))
            .or_else(|| value.get("message"))
            .and_then(Value::as_str);
        if let Some(message) = message {
            return Some(message.to_string());
        }
    }
    Some(truncate(body, 200))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}
