//! Normalizes the divergent usage and timing fields reported by each provider
//! into a single [`Metrics`] record.
//!
//! Everything here is pure: no network access and no clocks. Adapters measure
//! wall-clock time and hand the raw JSON payload over.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ProviderKind;
use crate::pricing::price_for;

/// Best-effort metrics for one provider response. `None` means the provider
/// does not report the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub response_time_ms: f64,
    pub tokens_per_second: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage_mb: Option<f64>,
    /// Output quality is not evaluated; always zero.
    pub quality_score: f64,
}

impl Metrics {
    /// The record attached to failed responses.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Rough token count used when a provider does not report one.
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(4)
}

/// Tokens per second, clamped to zero for degenerate input.
pub fn tokens_per_second(tokens: f64, elapsed_ms: f64) -> f64 {
    if !tokens.is_finite() || tokens <= 0.0 || !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
        return 0.0;
    }
    let rate = tokens / (elapsed_ms / 1000.0);
    if rate.is_finite() { rate } else { 0.0 }
}

/// Extracts the generated text from a provider success envelope.
pub fn response_text(kind: ProviderKind, payload: &Value) -> Option<&str> {
    let text = match kind {
        ProviderKind::Openai => payload.pointer("/choices/0/message/content"),
        ProviderKind::Anthropic => payload.pointer("/content/0/text"),
        ProviderKind::Ollama => payload.get("response"),
        ProviderKind::Gguf => payload.get("content"),
        ProviderKind::Huggingface => payload
            .pointer("/0/generated_text")
            .or_else(|| payload.get("generated_text")),
    };
    text.and_then(Value::as_str)
}

/// Derives the common metric set from a raw provider payload.
///
/// `response_time_ms` is the wall-clock time measured around the call. It is
/// replaced by the provider's own duration where one is reported.
pub fn normalize(
    kind: ProviderKind,
    model: &str,
    payload: &Value,
    response_time_ms: f64,
    prompt: &str,
) -> Metrics {
    let completion_text = response_text(kind, payload).unwrap_or_default();
    let response_time_ms = sanitize_ms(response_time_ms);

    let mut metrics = match kind {
        ProviderKind::Openai => from_openai(payload, response_time_ms, prompt, completion_text),
        ProviderKind::Ollama => from_ollama(payload, response_time_ms, prompt, completion_text),
        ProviderKind::Gguf => from_gguf(payload, response_time_ms, prompt, completion_text),
        ProviderKind::Anthropic | ProviderKind::Huggingface => {
            estimated(response_time_ms, prompt, completion_text)
        }
    };

    if let (Some(price), Some(prompt_tokens), Some(completion_tokens)) = (
        price_for(kind, model),
        metrics.prompt_tokens,
        metrics.completion_tokens,
    ) {
        metrics.cost = Some(price.cost(prompt_tokens, completion_tokens));
    }
    metrics
}

fn sanitize_ms(ms: f64) -> f64 {
    if ms.is_finite() && ms > 0.0 { ms } else { 0.0 }
}

fn as_u64(payload: &Value, pointer: &str) -> Option<u64> {
    payload.pointer(pointer).and_then(Value::as_u64)
}

fn as_f64(payload: &Value, pointer: &str) -> Option<f64> {
    payload
        .pointer(pointer)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}

fn counted(
    response_time_ms: f64,
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: Option<u64>,
) -> Metrics {
    Metrics {
        response_time_ms,
        tokens_per_second: tokens_per_second(completion_tokens as f64, response_time_ms),
        total_tokens: Some(total_tokens.unwrap_or(prompt_tokens + completion_tokens)),
        prompt_tokens: Some(prompt_tokens),
        completion_tokens: Some(completion_tokens),
        ..Metrics::default()
    }
}

fn estimated(response_time_ms: f64, prompt: &str, completion_text: &str) -> Metrics {
    counted(
        response_time_ms,
        estimate_tokens(prompt),
        estimate_tokens(completion_text),
        None,
    )
}

fn from_openai(payload: &Value, response_time_ms: f64, prompt: &str, text: &str) -> Metrics {
    let prompt_tokens =
        as_u64(payload, "/usage/prompt_tokens").unwrap_or_else(|| estimate_tokens(prompt));
    let completion_tokens =
        as_u64(payload, "/usage/completion_tokens").unwrap_or_else(|| estimate_tokens(text));
    let total_tokens = as_u64(payload, "/usage/total_tokens");
    counted(response_time_ms, prompt_tokens, completion_tokens, total_tokens)
}

fn from_ollama(payload: &Value, wall_clock_ms: f64, prompt: &str, text: &str) -> Metrics {
    // Ollama durations are in nanoseconds.
    let response_time_ms = as_u64(payload, "/total_duration")
        .map(|ns| ns as f64 / 1e6)
        .filter(|ms| *ms > 0.0)
        .unwrap_or(wall_clock_ms);

    let eval_count = as_u64(payload, "/eval_count");
    let eval_duration_ns = as_u64(payload, "/eval_duration");
    let prompt_tokens = as_u64(payload, "/prompt_eval_count").unwrap_or_else(|| estimate_tokens(prompt));
    let completion_tokens = eval_count.unwrap_or_else(|| estimate_tokens(text));

    let mut metrics = counted(response_time_ms, prompt_tokens, completion_tokens, None);
    metrics.tokens_per_second = match (eval_count, eval_duration_ns) {
        (Some(count), Some(ns)) => tokens_per_second(count as f64, ns as f64 / 1e6),
        _ => tokens_per_second(estimate_tokens(text) as f64, response_time_ms),
    };
    metrics
}

fn from_gguf(payload: &Value, response_time_ms: f64, prompt: &str, text: &str) -> Metrics {
    let prompt_tokens = as_u64(payload, "/tokens_evaluated")
        .or_else(|| as_u64(payload, "/timings/prompt_n"))
        .unwrap_or_else(|| estimate_tokens(prompt));
    let completion_tokens = as_u64(payload, "/tokens_predicted")
        .or_else(|| as_u64(payload, "/timings/predicted_n"))
        .unwrap_or_else(|| estimate_tokens(text));

    let mut metrics = counted(response_time_ms, prompt_tokens, completion_tokens, None);
    let reported = as_f64(payload, "/tokens_per_second")
        .or_else(|| as_f64(payload, "/timings/predicted_per_second"))
        .filter(|rate| *rate >= 0.0);
    if let Some(rate) = reported {
        metrics.tokens_per_second = rate;
    }
    metrics
}
