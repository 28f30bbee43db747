//! A mock provider adapter for unit testing purposes.
use crate::completion::{ModelResponse, ProviderAdapter};
use crate::metrics::{Metrics, estimate_tokens, tokens_per_second};
use crate::model::ProviderConfig;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A `ProviderAdapter` that never touches the network.
///
/// It echoes the prompt after `delay`, or fails when `fail` is set. Every
/// `generate` and `check_connection` call is counted in `calls`.
#[derive(Debug, Clone)]
pub struct TestAdapter {
    config: ProviderConfig,
    delay: Duration,
    fail: bool,
    pub calls: Arc<AtomicUsize>,
}

impl TestAdapter {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            delay: Duration::ZERO,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for TestAdapter {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate(&self, prompt: &str) -> ModelResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return ModelResponse::failure(&self.config, &anyhow!("TestAdapter error"));
        }
        let elapsed_ms = self.delay.as_secs_f64() * 1000.0;
        let tokens = estimate_tokens(prompt);
        let metrics = Metrics {
            response_time_ms: elapsed_ms,
            tokens_per_second: tokens_per_second(tokens as f64, elapsed_ms),
            completion_tokens: Some(tokens),
            ..Metrics::default()
        };
        ModelResponse::success(&self.config, prompt.to_string(), metrics)
    }

    async fn check_connection(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(anyhow!("TestAdapter unreachable"))
        } else {
            Ok(())
        }
    }
}
