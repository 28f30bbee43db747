use crate::completion::ProviderAdapter;
use crate::model::{ProviderConfig, ProviderKind};
use crate::provider::{anthropic, gguf, huggingface, ollama, openai};
use reqwest::Client;
use std::sync::Arc;
use tracing::instrument;

/// Builds the adapter for a config's provider kind. Construction never fails;
/// missing credentials or endpoints surface when the adapter is called.
#[instrument(skip_all, fields(id = %config.id, kind = %config.kind))]
pub fn build_adapter(config: ProviderConfig, client: Client) -> Arc<dyn ProviderAdapter> {
    match config.kind {
        ProviderKind::Openai => Arc::new(openai::OpenAIAdapter::new(config, client)),
        ProviderKind::Anthropic => Arc::new(anthropic::AnthropicAdapter::new(config, client)),
        ProviderKind::Ollama => Arc::new(ollama::OllamaAdapter::new(config, client)),
        ProviderKind::Gguf => Arc::new(gguf::GgufAdapter::new(config, client)),
        ProviderKind::Huggingface => {
            Arc::new(huggingface::HuggingFaceAdapter::new(config, client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_adapter_for_every_kind() {
        for kind in ProviderKind::ALL {
            let config = ProviderConfig::new(format!("{kind}-1"), kind, "model");
            let adapter = build_adapter(config, Client::new());
            assert_eq!(adapter.config().kind, kind);
            assert_eq!(adapter.config().id, format!("{kind}-1"));
        }
    }

    #[tokio::test]
    async fn test_build_adapter_without_credentials_fails_at_call_time() {
        let config = ProviderConfig::new("claude", ProviderKind::Anthropic, "claude-3-haiku");
        let adapter = build_adapter(config, Client::new());
        let response = adapter.generate("hello").await;
        assert!(
            response
                .error
                .unwrap()
                .contains("API key is required for anthropic provider")
        );
    }
}
