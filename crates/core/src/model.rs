use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Supported provider integrations (serialized as lowercase strings).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Openai,
    Anthropic,
    Ollama,
    Gguf,
    Huggingface,
}

impl From<ProviderKind> for String {
    fn from(val: ProviderKind) -> Self {
        val.as_str().into()
    }
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Openai,
        ProviderKind::Anthropic,
        ProviderKind::Ollama,
        ProviderKind::Gguf,
        ProviderKind::Huggingface,
    ];

    pub fn as_str(&self) -> &'static str {
        match &self {
            ProviderKind::Openai => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Gguf => "gguf",
            ProviderKind::Huggingface => "huggingface",
        }
    }

    /// Local inference servers need an endpoint, hosted APIs need a credential.
    pub fn is_local(&self) -> bool {
        matches!(self, ProviderKind::Ollama | ProviderKind::Gguf)
    }

    pub fn default_base_url(&self, port: Option<u16>) -> String {
        match &self {
            ProviderKind::Openai => "https://api.openai.com/v1".to_string(),
            ProviderKind::Anthropic => "https://api.anthropic.com/v1".to_string(),
            ProviderKind::Huggingface => "https://api-inference.huggingface.co/models".to_string(),
            ProviderKind::Ollama => format!("http://localhost:{}", port.unwrap_or(11434)),
            ProviderKind::Gguf => format!("http://localhost:{}", port.unwrap_or(8080)),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// A single configured backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProviderConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(alias = "type")]
    pub kind: ProviderKind,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    /// Creates an enabled config with only the required identity fields set.
    pub fn new(id: impl Into<String>, kind: ProviderKind, model: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            enabled: true,
            kind,
            model: model.into(),
            api_key: None,
            base_url: None,
            temperature: None,
            max_tokens: None,
            organization: None,
            project: None,
            context_size: None,
            threads: None,
            port: None,
            model_path: None,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    /// Endpoint override, else the provider default, without a trailing slash.
    pub fn base_url(&self) -> String {
        let url = match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => self.kind.default_base_url(self.port),
        };
        url.trim_end_matches('/').to_string()
    }

    /// Resolves the credential. Keys of the form `env:NAME` are read from the
    /// environment.
    pub fn resolve_api_key(&self) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("API key is required for {} provider", self.kind))?;

        if let Some(env_key) = key.strip_prefix("env:") {
            let env_key = env_key.trim();
            std::env::var(env_key)
                .map_err(|_| anyhow!("Environment variable {} not found", env_key))
        } else {
            Ok(key.to_string())
        }
    }

    pub fn expanded_model_path(&self) -> Option<PathBuf> {
        self.model_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
    }

    /// Model identifier sent to the provider. Local gguf configs may omit it
    /// and rely on the model file name.
    pub fn model_id(&self) -> String {
        if !self.model.is_empty() {
            return self.model.clone();
        }
        self.expanded_model_path()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_default()
    }
}
