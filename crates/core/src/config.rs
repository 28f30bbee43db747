use std::{
    collections::{BTreeMap, HashSet},
    fs::{self, File},
    io::Write,
    path::PathBuf,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::{
    assets::{get_config_dir, get_default_config},
    model::{ProviderConfig, ProviderKind},
    orchestrator::CompareSettings,
};

#[derive(Error, Debug)]
pub enum ParleyConfigError {
    #[error("File system error: {0}")]
    IO(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YAMLError(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct SettingsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl SettingsConfig {
    pub fn compare_settings(&self) -> CompareSettings {
        CompareSettings {
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Resolved configuration. `providers` is ordered by provider kind, then by
/// position within the kind's group in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub providers: Vec<ProviderConfig>,
    pub settings: SettingsConfig,
}

impl Config {
    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn enabled_providers(&self) -> Vec<ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled).cloned().collect()
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), ParleyConfigError> {
        let provider = self
            .providers
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ParleyConfigError::Config(format!("Provider '{id}' not found")))?;
        provider.enabled = enabled;
        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ParleyConfigError> {
        let raw: RawConfig = serde_yaml::from_str(content)?;
        raw.to_config()
    }

    pub fn to_yaml_string(&self) -> Result<String, ParleyConfigError> {
        Ok(serde_yaml::to_string(&RawConfig::from_config(self)?)?)
    }
}

/// On-disk shape: providers grouped by kind, each entry without its kind.
#[derive(Deserialize, Serialize, Debug, Default)]
struct RawConfig {
    #[serde(default)]
    providers: BTreeMap<ProviderKind, Vec<Value>>,
    #[serde(default)]
    settings: SettingsConfig,
}

impl RawConfig {
    #[instrument(skip(self))]
    fn to_config(&self) -> Result<Config, ParleyConfigError> {
        let mut providers = Vec::new();
        let mut seen_ids = HashSet::new();

        for (kind, entries) in &self.providers {
            for entry in entries {
                let mut mapping = match entry {
                    Value::Mapping(m) => m.clone(),
                    _ => {
                        return Err(ParleyConfigError::Config(format!(
                            "Provider entries under '{kind}' must be mappings"
                        )));
                    }
                };
                mapping.insert("kind".into(), kind.as_str().into());
                let mut provider: ProviderConfig = serde_yaml::from_value(Value::Mapping(mapping))?;
                if provider.name.is_empty() {
                    provider.name = provider.id.clone();
                }

                validate_provider(&provider)?;
                if !seen_ids.insert(provider.id.clone()) {
                    return Err(ParleyConfigError::Config(format!(
                        "Duplicate provider id '{}'",
                        provider.id
                    )));
                }
                providers.push(provider);
            }
        }

        Ok(Config {
            providers,
            settings: self.settings.clone(),
        })
    }

    fn from_config(config: &Config) -> Result<Self, ParleyConfigError> {
        let mut groups: BTreeMap<ProviderKind, Vec<Value>> = BTreeMap::new();
        for provider in &config.providers {
            let mut entry: Mapping = match serde_yaml::to_value(provider)? {
                Value::Mapping(m) => m,
                _ => {
                    return Err(ParleyConfigError::Config(format!(
                        "Provider '{}' did not serialize to a mapping",
                        provider.id
                    )));
                }
            };
            entry.remove("kind");
            groups
                .entry(provider.kind)
                .or_default()
                .push(Value::Mapping(entry));
        }
        Ok(Self {
            providers: groups,
            settings: config.settings.clone(),
        })
    }
}

fn validate_provider(provider: &ProviderConfig) -> Result<(), ParleyConfigError> {
    if provider.id.trim().is_empty() {
        return Err(ParleyConfigError::Config(format!(
            "Provider under '{}' is missing an id",
            provider.kind
        )));
    }
    if let Some(t) = provider.temperature
        && !(0.0..=2.0).contains(&t)
    {
        return Err(ParleyConfigError::Config(format!(
            "Provider '{}': temperature {t} is outside 0..=2",
            provider.id
        )));
    }
    if let Some(n) = provider.max_tokens
        && !(1..=4096).contains(&n)
    {
        return Err(ParleyConfigError::Config(format!(
            "Provider '{}': max_tokens {n} is outside 1..=4096",
            provider.id
        )));
    }
    if let Some(base_url) = &provider.base_url {
        let parsed = Url::parse(base_url).map_err(|e| {
            ParleyConfigError::Config(format!(
                "Provider '{}': invalid base_url '{base_url}': {e}",
                provider.id
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ParleyConfigError::Config(format!(
                "Provider '{}': base_url must use http or https",
                provider.id
            )));
        }
    }
    Ok(())
}

#[instrument(skip(config_path))]
pub fn create_or_get_config_file(
    config_path: Option<PathBuf>,
) -> Result<(bool, PathBuf), ParleyConfigError> {
    let actual_path = config_path.unwrap_or_else(|| {
        let config_dir = get_config_dir();
        config_dir.join("parley.yml")
    });

    let parent_dir = actual_path.parent().ok_or_else(|| {
        ParleyConfigError::IO(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Config path has no parent directory",
        ))
    })?;

    if !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
    }

    if actual_path.exists() {
        Ok((true, actual_path))
    } else {
        File::create(&actual_path)?.write_all(get_default_config().as_bytes())?;
        Ok((false, actual_path))
    }
}

#[instrument(skip(config_path))]
pub fn get_config(config_path: Option<PathBuf>) -> Result<Config, ParleyConfigError> {
    let (_, config_file) = create_or_get_config_file(config_path)?;
    let content = fs::read_to_string(&config_file)?;
    Config::from_yaml_str(&content)
}

#[instrument(skip(config, config_path))]
pub fn save_config(
    config: &Config,
    config_path: Option<PathBuf>,
) -> Result<PathBuf, ParleyConfigError> {
    let (_, config_file) = create_or_get_config_file(config_path)?;
    fs::write(&config_file, config.to_yaml_string()?)?;
    Ok(config_file)
}
