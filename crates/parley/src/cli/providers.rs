use std::path::PathBuf;

use anyhow::{Context, Result};
use parley_core::config::{Config, save_config};

use crate::cli::ux::{MessageType, style_text};

/// Prints every configured provider with its kind, model and enabled state.
pub fn list(config: &Config) {
    for line in provider_lines(config) {
        println!("{line}");
    }
}

fn provider_lines(config: &Config) -> Vec<String> {
    config
        .providers
        .iter()
        .map(|p| {
            let marker = if p.enabled { "●" } else { "○" };
            format!(
                "{marker} {:<20} {:<12} {:<28} {}",
                p.id,
                p.kind.as_str(),
                p.model_id(),
                p.display_name()
            )
        })
        .collect()
}

/// Enables or disables provider `id` and writes the config back.
pub fn set_enabled(
    mut config: Config,
    id: &str,
    enabled: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    config.set_enabled(id, enabled)?;
    let path = save_config(&config, config_path).context("Failed to save configuration")?;

    let state = if enabled { "enabled" } else { "disabled" };
    println!(
        "{}",
        style_text(
            &format!("Provider '{id}' {state} in {}", path.display()),
            MessageType::Footer
        )
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::config::get_config;
    use tempfile::tempdir;

    const CONFIG: &str = r#"
providers:
  openai:
    - id: gpt
      name: GPT-4o
      model: gpt-4o
      api_key: sk-test
  ollama:
    - id: llama
      model: llama3
      enabled: false
"#;

    #[test]
    fn test_provider_lines() {
        let config = Config::from_yaml_str(CONFIG).unwrap();
        let lines = provider_lines(&config);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            format!("● {:<20} {:<12} {:<28} GPT-4o", "gpt", "openai", "gpt-4o")
        );
        assert_eq!(
            lines[1],
            format!("○ {:<20} {:<12} {:<28} llama", "llama", "ollama", "llama3")
        );
    }

    #[test]
    fn test_set_enabled_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("parley.yml");
        std::fs::write(&path, CONFIG).unwrap();
        let config = get_config(Some(path.clone())).unwrap();

        set_enabled(config, "llama", true, Some(path.clone())).unwrap();

        let reloaded = get_config(Some(path.clone())).unwrap();
        assert!(reloaded.provider("llama").unwrap().enabled);

        let config = get_config(Some(path.clone())).unwrap();
        let err = set_enabled(config, "missing", true, Some(path)).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: Provider 'missing' not found");
    }
}
