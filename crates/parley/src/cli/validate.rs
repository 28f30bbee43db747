use std::collections::HashMap;

use anyhow::{Result, bail};
use parley_core::{config::Config, model::ProviderConfig, validate_connections};

use crate::cli::ux::{MessageType, style_text};

fn format_status(providers: &[ProviderConfig], status: &HashMap<String, bool>) -> Vec<String> {
    providers
        .iter()
        .map(|p| {
            let line = format!("{} ({}, {})", p.id, p.kind, p.model_id());
            if status.get(&p.id).copied().unwrap_or(false) {
                style_text(&format!("✓ {line}"), MessageType::Success).to_string()
            } else {
                style_text(&format!("✗ {line}"), MessageType::Error).to_string()
            }
        })
        .collect()
}

/// Executes the validate command. Fails when any enabled provider is
/// unreachable.
pub async fn execute(config: &Config) -> Result<()> {
    let providers = config.enabled_providers();
    if providers.is_empty() {
        println!(
            "{}",
            style_text("No enabled providers.", MessageType::Footer)
        );
        return Ok(());
    }

    let status = validate_connections(&providers, &config.settings.compare_settings()).await?;
    for line in format_status(&providers, &status) {
        println!("{line}");
    }

    let unreachable = status.values().filter(|ok| !**ok).count();
    if unreachable > 0 {
        bail!("{unreachable} of {} providers unreachable", status.len());
    }
    Ok(())
}
