use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use parley_core::{
    CompareError, ComparisonResult, Orchestrator, config::Config, model::ProviderConfig,
};

use crate::cli::ux::{GenerationSpinner, MessageType, format_comparison, style_text};

/// Command line overrides for a comparison run.
#[derive(Debug, Default)]
pub struct CompareOptions {
    pub providers: Vec<String>,
    pub json: bool,
    pub timeout: Option<u64>,
}

/// Picks the configs to compare. Explicit ids select those providers even if
/// they are disabled in the config, otherwise every enabled provider is used.
fn select_providers(config: &Config, ids: &[String]) -> Result<Vec<ProviderConfig>> {
    if ids.is_empty() {
        return Ok(config.enabled_providers());
    }

    ids.iter()
        .map(|id| {
            let mut provider = config
                .provider(id)
                .cloned()
                .context(format!("Provider '{id}' not found in config."))?;
            provider.enabled = true;
            Ok(provider)
        })
        .collect()
}

fn write_result(out: &mut impl Write, result: &ComparisonResult, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(result)?)?;
    } else {
        writeln!(out, "{}", format_comparison(result))?;
    }
    Ok(())
}

/// Writes the outcome of a run to `out`. In text mode a total failure is
/// reported only through the returned error; JSON mode still writes the result.
fn report(
    out: &mut impl Write,
    outcome: Result<ComparisonResult, CompareError>,
    json: bool,
) -> Result<()> {
    match outcome {
        Ok(result) => write_result(out, &result, json),
        Err(CompareError::AllProvidersFailed { result }) => {
            if json {
                write_result(out, &result, json)?;
            }
            Err(CompareError::AllProvidersFailed { result }.into())
        }
        Err(CompareError::NoEnabledProviders) => {
            eprintln!(
                "{}",
                style_text(
                    "Enable a provider with `parley enable <id>` or pass --provider.",
                    MessageType::Footer
                )
            );
            Err(CompareError::NoEnabledProviders.into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Executes the compare command.
pub async fn execute(prompt: Vec<String>, options: CompareOptions, config: &Config) -> Result<()> {
    let prompt = prompt.join(" ");
    let providers = select_providers(config, &options.providers)?;

    let mut settings = config.settings.compare_settings();
    if let Some(secs) = options.timeout {
        settings.request_timeout = Some(Duration::from_secs(secs));
    }

    let mut orchestrator = Orchestrator::new(&settings)?;
    orchestrator.update_configurations(&providers);

    let spinner = (!options.json).then(|| {
        GenerationSpinner::new(format!(
            "Comparing {} providers...",
            orchestrator.enabled_ids().len()
        ))
    });
    let outcome = orchestrator.compare(&prompt).await;
    if let Some(spinner) = spinner {
        spinner.clear();
    }

    report(&mut std::io::stdout().lock(), outcome, options.json)
}
