//! Parley cli definition and entrypoint.
mod compare;
mod providers;
mod validate;
pub mod ux;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parley_core::config::get_config;

use crate::log::setup_logging;

/// Parley - send one prompt to many language models and compare the answers.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show verbose logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file. Defaults to `$XDG_CONFIG_HOME/parley/parley.yml`.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a prompt to the enabled providers and compare the responses.
    Compare {
        /// Prompt to send.
        prompt: Vec<String>,
        /// Provider id to include, may be repeated. Overrides `enabled`.
        #[arg(short, long = "provider")]
        providers: Vec<String>,
        /// Print the comparison result as JSON.
        #[arg(long)]
        json: bool,
        /// Per-request timeout in seconds. Overrides the config setting.
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// Check connectivity of every enabled provider.
    Validate,
    /// List configured providers.
    Providers,
    /// Enable a provider for comparisons.
    Enable {
        /// Provider id.
        id: String,
    },
    /// Disable a provider.
    Disable {
        /// Provider id.
        id: String,
    },
}

/// Runs the main CLI application.
pub async fn run(cli: Cli) -> Result<()> {
    if cli.verbose {
        setup_logging().context("Failed to set up logging")?;
    }

    let config = get_config(cli.config.clone()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Compare {
            prompt,
            providers,
            json,
            timeout,
        } => {
            let options = compare::CompareOptions {
                providers,
                json,
                timeout,
            };
            compare::execute(prompt, options, &config).await
        }
        Commands::Validate => validate::execute(&config).await,
        Commands::Providers => {
            providers::list(&config);
            Ok(())
        }
        Commands::Enable { id } => providers::set_enabled(config, &id, true, cli.config),
        Commands::Disable { id } => providers::set_enabled(config, &id, false, cli.config),
    }
}
