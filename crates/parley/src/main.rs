mod cli;
mod log;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, ux};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = cli::run(cli).await {
        ux::present_error(e);
        std::process::exit(1);
    }
    Ok(())
}
