mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

const LOG_ENV: &str = "LEXISENSE_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    commands::run(cli.command)
}

/// Logs go to stderr so stdout stays machine-readable JSON.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
