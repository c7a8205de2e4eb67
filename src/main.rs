#[macro_use]
extern crate rust_i18n;

mod commands;
mod shutdown;
mod startup;

use clap::Parser;
use commands::Cli;
use tracing::info;

// Initialize i18n
i18n!("locales", fallback = "en");

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    startup::init_logging()?;

    info!("Starting SmartAgenda");

    // Load configuration
    let config = startup::load_config().await?;

    // Open preferences, cache and notification sinks
    let services = startup::build_services(config).await?;

    commands::dispatch(cli.command.unwrap_or_default(), services).await
}
