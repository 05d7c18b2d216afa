use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cutoff_engine::cli::{Cli, CliHandler};
use cutoff_engine::{initialize_logging_with_config, ForecastConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => ForecastConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ForecastConfig::from_env().context("Failed to load config from environment")?,
    };

    initialize_logging_with_config(&config.logging.level, &config.logging.format)?;
    info!("Starting cutoff-forecast v{}", cutoff_engine::VERSION);

    let handler = CliHandler::new(config)?;
    handler.handle_command(cli.command).await?;

    Ok(())
}
