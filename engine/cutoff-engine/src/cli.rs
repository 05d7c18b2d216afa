//! # Command Line Interface
//!
//! CLI for running cutoff forecasts over a season snapshot file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ForecastConfig;
use crate::engine::CutoffEngine;
use crate::error::CutoffError;
use crate::extrapolation::parse_override_date;
use crate::models::{Region, SeasonSnapshot};

/// Season cutoff forecaster
#[derive(Parser)]
#[command(name = "cutoff-forecast")]
#[command(about = "Project season score cutoffs to the end of the season")]
pub struct Cli {
    /// TOML configuration file (defaults plus CUTOFF_* environment variables otherwise)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Forecast every region of a season snapshot
    Forecast {
        /// Season snapshot JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Forecast end date (YYYY-MM-DD) for seasons without an announced end
        #[arg(long)]
        override_date: Option<String>,

        /// Evaluate as of this RFC 3339 instant instead of the current time
        #[arg(long)]
        now: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Show the weekly gains table of one region
    Weekly {
        /// Season snapshot JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Region (us, eu, kr, tw)
        #[arg(short, long)]
        region: String,

        /// Evaluate as of this RFC 3339 instant instead of the current time
        #[arg(long)]
        now: Option<String>,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// Parse an RFC 3339 instant, or take the wall clock when absent
pub fn resolve_now(now: Option<&str>) -> crate::error::Result<DateTime<Utc>> {
    match now {
        Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| CutoffError::InvalidTimestamp(format!("{raw}: {e}"))),
        None => Ok(Utc::now()),
    }
}

/// CLI handler
pub struct CliHandler {
    engine: CutoffEngine,
}

impl CliHandler {
    /// Create new CLI handler
    pub fn new(config: ForecastConfig) -> Result<Self> {
        let engine = CutoffEngine::new(config).context("Invalid forecast configuration")?;
        Ok(Self { engine })
    }

    /// Handle CLI commands
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Forecast { input, override_date, now, pretty } => {
                self.forecast(&input, override_date.as_deref(), now.as_deref(), pretty).await?;
            }
            Commands::Weekly { input, region, now } => {
                self.weekly(&input, &region, now.as_deref())?;
            }
            Commands::Config => {
                print!("{}", self.engine.calculator().config().to_toml()?);
            }
        }
        Ok(())
    }

    async fn forecast(
        &self,
        input: &Path,
        override_date: Option<&str>,
        now: Option<&str>,
        pretty: bool,
    ) -> Result<()> {
        let now = resolve_now(now)?;
        let snapshot = load_snapshot(input)?;

        let override_date = override_date.and_then(|raw| {
            let parsed = parse_override_date(raw, now);
            if parsed.is_none() {
                warn!("Ignoring override date {:?}: not a future YYYY-MM-DD date", raw);
            }
            parsed
        });

        let forecast = self.engine.forecast_season(snapshot, override_date, now).await?;
        let output = if pretty {
            serde_json::to_string_pretty(&forecast)?
        } else {
            serde_json::to_string(&forecast)?
        };
        println!("{output}");
        Ok(())
    }

    fn weekly(&self, input: &Path, region: &str, now: Option<&str>) -> Result<()> {
        let now = resolve_now(now)?;
        let region: Region = region.parse()?;
        let snapshot = load_snapshot(input)?;

        let gains = self.engine.calculator().weekly_gains(
            &snapshot.season,
            region,
            snapshot.series_for(region),
            now,
        );
        info!("{} weeks of gains for {} in {}", gains.len(), region, snapshot.season.slug);

        println!(
            "{:>4}  {:>10}  {:>10}  {:>10}  {:>10}",
            "week", "from", "combined", "horde", "alliance"
        );
        println!("{}", "=".repeat(52));
        for gain in gains {
            println!(
                "{:>4}  {:>10}  {:>10.1}  {:>10.1}  {:>10.1}",
                gain.week + 1,
                gain.from.format("%Y-%m-%d"),
                gain.delta.combined_delta,
                gain.delta.horde_delta,
                gain.delta.alliance_delta
            );
        }
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> Result<SeasonSnapshot> {
    SeasonSnapshot::from_file(path)
        .with_context(|| format!("Failed to load season snapshot {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resolve_now() {
        let parsed = resolve_now(Some("2024-06-01T12:00:00+02:00")).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
        assert!(matches!(resolve_now(Some("yesterday")), Err(CutoffError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_cli_parses_forecast_command() {
        let cli = Cli::try_parse_from([
            "cutoff-forecast",
            "forecast",
            "--input",
            "snapshot.json",
            "--override-date",
            "2024-09-01",
            "--pretty",
        ])
        .unwrap();
        match cli.command {
            Commands::Forecast { input, override_date, now, pretty } => {
                assert_eq!(input, PathBuf::from("snapshot.json"));
                assert_eq!(override_date.as_deref(), Some("2024-09-01"));
                assert!(now.is_none());
                assert!(pretty);
            }
            _ => panic!("Expected Forecast command"),
        }
    }
}
