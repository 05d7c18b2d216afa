use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use tracing::{debug, info};

use crate::calculator::CutoffCalculator;
use crate::config::ForecastConfig;
use crate::error::Result;
use crate::extrapolation::furthest_forecast;
use crate::models::*;

/// Forecasts, zoom window and weekly gains for one region
pub fn forecast_region(
    calculator: &CutoffCalculator,
    season: &Season,
    region: Region,
    series: &[Observation],
    override_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> RegionForecast {
    let forecasts = calculator.extrapolate_factions(season, region, series, override_date, now);

    // The chart zooms to whichever bucket projects furthest.
    let furthest = furthest_forecast(&forecasts);

    let zoom = calculator.zoom_window(season, region, series, &furthest, now);
    let weekly_gains = calculator.weekly_gains(season, region, series, now);

    debug!(
        "Region {}: {} observations, {} forecasts, zoom {:?}",
        region,
        series.len(),
        forecasts.iter().filter(|f| !f.forecast.is_none()).count(),
        zoom
    );

    RegionForecast { region, forecasts, zoom, weekly_gains }
}

/// Runs the forecast for every region of a season
pub struct CutoffEngine {
    calculator: Arc<CutoffCalculator>,
}

impl CutoffEngine {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { calculator: Arc::new(CutoffCalculator::new(config)) })
    }

    pub fn calculator(&self) -> &CutoffCalculator {
        &self.calculator
    }

    /// Forecast all regions concurrently, one task per region.
    ///
    /// Regions named in the season schedule but missing from the snapshot are
    /// forecast with an empty series.
    pub async fn forecast_season(
        &self,
        snapshot: SeasonSnapshot,
        override_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<SeasonForecast> {
        let SeasonSnapshot { season, mut series } = snapshot;
        info!("Forecasting season {} ({:?})", season.slug, season.cross_faction_support);

        let regions: BTreeSet<Region> =
            season.windows.keys().chain(series.keys()).copied().collect();
        let season = Arc::new(season);

        let handles = regions.into_iter().map(|region| {
            let calculator = Arc::clone(&self.calculator);
            let season = Arc::clone(&season);
            let observations = series.remove(&region).unwrap_or_default();
            tokio::spawn(async move {
                forecast_region(&calculator, &season, region, &observations, override_date, now)
            })
        });

        let mut forecasts = std::collections::BTreeMap::new();
        for result in join_all(handles).await {
            let region_forecast = result?;
            forecasts.insert(region_forecast.region, region_forecast);
        }

        let projected = forecasts
            .values()
            .filter(|r| r.forecasts.iter().any(|f| !f.forecast.is_none()))
            .count();
        info!(
            "Season {}: {} regions, {} with a forecast",
            season.slug,
            forecasts.len(),
            projected
        );

        Ok(SeasonForecast {
            season: season.slug.clone(),
            generated_at: now,
            regions: forecasts,
        })
    }
}
